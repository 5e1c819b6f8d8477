//! RLP field helpers shared by the BFT layouts.

use rlp::{DecoderError, Rlp, RlpStream};
use shared_types::Address;

use super::errors::ExtraDataError;
use super::family::ConsensusFamily;

const ADDRESS_LENGTH: usize = 20;

pub(crate) fn append_address_list(stream: &mut RlpStream, addresses: &[Address]) {
    stream.begin_list(addresses.len());
    for address in addresses {
        stream.append(&address.as_bytes());
    }
}

pub(crate) fn decode_address_list(
    item: &Rlp<'_>,
    family: ConsensusFamily,
) -> Result<Vec<Address>, ExtraDataError> {
    expect_list(item, family, "validator list")?;
    item.iter()
        .map(|entry| {
            let bytes = entry.data().map_err(rlp_error(family, "validator"))?;
            if bytes.len() != ADDRESS_LENGTH {
                return Err(ExtraDataError::malformed(
                    family,
                    format!("validator entry is {} bytes, expected 20", bytes.len()),
                ));
            }
            Ok(Address::from_slice(bytes))
        })
        .collect()
}

/// Outer list of `bytes` with exactly `expected` items and no trailing data.
pub(crate) fn outer_list<'a>(
    bytes: &'a [u8],
    family: ConsensusFamily,
    expected: usize,
) -> Result<Rlp<'a>, ExtraDataError> {
    let rlp = Rlp::new(bytes);
    expect_list(&rlp, family, "extra data")?;

    let info = rlp.payload_info().map_err(rlp_error(family, "extra data"))?;
    let consumed = info.header_len + info.value_len;
    if consumed != bytes.len() {
        return Err(ExtraDataError::malformed(
            family,
            format!("{} trailing bytes after the RLP list", bytes.len().saturating_sub(consumed)),
        ));
    }

    let count = rlp.item_count().map_err(rlp_error(family, "extra data"))?;
    if count != expected {
        return Err(ExtraDataError::malformed(
            family,
            format!("expected {expected} top-level items, found {count}"),
        ));
    }
    Ok(rlp)
}

pub(crate) fn expect_list(
    item: &Rlp<'_>,
    family: ConsensusFamily,
    what: &str,
) -> Result<(), ExtraDataError> {
    if item.is_list() {
        Ok(())
    } else {
        Err(ExtraDataError::malformed(family, format!("{what} is not an RLP list")))
    }
}

pub(crate) fn rlp_error(
    family: ConsensusFamily,
    what: &'static str,
) -> impl Fn(DecoderError) -> ExtraDataError {
    move |e| ExtraDataError::malformed(family, format!("{what}: {e}"))
}
