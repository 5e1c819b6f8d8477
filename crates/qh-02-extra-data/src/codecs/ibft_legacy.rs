//! Legacy Istanbul BFT: raw vanity followed by
//! `RLP[validators, proposer_seal, committed_seals]`.

use rlp::RlpStream;
use shared_types::Address;

use crate::domain::rlp_fields::{append_address_list, decode_address_list, outer_list, rlp_error};
use crate::domain::{ConsensusFamily, ExtraData, ExtraDataError, VANITY_LENGTH};
use crate::ports::ExtraDataCodec;

#[derive(Debug, Clone, Copy, Default)]
pub struct IbftLegacyCodec;

impl ExtraDataCodec for IbftLegacyCodec {
    fn family(&self) -> ConsensusFamily {
        ConsensusFamily::IbftLegacy
    }

    fn encode(&self, validators: &[Address]) -> ExtraData {
        let mut stream = RlpStream::new_list(3);
        append_address_list(&mut stream, validators);
        // Proposer seal, then committed seals; both empty at genesis.
        stream.append_empty_data();
        stream.begin_list(0);

        let body = stream.out();
        let mut bytes = Vec::with_capacity(VANITY_LENGTH + body.len());
        bytes.extend_from_slice(&[0u8; VANITY_LENGTH]);
        bytes.extend_from_slice(&body);
        ExtraData::new(ConsensusFamily::IbftLegacy, bytes)
    }

    fn decode_validators(&self, extra_data: &[u8]) -> Result<Vec<Address>, ExtraDataError> {
        let family = ConsensusFamily::IbftLegacy;
        if extra_data.len() <= VANITY_LENGTH {
            return Err(ExtraDataError::malformed(
                family,
                format!("{} bytes leaves no room after the vanity", extra_data.len()),
            ));
        }

        let rlp = outer_list(&extra_data[VANITY_LENGTH..], family, 3)?;
        let validators = rlp.at(0).map_err(rlp_error(family, "validator list"))?;
        decode_address_list(&validators, family)
    }
}
