//! Codecs: one stateless implementation per consensus family.

mod bft;
mod clique;
mod ibft_legacy;

pub use bft::{Ibft2Codec, QbftCodec};
pub use clique::{CliqueCodec, CLIQUE_SEAL_LENGTH};
pub use ibft_legacy::IbftLegacyCodec;

use shared_crypto::ValidatorIdentity;

use crate::domain::{ConsensusFamily, ExtraData, ExtraDataError};
use crate::ports::ExtraDataCodec;

static CLIQUE: CliqueCodec = CliqueCodec;
static IBFT_LEGACY: IbftLegacyCodec = IbftLegacyCodec;
static IBFT2: Ibft2Codec = Ibft2Codec;
static QBFT: QbftCodec = QbftCodec;

/// Codec for `family`.
pub fn codec_for(family: ConsensusFamily) -> &'static dyn ExtraDataCodec {
    match family {
        ConsensusFamily::Clique => &CLIQUE,
        ConsensusFamily::IbftLegacy => &IBFT_LEGACY,
        ConsensusFamily::Ibft2 => &IBFT2,
        ConsensusFamily::Qbft => &QBFT,
    }
}

/// Encode extra data straight from hex public keys.
///
/// Keys may be 33-byte compressed, 64-byte raw or 65-byte uncompressed,
/// with or without `0x`. The first bad key aborts with
/// `InvalidValidatorKey`; order of the remaining keys is preserved.
pub fn encode_validator_keys<S: AsRef<str>>(
    family: ConsensusFamily,
    public_keys: &[S],
) -> Result<ExtraData, ExtraDataError> {
    let identities = public_keys
        .iter()
        .map(|key| ValidatorIdentity::from_hex(key.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(codec_for(family).encode_identities(&identities))
}
