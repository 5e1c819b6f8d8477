//! Extra-data errors.

use shared_crypto::CryptoError;

use super::family::ConsensusFamily;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtraDataError {
    /// A validator public key could not be turned into an address.
    #[error(transparent)]
    InvalidValidatorKey(#[from] CryptoError),

    /// The blob does not follow the family's layout.
    #[error("Malformed {family} extra data: {reason}")]
    Malformed {
        family: ConsensusFamily,
        reason: String,
    },
}

impl ExtraDataError {
    pub(crate) fn malformed(family: ConsensusFamily, reason: impl Into<String>) -> Self {
        Self::Malformed {
            family,
            reason: reason.into(),
        }
    }
}
