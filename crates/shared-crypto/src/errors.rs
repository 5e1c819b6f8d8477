//! Crypto error types.

use thiserror::Error;

/// Key handling errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Public key input could not be turned into a validator identity.
    #[error("Invalid validator key: {reason}")]
    InvalidValidatorKey {
        /// What was wrong with the input
        reason: String,
    },

    /// Private key bytes are not a valid secp256k1 scalar.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
}

impl CryptoError {
    pub(crate) fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidValidatorKey {
            reason: reason.into(),
        }
    }
}
