//! # Node Keys (secp256k1)
//!
//! Every consensus member is launched with a node key. Its public half is
//! the member's devp2p node id and, for validators, the source of the
//! address embedded in genesis extra data.

use k256::ecdsa::SigningKey;
use zeroize::Zeroizing;

use crate::validator::ValidatorIdentity;
use crate::CryptoError;

/// secp256k1 node key.
#[derive(Clone)]
pub struct NodeKey {
    signing_key: SigningKey,
}

impl NodeKey {
    /// Generate a random key.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_bytes((&bytes).into())
            .map_err(|_| CryptoError::InvalidPrivateKey("scalar out of range".to_string()))?;
        Ok(Self { signing_key })
    }

    /// Parse a key file's contents (hex, optional `0x`, surrounding whitespace ignored).
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let decoded = Zeroizing::new(
            hex::decode(digits).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?,
        );
        let bytes: [u8; 32] = decoded.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey(format!("expected 32 bytes, got {}", decoded.len()))
        })?;
        let bytes = Zeroizing::new(bytes);
        Self::from_bytes(*bytes)
    }

    /// Secret key as `0x`-prefixed hex, the format node key files use.
    pub fn to_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(<[u8; 32]>::from(self.signing_key.to_bytes()));
        Zeroizing::new(format!("0x{}", hex::encode(bytes.as_slice())))
    }

    /// Validator identity (public key + address) of this key.
    pub fn identity(&self) -> ValidatorIdentity {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        // An uncompressed encoding of a valid key is always accepted.
        match ValidatorIdentity::from_public_key_bytes(point.as_bytes()) {
            Ok(identity) => identity,
            Err(_) => unreachable!("verifying key encodes to a valid SEC1 point"),
        }
    }

    /// Enode URL for this key at `host:port`.
    pub fn enode(&self, host: std::net::Ipv4Addr, port: u16) -> String {
        format!("enode://{}@{}:{}", self.identity().public_key_hex(), host, port)
    }
}

impl std::fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeKey")
            .field("address", &self.identity().address())
            .finish_non_exhaustive()
    }
}
