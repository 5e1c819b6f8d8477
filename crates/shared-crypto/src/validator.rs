//! # Validator Identities
//!
//! A validator is known to the harness by its secp256k1 public key; the
//! genesis extra data only needs the derived chain address.
//!
//! ## Accepted Encodings
//!
//! | Length | Form |
//! |--------|------|
//! | 33 bytes | SEC1 compressed (`0x02`/`0x03` prefix) |
//! | 64 bytes | Raw `x ‖ y` (node key files, enode ids) |
//! | 65 bytes | SEC1 uncompressed (`0x04` prefix) |
//!
//! Every form is checked to be a point on the curve before use.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use shared_types::Address;

use crate::hashing::keccak256;
use crate::CryptoError;

/// Length of an uncompressed public key without the SEC1 tag byte.
pub const RAW_PUBLIC_KEY_LENGTH: usize = 64;

/// Derive a chain address from a raw 64-byte public key.
///
/// `address = last_20_bytes(keccak256(x ‖ y))`
pub fn derive_address(raw_public_key: &[u8; RAW_PUBLIC_KEY_LENGTH]) -> Address {
    let hash = keccak256(raw_public_key);
    Address::from_slice(&hash[12..])
}

/// A validator's public key and the address derived from it.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatorIdentity {
    public_key: [u8; RAW_PUBLIC_KEY_LENGTH],
    address: Address,
}

impl ValidatorIdentity {
    /// Build an identity from public key bytes in any accepted encoding.
    pub fn from_public_key_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let sec1 = match bytes.len() {
            RAW_PUBLIC_KEY_LENGTH => {
                let mut tagged = Vec::with_capacity(RAW_PUBLIC_KEY_LENGTH + 1);
                tagged.push(0x04);
                tagged.extend_from_slice(bytes);
                tagged
            }
            33 | 65 => bytes.to_vec(),
            other => {
                return Err(CryptoError::invalid_key(format!(
                    "expected 33, 64 or 65 bytes, got {other}"
                )))
            }
        };

        let point = PublicKey::from_sec1_bytes(&sec1)
            .map_err(|_| CryptoError::invalid_key("not a point on secp256k1"))?;
        let encoded = point.to_encoded_point(false);

        let mut public_key = [0u8; RAW_PUBLIC_KEY_LENGTH];
        public_key.copy_from_slice(&encoded.as_bytes()[1..]);
        Ok(Self {
            address: derive_address(&public_key),
            public_key,
        })
    }

    /// Build an identity from a hex string, with or without `0x`.
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| CryptoError::invalid_key(format!("not hex ({e}): {trimmed}")))?;
        Self::from_public_key_bytes(&bytes)
    }

    /// Raw 64-byte public key.
    pub fn public_key(&self) -> &[u8; RAW_PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    /// Public key as lower-case hex without prefix (the enode id form).
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// Derived chain address.
    pub fn address(&self) -> Address {
        self.address
    }
}

impl std::fmt::Debug for ValidatorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorIdentity")
            .field("address", &self.address)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Public key of the secret scalar 1 (the generator point).
    const G_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_Y: &str = "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";
    const G_ADDRESS: &str = "7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    fn expected_address() -> Address {
        shared_types::parse_address(G_ADDRESS).unwrap()
    }

    #[test]
    fn test_raw_key_derives_known_address() {
        let identity = ValidatorIdentity::from_hex(&format!("{G_X}{G_Y}")).unwrap();
        assert_eq!(identity.address(), expected_address());
    }

    #[test]
    fn test_all_encodings_agree() {
        let raw = ValidatorIdentity::from_hex(&format!("0x{G_X}{G_Y}")).unwrap();
        let uncompressed = ValidatorIdentity::from_hex(&format!("04{G_X}{G_Y}")).unwrap();
        let compressed = ValidatorIdentity::from_hex(&format!("02{G_X}")).unwrap();

        assert_eq!(raw, uncompressed);
        assert_eq!(raw, compressed);
        assert_eq!(compressed.public_key_hex(), format!("{G_X}{G_Y}"));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = ValidatorIdentity::from_hex("abcd").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidValidatorKey { .. }));
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn test_non_hex_rejected() {
        let err = ValidatorIdentity::from_hex("zz").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidValidatorKey { .. }));
    }

    #[test]
    fn test_off_curve_point_rejected() {
        let bogus = format!("{}{}", "11".repeat(32), "22".repeat(32));
        let err = ValidatorIdentity::from_hex(&bogus).unwrap_err();
        assert!(err.to_string().contains("not a point"));
    }
}
