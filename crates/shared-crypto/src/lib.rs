//! # Shared Crypto
//!
//! Key handling shared by the extra-data codecs and the topology.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Address derivation |
//! | `validator` | secp256k1 point decoding | Public key → validator address |
//! | `node_key` | secp256k1 | Node identity keys, enode ids |
//!
//! Address derivation lives in exactly one place (`derive_address`); every
//! consensus family reuses it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod node_key;
pub mod validator;

// Re-exports
pub use errors::CryptoError;
pub use hashing::keccak256;
pub use node_key::NodeKey;
pub use validator::{derive_address, ValidatorIdentity};
