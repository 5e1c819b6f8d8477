//! # Extra Data Subsystem
//!
//! **Subsystem ID:** 2
//!
//! Encodes the initial validator set into the consensus-specific
//! `extraData` field of a genesis block, and decodes it back out.
//!
//! ## Layouts
//!
//! | Family | Layout |
//! |--------|--------|
//! | Clique | `vanity(32) ‖ validators(20·n) ‖ seal(65)`, raw concatenation |
//! | IBFT (legacy) | `vanity(32) ‖ RLP[validators, seal, committed_seals]` |
//! | IBFT2 | `RLP[vanity, validators, vote, round(4 bytes), seals]` |
//! | QBFT | `RLP[vanity, validators, vote, round(scalar), seals]` |
//!
//! IBFT2 writes an absent vote as an empty byte string (`0x80`), QBFT as an
//! empty list (`0xc0`).
//!
//! ## Architecture
//!
//! - **Domain Layer:** `ConsensusFamily`, `ExtraData`, `BftExtraData`
//! - **Ports Layer:** `ExtraDataCodec`
//! - **Codecs:** one stateless codec per family, looked up with `codec_for`
//!
//! Encoding is a pure function of the ordered validator list: the same list
//! always yields the same bytes, and reordering the list changes them.
//!
//! ## Example
//!
//! ```rust
//! use qh_02_extra_data::{codec_for, ConsensusFamily};
//!
//! let extra = codec_for(ConsensusFamily::Clique).encode(&[]);
//! assert_eq!(extra.len(), 97);
//! ```

pub mod codecs;
pub mod domain;
pub mod ports;

// Domain
pub use domain::{
    BftExtraData, ConsensusFamily, ExtraData, ExtraDataError, Vote, VoteKind, VANITY_LENGTH,
};

// Ports
pub use ports::ExtraDataCodec;

// Codecs
pub use codecs::{
    codec_for, encode_validator_keys, CliqueCodec, Ibft2Codec, IbftLegacyCodec, QbftCodec,
    CLIQUE_SEAL_LENGTH,
};
