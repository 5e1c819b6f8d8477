//! Domain layer: families, blobs and the BFT extra-data structure.

mod bft;
mod errors;
mod family;
pub(crate) mod rlp_fields;

pub use bft::{BftExtraData, Vote, VoteKind};
pub(crate) use bft::BftDialect;
pub use errors::ExtraDataError;
pub use family::{ConsensusFamily, ExtraData};

/// Zero-filled vanity prefix every layout starts with.
pub const VANITY_LENGTH: usize = 32;
