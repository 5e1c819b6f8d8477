//! # Shared Types Crate
//!
//! Value types that cross subsystem boundaries in the harness.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: anything two subsystems exchange is defined
//!   here, never redeclared locally.
//! - **Immutable values**: endpoints, receipts and identifiers are plain
//!   data; mutation happens only inside the subsystem that owns the state.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
