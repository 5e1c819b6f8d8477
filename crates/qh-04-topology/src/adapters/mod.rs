//! Adapters for the topology's outbound ports.
//!
//! Real Docker-backed adapters live in `harness-runtime`. The simulated
//! network here is for tests of this crate and its dependents.

#[cfg(any(test, feature = "test-utils"))]
mod simulated;

#[cfg(any(test, feature = "test-utils"))]
pub use simulated::{SimulatedNetwork, GAS_PRICE_WEI, TRANSFER_GAS};
