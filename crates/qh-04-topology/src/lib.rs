//! # Network Topology Subsystem
//!
//! **Subsystem ID:** 4
//!
//! Describes a multi-member test network and drives it through a strict
//! lifecycle.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `TopologyState` + the pure `transition` function,
//!   `MemberSpec`, `GenesisSpec`, `TopologyConfig`
//! - **Ports Layer:** `MemberLauncher`, `GenesisWriter` (driven)
//! - **Service Layer:** `NetworkTopology`
//! - **Adapters Layer:** `SimulatedNetwork` (feature `test-utils`)
//!
//! ## Lifecycle
//!
//! ```text
//!                  start                stop
//! Uninitialized ─────────→ Started ◄─────────► Stopped ──close──→ Closed
//!                                    start
//! ```
//!
//! | From \ Op | start | stop | close |
//! |-----------|-------|------|-------|
//! | Uninitialized | Started | error | error |
//! | Started | error | Stopped | error |
//! | Stopped | Started | error | Closed |
//! | Closed | error | error | error |
//!
//! An illegal operation fails with `TopologyError::IllegalStateTransition`
//! and touches nothing.

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use domain::{
    transition, GenesisSpec, LifecycleOp, MemberLaunch, MemberSpec, RunningMember,
    TopologyConfig, TopologyError, TopologyState, BFT_MIX_HASH,
};

// Re-export ports
pub use ports::{GenesisWriteError, GenesisWriter, LaunchError, MemberLauncher};

// Re-export service
pub use service::{NetworkTopology, TopologyCollaborators};

#[cfg(any(test, feature = "test-utils"))]
pub use adapters::SimulatedNetwork;
