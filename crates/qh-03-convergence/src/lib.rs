//! # Convergence Subsystem
//!
//! **Subsystem ID:** 3
//!
//! Establishes, by repeated observation, that independently running
//! members agree on a piece of chain state.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `PollerConfig`, `Condition`, `Populated`, `ReadOutcome`
//! - **Ports Layer:** `RpcReader` (driven)
//! - **Service Layer:** `ConvergencePoller` (generic retry loop),
//!   `ConvergenceVerifier` (domain predicates)
//!
//! ## Polling Policy
//!
//! | Aspect | Behaviour |
//! |--------|-----------|
//! | Cadence | fixed interval (default 1s) |
//! | Budget | per call, default 30s, never unbounded |
//! | Probe error / panic | recorded as the last observation, retried |
//! | Budget spent | `ConvergenceError::Timeout` with the description |
//!
//! There is no notification channel from the nodes, so bounded polling is
//! the only way to wait for replicated state.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use qh_03_convergence::{ConvergenceError, ConvergencePoller, PollerConfig};
//!
//! # async fn demo() -> Result<(), ConvergenceError> {
//! let poller = ConvergencePoller::new(PollerConfig::default());
//! poller
//!     .await_condition("genesis reached", Some(Duration::from_secs(5)), || async { true })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Domain
pub use domain::{Condition, ConvergenceError, PollerConfig, Populated, ReadOutcome};

// Ports
pub use ports::RpcReader;

// Service
pub use service::{ConvergencePoller, ConvergenceVerifier};
