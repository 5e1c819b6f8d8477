//! Domain layer: poller configuration, conditions and errors.

mod condition;
mod config;
mod errors;
mod read;

pub use condition::{Condition, Populated};
pub use config::PollerConfig;
pub use errors::ConvergenceError;
pub use read::ReadOutcome;
