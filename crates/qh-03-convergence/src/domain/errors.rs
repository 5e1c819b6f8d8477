//! Convergence errors.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvergenceError {
    /// The condition never held within its budget.
    #[error(
        "Convergence timeout after {timeout:?} ({attempts} attempts): {description}; last observation: {last_observation}"
    )]
    Timeout {
        description: String,
        timeout: Duration,
        attempts: u32,
        /// What the final attempt saw; every timeout makes at least one.
        last_observation: String,
    },

    /// A cross-member comparison was asked of too few members.
    #[error("{check} needs at least {required} members, got {actual}")]
    InsufficientMembers {
        check: String,
        required: usize,
        actual: usize,
    },

    /// The expected end state cannot be computed from what was observed.
    #[error("Invalid expectation: {0}")]
    InvalidExpectation(String),
}

impl ConvergenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConvergenceError::Timeout { .. })
    }
}
