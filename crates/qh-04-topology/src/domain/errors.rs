//! Topology errors.

use qh_01_subnet_allocation::AllocationError;
use qh_03_convergence::ConvergenceError;
use shared_types::MemberId;

use super::state::{LifecycleOp, TopologyState};

#[derive(Debug, Clone, thiserror::Error)]
pub enum TopologyError {
    /// Lifecycle misuse; nothing was touched.
    #[error("Illegal state transition: cannot {operation} a topology that is {current}")]
    IllegalStateTransition {
        current: TopologyState,
        operation: LifecycleOp,
    },

    /// Members can only be added before the first start.
    #[error("Cannot register {member}: topology is {state}")]
    RegistrationClosed { member: MemberId, state: TopologyState },

    #[error("Member {0} is already registered")]
    DuplicateMember(MemberId),

    #[error("Invalid member {member}: {reason}")]
    InvalidMember { member: MemberId, reason: String },

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Genesis could not be derived or persisted.
    #[error("Genesis preparation failed: {0}")]
    Genesis(String),

    #[error("Failed to launch {member}: {reason}")]
    Launch { member: MemberId, reason: String },

    /// Members were launched but never became a connected network.
    #[error("Network did not converge: {0}")]
    Convergence(#[from] ConvergenceError),

    #[error("Failed to stop {member}: {reason}")]
    Shutdown { member: MemberId, reason: String },
}
