//! Allocation errors.

use super::cidr::CidrBlock;

/// Fatal setup failures. Callers must not retry these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    /// Every candidate subnet was rejected by the provisioner.
    #[error("Subnet allocation exhausted after {attempts} attempts (last error: {last_error})")]
    AllocationExhausted { attempts: u32, last_error: String },

    /// All host addresses of a lease have been issued.
    #[error("Address space of {cidr} exhausted: every host offset has been leased")]
    AddressSpaceExhausted { cidr: CidrBlock },

    /// The provisioner failed to tear the network down.
    #[error("Failed to release network {network} ({cidr}): {reason}")]
    ReleaseFailed {
        network: String,
        cidr: CidrBlock,
        reason: String,
    },
}
