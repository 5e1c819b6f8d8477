//! Driven ports (Outbound dependencies)

use async_trait::async_trait;

use crate::domain::CidrBlock;

/// A provisioned isolated network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    /// Provider-specific network id.
    pub id: String,
    /// Human-readable network name.
    pub name: String,
    /// Block the network was created with.
    pub cidr: CidrBlock,
}

/// Provisioning failures.
///
/// Creation failures are never fatal to the allocator: each one just moves
/// it on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    /// Another network (possibly another test run) already owns the range.
    #[error("Address space {cidr} already in use: {reason}")]
    AddressSpaceInUse { cidr: CidrBlock, reason: String },

    /// The provider refused or failed the request.
    #[error("Network provider error: {0}")]
    Provider(String),

    /// Tried to close a network the provider does not know.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Creates and removes isolated virtual networks (e.g. Docker bridge networks).
#[async_trait]
pub trait NetworkProvisioner: Send + Sync {
    /// Create a network named `name` with subnet `cidr`.
    async fn create_isolated_network(
        &self,
        name: &str,
        cidr: &CidrBlock,
    ) -> Result<NetworkHandle, ProvisionError>;

    /// Remove a previously created network.
    async fn close_network(&self, handle: &NetworkHandle) -> Result<(), ProvisionError>;
}
