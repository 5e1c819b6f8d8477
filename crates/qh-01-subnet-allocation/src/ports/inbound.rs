//! Driving ports (Inbound API)

use async_trait::async_trait;

use crate::domain::{AllocationError, CidrBlock};
use crate::service::Subnet;

/// Primary allocation API consumed by the topology.
#[async_trait]
pub trait SubnetAllocationApi: Send + Sync {
    /// Provision a fresh isolated network named `name`.
    ///
    /// Returns a block never returned before by this allocator (modulo the
    /// 256-candidate wrap), or `AllocationExhausted` after the configured
    /// number of rejected candidates.
    async fn allocate_subnet(&self, name: &str) -> Result<Subnet, AllocationError>;

    /// Tear down a subnet obtained from `allocate_subnet`.
    async fn release_subnet(&self, subnet: &Subnet) -> Result<(), AllocationError>;

    /// The candidate the next allocation attempt will try.
    fn peek_candidate(&self) -> CidrBlock;
}
