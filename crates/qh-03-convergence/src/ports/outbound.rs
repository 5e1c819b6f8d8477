//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use shared_types::{
    Address, Hash, MemberEndpoint, PeerId, RpcError, TransactionDetails, TransactionReceipt, Wei,
};

/// Read-only view of a member's RPC surface.
///
/// `Ok(None)` means "answered, but not there yet" (an unmined receipt, for
/// example). Errors are transient from the poller's point of view.
#[async_trait]
pub trait RpcReader: Send + Sync {
    async fn transaction_receipt(
        &self,
        member: &MemberEndpoint,
        hash: Hash,
    ) -> Result<Option<TransactionReceipt>, RpcError>;

    async fn transaction_by_hash(
        &self,
        member: &MemberEndpoint,
        hash: Hash,
    ) -> Result<Option<TransactionDetails>, RpcError>;

    /// Balance of `account` at the latest block.
    async fn balance(&self, member: &MemberEndpoint, account: Address) -> Result<Wei, RpcError>;

    /// Validator set at the latest block.
    async fn validators(&self, member: &MemberEndpoint) -> Result<Vec<Address>, RpcError>;

    async fn block_number(&self, member: &MemberEndpoint) -> Result<u64, RpcError>;

    /// Ids of the peers `member` is currently connected to.
    async fn peer_ids(&self, member: &MemberEndpoint) -> Result<Vec<PeerId>, RpcError>;

    /// Id `member` advertises to its peers.
    async fn node_id(&self, member: &MemberEndpoint) -> Result<PeerId, RpcError>;
}
