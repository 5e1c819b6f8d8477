//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Chain**: `Address`, `Hash`, `Wei`, `TransactionReceipt`, `TransactionDetails`
//! - **Topology**: `MemberId`, `MemberKind`, `MemberEndpoint`, `PeerId`

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Re-export fixed-size primitives so downstream crates agree on one set.
pub use primitive_types::{H160, H256, U256};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 20-byte chain account address.
pub type Address = H160;

/// A 32-byte hash (transaction or block hash).
pub type Hash = H256;

/// An amount of the chain's base currency, in wei.
pub type Wei = U256;

/// Parse a 20-byte address from hex, with or without `0x`.
pub fn parse_address(input: &str) -> Result<Address, String> {
    let bytes = parse_fixed_hex(input, 20)?;
    Ok(Address::from_slice(&bytes))
}

/// Parse a 32-byte hash from hex, with or without `0x`.
pub fn parse_hash(input: &str) -> Result<Hash, String> {
    let bytes = parse_fixed_hex(input, 32)?;
    Ok(Hash::from_slice(&bytes))
}

fn parse_fixed_hex(input: &str, expected: usize) -> Result<Vec<u8>, String> {
    let digits = input.trim().strip_prefix("0x").unwrap_or(input.trim());
    let bytes = hex::decode(digits).map_err(|e| format!("invalid hex '{input}': {e}"))?;
    if bytes.len() != expected {
        return Err(format!(
            "expected {expected} bytes, got {} in '{input}'",
            bytes.len()
        ));
    }
    Ok(bytes)
}

/// Receipt of a mined transaction as reported by one member.
///
/// Two members agree on a transaction when their receipts compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: Hash,
    /// Hash of the block that included the transaction.
    pub block_hash: Hash,
    /// Height of the block that included the transaction.
    pub block_number: u64,
    /// Sender of the transaction.
    pub from: Address,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Gas consumed by this transaction alone.
    pub gas_used: u64,
    /// Created contract, if any.
    pub contract_address: Option<Address>,
    /// Execution status (`true` = success).
    pub status: bool,
}

impl TransactionReceipt {
    /// Whether the transaction executed successfully.
    pub fn is_successful(&self) -> bool {
        self.status
    }
}

/// The subset of a transaction needed to reason about balance changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub hash: Hash,
    pub from: Address,
    pub to: Option<Address>,
    pub value: Wei,
    pub gas_price: Wei,
    pub gas_limit: u64,
    pub nonce: u64,
}

// =============================================================================
// CLUSTER B: THE TOPOLOGY
// =============================================================================

/// Unique, human-readable name of a network member (e.g. `validator-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The role a process plays in the test network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberKind {
    /// A chain client taking part in consensus and devp2p peering.
    ConsensusNode,
    /// An external transaction signer fronting a node's RPC.
    TransactionSigner,
    /// A private transaction manager peering with other managers.
    PrivacyManager,
}

impl MemberKind {
    /// Whether members of this kind peer with each other.
    ///
    /// Transaction signers only proxy RPC, so they never appear in a peer list.
    pub fn participates_in_peering(&self) -> bool {
        !matches!(self, MemberKind::TransactionSigner)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::ConsensusNode => "consensus-node",
            MemberKind::TransactionSigner => "transaction-signer",
            MemberKind::PrivacyManager => "privacy-manager",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consensus-node" | "node" => Ok(MemberKind::ConsensusNode),
            "transaction-signer" | "signer" => Ok(MemberKind::TransactionSigner),
            "privacy-manager" | "tessera" => Ok(MemberKind::PrivacyManager),
            other => Err(format!("unknown member kind: {other}")),
        }
    }
}

/// An allocated address bound to one network participant.
///
/// Created when a member is registered and the topology starts; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberEndpoint {
    pub member: MemberId,
    pub kind: MemberKind,
    pub address: Ipv4Addr,
    pub rpc_port: u16,
    pub p2p_port: u16,
}

impl MemberEndpoint {
    /// HTTP JSON-RPC URL of this member.
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}", self.address, self.rpc_port)
    }
}

impl fmt::Display for MemberEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.member, self.address)
    }
}

/// Identifier a member advertises to its peers (devp2p node id, hex).
///
/// Stored lower-case without a `0x` prefix so ids from different sources
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref();
        let id = id.strip_prefix("0x").unwrap_or(id);
        Self(id.to_ascii_lowercase())
    }

    /// Extract the node id from an `enode://<id>@host:port` URL.
    pub fn from_enode(enode: &str) -> Option<Self> {
        let rest = enode.strip_prefix("enode://")?;
        let id = rest.split('@').next()?;
        if id.is_empty() {
            return None;
        }
        Some(Self::new(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
