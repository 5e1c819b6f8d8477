//! Member specifications and launch requests.

use std::path::PathBuf;

use qh_01_subnet_allocation::NetworkHandle;
use qh_02_extra_data::ConsensusFamily;
use shared_crypto::NodeKey;
use shared_types::{MemberEndpoint, MemberId, MemberKind};

/// A member as registered with the topology, before it has an address.
#[derive(Debug, Clone)]
pub struct MemberSpec {
    pub id: MemberId,
    pub kind: MemberKind,
    /// Whether the member's node key is part of the genesis validator set.
    pub validator: bool,
    /// Node key to launch with; generated on first start when absent.
    pub node_key: Option<NodeKey>,
    /// Container image override.
    pub image: Option<String>,
}

impl MemberSpec {
    pub fn new(id: impl Into<MemberId>, kind: MemberKind) -> Self {
        Self {
            id: id.into(),
            kind,
            validator: false,
            node_key: None,
            image: None,
        }
    }

    /// A consensus node in the genesis validator set.
    pub fn validator(id: &str) -> Self {
        Self {
            validator: true,
            ..Self::new(id, MemberKind::ConsensusNode)
        }
    }

    /// A consensus node that is not a validator.
    pub fn node(id: &str) -> Self {
        Self::new(id, MemberKind::ConsensusNode)
    }

    pub fn signer(id: &str) -> Self {
        Self::new(id, MemberKind::TransactionSigner)
    }

    pub fn privacy_manager(id: &str) -> Self {
        Self::new(id, MemberKind::PrivacyManager)
    }

    pub fn with_node_key(mut self, key: NodeKey) -> Self {
        self.node_key = Some(key);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Reason this spec can never be launched, if any.
    pub(crate) fn defect(&self) -> Option<String> {
        if self.id.as_str().is_empty() {
            return Some("member name is empty".to_string());
        }
        if self.kind != MemberKind::ConsensusNode {
            if self.validator {
                return Some(format!("a {} cannot be a validator", self.kind));
            }
            if self.node_key.is_some() {
                return Some(format!("a {} does not use a node key", self.kind));
            }
        }
        None
    }
}

/// Everything a launcher needs to start one member.
#[derive(Debug, Clone)]
pub struct MemberLaunch {
    pub endpoint: MemberEndpoint,
    pub network: NetworkHandle,
    pub image: Option<String>,
    /// Present for consensus nodes only.
    pub node_key: Option<NodeKey>,
    pub genesis_path: PathBuf,
    /// Enode URLs of every consensus node, this one included.
    pub bootnodes: Vec<String>,
    pub family: ConsensusFamily,
    pub chain_id: u64,
}

/// Handle to a launched member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningMember {
    pub member: MemberId,
    /// Launcher-specific id (container id, process id, ...).
    pub handle: String,
}
