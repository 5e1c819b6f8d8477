//! Topology configuration.

use std::env;

use qh_03_convergence::PollerConfig;
use shared_types::MemberKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyConfig {
    /// Prefix of the provisioned network's name.
    pub name: String,
    /// JSON-RPC port of consensus nodes and signers.
    pub rpc_port: u16,
    /// devp2p port of consensus nodes.
    pub p2p_port: u16,
    /// Port privacy managers listen on.
    pub privacy_port: u16,
    /// Budget and cadence of the start-up connectivity wait.
    pub poller: PollerConfig,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            name: "qh".to_string(),
            rpc_port: 8545,
            p2p_port: 30303,
            privacy_port: 9081,
            poller: PollerConfig::default(),
        }
    }
}

impl TopologyConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QH_TOPOLOGY_NAME`: network name prefix (default: qh)
    /// - `QH_RPC_PORT`, `QH_P2P_PORT`, `QH_PRIVACY_PORT`
    /// - plus the poller variables (`QH_CONVERGENCE_TIMEOUT_SECS`, `QH_POLL_INTERVAL_MS`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = |key: &str, default: u16| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            name: env::var("QH_TOPOLOGY_NAME").unwrap_or(defaults.name),
            rpc_port: port("QH_RPC_PORT", defaults.rpc_port),
            p2p_port: port("QH_P2P_PORT", defaults.p2p_port),
            privacy_port: port("QH_PRIVACY_PORT", defaults.privacy_port),
            poller: PollerConfig::from_env(),
        }
    }

    pub fn for_testing() -> Self {
        Self {
            name: "qh-test".to_string(),
            poller: PollerConfig::for_testing(),
            ..Self::default()
        }
    }

    /// `(rpc, p2p)` ports for a member kind.
    pub fn ports_for(&self, kind: MemberKind) -> (u16, u16) {
        match kind {
            MemberKind::ConsensusNode => (self.rpc_port, self.p2p_port),
            MemberKind::TransactionSigner => (self.rpc_port, self.rpc_port),
            MemberKind::PrivacyManager => (self.privacy_port, self.privacy_port),
        }
    }
}
