//! # Topology Files
//!
//! A topology is described in TOML and converted into the typed
//! configuration of each subsystem.
//!
//! ```toml
//! [topology]
//! name = "acceptance"
//!
//! [subnet]
//! prefix = "172.29"
//! attempts = 25
//!
//! [genesis]
//! family = "ibft2"
//! chain_id = 1337
//!
//! [genesis.alloc]
//! "0xfe3b557e8fb62b89f4916b721be55ceb828dbd73" = "0xad78ebc5ac6200000"
//!
//! [[members]]
//! name = "validator-1"
//! kind = "node"
//! validator = true
//!
//! [timeouts]
//! convergence_secs = 60
//! ```
//!
//! Every section is optional. Values are kept as written until
//! conversion so a bad address names the field it came from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use qh_01_subnet_allocation::{AllocatorConfig, SubnetRange};
use qh_02_extra_data::ConsensusFamily;
use qh_03_convergence::PollerConfig;
use qh_04_topology::{GenesisSpec, MemberSpec, TopologyConfig};
use serde::{Deserialize, Serialize};
use shared_crypto::NodeKey;
use shared_types::{parse_address, MemberKind, Wei};
use thiserror::Error;

/// Errors loading or converting a topology file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to parse topology file: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

/// Complete harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub topology: TopologySection,
    pub subnet: SubnetSection,
    pub genesis: GenesisSection,
    pub members: Vec<MemberSection>,
    pub timeouts: TimeoutSection,
    pub docker: DockerSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopologySection {
    pub name: String,
    pub rpc_port: u16,
    pub p2p_port: u16,
    pub privacy_port: u16,
}

impl Default for TopologySection {
    fn default() -> Self {
        let defaults = TopologyConfig::default();
        Self {
            name: defaults.name,
            rpc_port: defaults.rpc_port,
            p2p_port: defaults.p2p_port,
            privacy_port: defaults.privacy_port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubnetSection {
    /// `/16` range, e.g. `172.29`.
    pub prefix: String,
    pub attempts: u32,
    /// Third octet of the first candidate.
    pub start: u32,
}

impl Default for SubnetSection {
    fn default() -> Self {
        let defaults = AllocatorConfig::default();
        Self {
            prefix: defaults.range.to_string(),
            attempts: defaults.max_attempts,
            start: defaults.initial_sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenesisSection {
    pub family: String,
    pub chain_id: u64,
    pub block_period_seconds: u64,
    pub epoch_length: u64,
    pub request_timeout_seconds: u64,
    /// Account → balance (decimal or `0x` hex wei).
    pub alloc: BTreeMap<String, String>,
}

impl Default for GenesisSection {
    fn default() -> Self {
        let defaults = GenesisSpec::default();
        Self {
            family: defaults.family.to_string(),
            chain_id: defaults.chain_id,
            block_period_seconds: defaults.block_period_seconds,
            epoch_length: defaults.epoch_length,
            request_timeout_seconds: defaults.request_timeout_seconds,
            alloc: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberSection {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub validator: bool,
    /// Hex secret key; generated when absent.
    #[serde(default)]
    pub node_key: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_kind() -> String {
    MemberKind::ConsensusNode.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSection {
    pub convergence_secs: u64,
    pub poll_interval_ms: u64,
    /// Per-request limit for JSON-RPC reads.
    pub rpc_request_secs: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        let defaults = PollerConfig::default();
        Self {
            convergence_secs: defaults.timeout.as_secs(),
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            rpc_request_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DockerSection {
    /// Path or name of the docker CLI.
    pub binary: String,
    pub node_image: String,
    pub signer_image: String,
    pub privacy_image: String,
    /// Where genesis and key files are written (mounted into containers).
    pub work_dir: PathBuf,
}

impl Default for DockerSection {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            node_image: "hyperledger/besu:latest".to_string(),
            signer_image: "consensys/ethsigner:latest".to_string(),
            privacy_image: "quorumengineering/tessera:latest".to_string(),
            work_dir: std::env::temp_dir().join("quorum-harness"),
        }
    }
}

impl HarnessConfig {
    /// Read and parse a topology file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn family(&self) -> Result<ConsensusFamily, ConfigError> {
        self.genesis
            .family
            .parse()
            .map_err(|e| ConfigError::invalid("genesis.family", e))
    }

    pub fn allocator_config(&self) -> Result<AllocatorConfig, ConfigError> {
        let range: SubnetRange = self
            .subnet
            .prefix
            .parse()
            .map_err(|e| ConfigError::invalid("subnet.prefix", e))?;
        if self.subnet.attempts == 0 {
            return Err(ConfigError::invalid("subnet.attempts", "must be at least 1"));
        }
        Ok(AllocatorConfig {
            range,
            max_attempts: self.subnet.attempts,
            initial_sequence: self.subnet.start,
            ..AllocatorConfig::default()
        })
    }

    pub fn poller_config(&self) -> Result<PollerConfig, ConfigError> {
        if self.timeouts.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "timeouts.poll_interval_ms",
                "must be at least 1",
            ));
        }
        Ok(PollerConfig {
            timeout: Duration::from_secs(self.timeouts.convergence_secs),
            poll_interval: Duration::from_millis(self.timeouts.poll_interval_ms),
        })
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.rpc_request_secs.max(1))
    }

    pub fn topology_config(&self) -> Result<TopologyConfig, ConfigError> {
        Ok(TopologyConfig {
            name: self.topology.name.clone(),
            rpc_port: self.topology.rpc_port,
            p2p_port: self.topology.p2p_port,
            privacy_port: self.topology.privacy_port,
            poller: self.poller_config()?,
        })
    }

    pub fn genesis_spec(&self) -> Result<GenesisSpec, ConfigError> {
        let mut spec = GenesisSpec {
            family: self.family()?,
            chain_id: self.genesis.chain_id,
            block_period_seconds: self.genesis.block_period_seconds,
            epoch_length: self.genesis.epoch_length,
            request_timeout_seconds: self.genesis.request_timeout_seconds,
            ..GenesisSpec::default()
        };
        for (account, balance) in &self.genesis.alloc {
            let field = format!("genesis.alloc.{account}");
            let address = parse_address(account).map_err(|e| ConfigError::invalid(&field, e))?;
            let balance = parse_wei(balance).map_err(|e| ConfigError::invalid(&field, e))?;
            spec = spec.with_allocation(address, balance);
        }
        Ok(spec)
    }

    pub fn member_specs(&self) -> Result<Vec<MemberSpec>, ConfigError> {
        self.members
            .iter()
            .enumerate()
            .map(|(index, member)| {
                let field = |name: &str| format!("members[{index}].{name}");
                let kind: MemberKind = member
                    .kind
                    .parse()
                    .map_err(|e| ConfigError::invalid(field("kind"), e))?;

                let mut spec = MemberSpec::new(member.name.as_str(), kind);
                spec.validator = member.validator;
                if let Some(key) = &member.node_key {
                    let key =
                        NodeKey::from_hex(key).map_err(|e| ConfigError::invalid(field("node_key"), e))?;
                    spec = spec.with_node_key(key);
                }
                if let Some(image) = &member.image {
                    spec = spec.with_image(image.clone());
                }
                Ok(spec)
            })
            .collect()
    }
}

/// Parse a wei amount written as decimal or `0x` hex.
pub fn parse_wei(value: &str) -> Result<Wei, String> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x") {
        Some(digits) => Wei::from_str_radix(digits, 16).ok(),
        None => Wei::from_dec_str(value).ok(),
    };
    parsed.ok_or_else(|| format!("'{value}' is not a wei amount"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[topology]
name = "acceptance"

[subnet]
prefix = "10.77"
attempts = 3

[genesis]
family = "qbft"
chain_id = 2018

[genesis.alloc]
"0xfe3b557e8fb62b89f4916b721be55ceb828dbd73" = "0x10"
"627306090abab3a6e1400e9345bc60c78a8bef57" = "1000"

[[members]]
name = "validator-1"
validator = true
node_key = "0x0000000000000000000000000000000000000000000000000000000000000001"

[[members]]
name = "signer-1"
kind = "signer"

[timeouts]
convergence_secs = 90
poll_interval_ms = 250
"#;

    #[test]
    fn test_sample_file_converts() {
        let config = HarnessConfig::from_toml(SAMPLE).unwrap();

        assert_eq!(config.family().unwrap(), ConsensusFamily::Qbft);
        let allocator = config.allocator_config().unwrap();
        assert_eq!(allocator.range, SubnetRange::new(10, 77));
        assert_eq!(allocator.max_attempts, 3);

        let topology = config.topology_config().unwrap();
        assert_eq!(topology.name, "acceptance");
        assert_eq!(topology.poller.timeout, Duration::from_secs(90));
        assert_eq!(topology.poller.poll_interval, Duration::from_millis(250));

        let genesis = config.genesis_spec().unwrap();
        assert_eq!(genesis.chain_id, 2018);
        assert_eq!(genesis.alloc.len(), 2);
        assert!(genesis.alloc.values().any(|b| *b == Wei::from(16u64)));
        assert!(genesis.alloc.values().any(|b| *b == Wei::from(1000u64)));

        let members = config.member_specs().unwrap();
        assert_eq!(members.len(), 2);
        assert!(members[0].validator);
        assert_eq!(members[0].kind, MemberKind::ConsensusNode);
        assert_eq!(
            format!("{:?}", members[0].node_key.as_ref().unwrap().identity().address()),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        assert_eq!(members[1].kind, MemberKind::TransactionSigner);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = HarnessConfig::from_toml("").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.family().unwrap(), ConsensusFamily::Ibft2);
        assert_eq!(config.poller_config().unwrap(), PollerConfig::default());
        assert!(config.member_specs().unwrap().is_empty());
    }

    #[test]
    fn test_bad_values_name_their_field() {
        let config = HarnessConfig::from_toml(
            r#"
[genesis.alloc]
"0x1234" = "5"
"#,
        )
        .unwrap();
        let err = config.genesis_spec().unwrap_err();
        assert!(err.to_string().contains("genesis.alloc.0x1234"), "{err}");

        let config = HarnessConfig::from_toml(
            r#"
[[members]]
name = "x"
kind = "miner"
"#,
        )
        .unwrap();
        let err = config.member_specs().unwrap_err();
        assert!(err.to_string().contains("members[0].kind"), "{err}");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = HarnessConfig::from_toml("[topology]\nnmae = \"typo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = HarnessConfig::from_toml(SAMPLE).unwrap();
        let reparsed = HarnessConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = HarnessConfig::from_toml("[timeouts]\npoll_interval_ms = 0\n").unwrap();
        let err = config.poller_config().unwrap_err();
        assert!(err.to_string().contains("timeouts.poll_interval_ms"), "{err}");
        assert!(config.topology_config().is_err());
    }

    #[test]
    fn test_parse_wei() {
        assert_eq!(parse_wei("0xff").unwrap(), Wei::from(255u64));
        assert_eq!(parse_wei(" 42 ").unwrap(), Wei::from(42u64));
        assert!(parse_wei("forty-two").is_err());
        assert!(parse_wei("0xzz").is_err());
    }
}
