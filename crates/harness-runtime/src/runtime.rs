//! # Harness Runtime
//!
//! Turns a `HarnessConfig` into a running topology.
//!
//! ## Startup Sequence
//!
//! 1. Build collaborators (docker CLI, JSON-RPC reader, genesis files)
//! 2. Register every configured member
//! 3. `start()`: subnet, genesis, containers, mutual connectivity
//! 4. Confirm every consensus node reports the genesis validator set
//!
//! Shutdown is `stop()` then `close()`, skipping whatever the current
//! state makes unnecessary.

use std::sync::Arc;

use anyhow::{Context, Result};
use qh_01_subnet_allocation::SubnetAllocator;
use qh_03_convergence::RpcReader;
use qh_04_topology::{NetworkTopology, TopologyCollaborators, TopologyState};
use shared_types::{MemberEndpoint, MemberKind};
use tracing::info;

use crate::config::HarnessConfig;
use crate::docker::{DockerCli, DockerMemberLauncher, DockerNetworkProvisioner};
use crate::genesis_file::FileGenesisWriter;
use crate::rpc::JsonRpcReader;

/// A configured topology plus the config it came from.
pub struct Harness {
    config: HarnessConfig,
    topology: NetworkTopology,
}

impl Harness {
    /// Wire the Docker-backed collaborators for `config`.
    pub fn docker(config: HarnessConfig) -> Result<Self> {
        let cli = Arc::new(DockerCli::new(config.docker.binary.clone()));
        let provisioner = Arc::new(DockerNetworkProvisioner::new(cli.clone()));
        let allocator = Arc::new(SubnetAllocator::new(
            provisioner,
            config.allocator_config()?,
        ));
        let reader: Arc<dyn RpcReader> = Arc::new(
            JsonRpcReader::new(config.family()?, config.rpc_timeout())
                .context("Failed to create JSON-RPC client")?,
        );

        let collaborators = TopologyCollaborators {
            allocator,
            launcher: Arc::new(DockerMemberLauncher::new(cli, config.docker.clone())),
            genesis_writer: Arc::new(FileGenesisWriter::new(config.docker.work_dir.clone())),
            reader,
        };
        Self::with_collaborators(config, collaborators)
    }

    /// Build a harness around arbitrary collaborators and register members.
    pub fn with_collaborators(
        config: HarnessConfig,
        collaborators: TopologyCollaborators,
    ) -> Result<Self> {
        let mut topology = NetworkTopology::new(
            config.topology_config()?,
            config.genesis_spec()?,
            collaborators,
        );
        for spec in config.member_specs()? {
            topology.register(spec)?;
        }
        Ok(Self { config, topology })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut NetworkTopology {
        &mut self.topology
    }

    /// Start the topology and confirm the validator set on every node.
    pub async fn up(&mut self) -> Result<()> {
        self.topology
            .start()
            .await
            .context("Failed to start topology")?;

        let nodes: Vec<MemberEndpoint> = self
            .topology
            .endpoints()
            .iter()
            .filter(|e| e.kind == MemberKind::ConsensusNode)
            .cloned()
            .collect();
        let validators = self.topology.validator_addresses().to_vec();
        if !nodes.is_empty() {
            self.topology
                .verifier()
                .consensus_on_validators(&nodes, &validators)
                .await
                .context("Nodes disagree on the genesis validator set")?;
        }

        info!(
            topology = %self.config.topology.name,
            members = self.topology.endpoints().len(),
            validators = validators.len(),
            "Topology is up"
        );
        Ok(())
    }

    /// Stop (if running) and close (if not already closed).
    pub async fn down(&mut self) -> Result<()> {
        if self.topology.state() == TopologyState::Started {
            self.topology.stop().await.context("Failed to stop topology")?;
        }
        if self.topology.state() == TopologyState::Stopped {
            self.topology.close().await.context("Failed to close topology")?;
        }
        Ok(())
    }

    /// One line per member: name, kind, RPC URL.
    pub fn summary(&self) -> Vec<String> {
        self.topology
            .endpoints()
            .iter()
            .map(|e| format!("{:<20} {:<20} {}", e.member, e.kind, e.rpc_url()))
            .collect()
    }
}
