//! # Network Topology Service
//!
//! Owns one test network from registration to teardown.
//!
//! ## Start Sequence
//!
//! ```text
//! start()
//!   │ first start only
//!   ├─→ allocate subnet, lease one address per member (registration order)
//!   ├─→ node keys → validator addresses → extra data → genesis file
//!   │ every start
//!   ├─→ launch all members concurrently (bootnodes = every consensus node)
//!   └─→ wait for mutual connectivity ──→ Started
//! ```
//!
//! A start that fails at any step stops whatever was launched, logs the
//! members' output and leaves the state unchanged. A failed first start
//! also gives the subnet back.
//!
//! `stop()` keeps the subnet, addresses, keys and genesis so the next
//! `start()` relaunches the same network. `close()` releases the subnet.
//!
//! Lifecycle calls take `&mut self`: one owner drives the topology.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use qh_01_subnet_allocation::{Subnet, SubnetAllocationApi};
use qh_02_extra_data::{codec_for, ExtraData};
use qh_03_convergence::{ConvergencePoller, ConvergenceVerifier, RpcReader};
use shared_crypto::{NodeKey, ValidatorIdentity};
use shared_types::{Address, MemberEndpoint, MemberKind};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    transition, GenesisSpec, LifecycleOp, MemberLaunch, MemberSpec, RunningMember, TopologyConfig,
    TopologyError, TopologyState,
};
use crate::metrics;
use crate::ports::{GenesisWriter, MemberLauncher};

/// External collaborators of a topology.
#[derive(Clone)]
pub struct TopologyCollaborators {
    pub allocator: Arc<dyn SubnetAllocationApi>,
    pub launcher: Arc<dyn MemberLauncher>,
    pub genesis_writer: Arc<dyn GenesisWriter>,
    pub reader: Arc<dyn RpcReader>,
}

/// Resources acquired by the first start and kept until `close()`.
struct Deployment {
    subnet: Subnet,
    endpoints: Vec<MemberEndpoint>,
    node_keys: HashMap<shared_types::MemberId, NodeKey>,
    validators: Vec<Address>,
    extra_data: ExtraData,
    genesis_path: PathBuf,
}

/// A multi-member test network with a strict lifecycle.
pub struct NetworkTopology {
    config: TopologyConfig,
    genesis: GenesisSpec,
    allocator: Arc<dyn SubnetAllocationApi>,
    launcher: Arc<dyn MemberLauncher>,
    genesis_writer: Arc<dyn GenesisWriter>,
    verifier: ConvergenceVerifier,
    state: TopologyState,
    members: Vec<MemberSpec>,
    deployment: Option<Deployment>,
    running: Vec<RunningMember>,
}

impl NetworkTopology {
    pub fn new(
        config: TopologyConfig,
        genesis: GenesisSpec,
        collaborators: TopologyCollaborators,
    ) -> Self {
        let verifier =
            ConvergenceVerifier::new(collaborators.reader, ConvergencePoller::new(config.poller));
        Self {
            config,
            genesis,
            allocator: collaborators.allocator,
            launcher: collaborators.launcher,
            genesis_writer: collaborators.genesis_writer,
            verifier,
            state: TopologyState::Uninitialized,
            members: Vec::new(),
            deployment: None,
            running: Vec::new(),
        }
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Add a member. Only allowed before the first start.
    pub fn register(&mut self, spec: MemberSpec) -> Result<(), TopologyError> {
        if self.state != TopologyState::Uninitialized {
            return Err(TopologyError::RegistrationClosed {
                member: spec.id,
                state: self.state,
            });
        }
        if let Some(reason) = spec.defect() {
            return Err(TopologyError::InvalidMember {
                member: spec.id,
                reason,
            });
        }
        if self.members.iter().any(|m| m.id == spec.id) {
            return Err(TopologyError::DuplicateMember(spec.id));
        }

        debug!(member = %spec.id, kind = %spec.kind, validator = spec.validator, "Member registered");
        self.members.push(spec);
        Ok(())
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Launch every member and wait until the network is peered.
    pub async fn start(&mut self) -> Result<(), TopologyError> {
        let next = transition(self.state, LifecycleOp::Start)?;
        let previous = self.state;
        info!(
            topology = %self.config.name,
            state = %previous,
            members = self.members.len(),
            "Starting topology"
        );

        if let Err(e) = self.bring_up().await {
            warn!(topology = %self.config.name, error = %e, "Topology start failed");
            self.abort_start(previous).await;
            return Err(e);
        }

        self.state = next;
        metrics::record_transition(LifecycleOp::Start.as_str());
        info!(
            topology = %self.config.name,
            cidr = %self.subnet().map(|s| s.cidr().to_string()).unwrap_or_default(),
            "Topology started"
        );
        Ok(())
    }

    /// Halt every member, keeping addresses and genesis for a restart.
    ///
    /// Every member is asked to stop even if an earlier one fails; the
    /// topology ends up `Stopped` and the first failure is returned.
    pub async fn stop(&mut self) -> Result<(), TopologyError> {
        let next = transition(self.state, LifecycleOp::Stop)?;

        let running = std::mem::take(&mut self.running);
        let launcher = Arc::clone(&self.launcher);
        let results = join_all(running.iter().map(|m| launcher.stop_member(m))).await;

        let mut first_error = None;
        for (member, result) in running.iter().zip(results) {
            metrics::add_running_members(-1);
            if let Err(e) = result {
                warn!(member = %member.member, error = %e, "Failed to stop member");
                first_error.get_or_insert(TopologyError::Shutdown {
                    member: member.member.clone(),
                    reason: e.to_string(),
                });
            }
        }

        self.state = next;
        metrics::record_transition(LifecycleOp::Stop.as_str());
        info!(topology = %self.config.name, "Topology stopped");
        first_error.map_or(Ok(()), Err)
    }

    /// Release the subnet. Irreversible.
    ///
    /// If the release fails the topology stays `Stopped` so it can be
    /// retried.
    pub async fn close(&mut self) -> Result<(), TopologyError> {
        let next = transition(self.state, LifecycleOp::Close)?;

        if let Some(deployment) = &self.deployment {
            self.allocator.release_subnet(&deployment.subnet).await?;
        }
        self.deployment = None;

        self.state = next;
        metrics::record_transition(LifecycleOp::Close.as_str());
        info!(topology = %self.config.name, "Topology closed");
        Ok(())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn state(&self) -> TopologyState {
        self.state
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn genesis(&self) -> &GenesisSpec {
        &self.genesis
    }

    pub fn members(&self) -> &[MemberSpec] {
        &self.members
    }

    /// Bound endpoints in registration order; empty before the first start.
    pub fn endpoints(&self) -> &[MemberEndpoint] {
        self.deployment
            .as_ref()
            .map(|d| d.endpoints.as_slice())
            .unwrap_or(&[])
    }

    pub fn endpoint(&self, member: &str) -> Option<&MemberEndpoint> {
        self.endpoints().iter().find(|e| e.member.as_str() == member)
    }

    pub fn subnet(&self) -> Option<&Subnet> {
        self.deployment.as_ref().map(|d| &d.subnet)
    }

    /// Genesis validator addresses, in extra-data order.
    pub fn validator_addresses(&self) -> &[Address] {
        self.deployment
            .as_ref()
            .map(|d| d.validators.as_slice())
            .unwrap_or(&[])
    }

    pub fn extra_data(&self) -> Option<&ExtraData> {
        self.deployment.as_ref().map(|d| &d.extra_data)
    }

    pub fn genesis_path(&self) -> Option<&Path> {
        self.deployment.as_ref().map(|d| d.genesis_path.as_path())
    }

    pub fn running(&self) -> &[RunningMember] {
        &self.running
    }

    /// Verifier bound to this topology's RPC reader and poller settings.
    pub fn verifier(&self) -> &ConvergenceVerifier {
        &self.verifier
    }

    // =========================================================================
    // START INTERNALS
    // =========================================================================

    async fn bring_up(&mut self) -> Result<(), TopologyError> {
        if self.deployment.is_none() {
            self.deployment = Some(self.deploy().await?);
        }
        let launches = self.launch_requests();

        let launcher = Arc::clone(&self.launcher);
        let results = join_all(launches.iter().map(|l| launcher.start_member(l))).await;

        let mut first_error = None;
        for (launch, result) in launches.iter().zip(results) {
            match result {
                Ok(running) => {
                    debug!(member = %launch.endpoint, handle = %running.handle, "Member launched");
                    metrics::add_running_members(1);
                    self.running.push(running);
                }
                Err(e) => {
                    first_error.get_or_insert(TopologyError::Launch {
                        member: launch.endpoint.member.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        self.verifier.mutual_connectivity(self.endpoints()).await?;
        Ok(())
    }

    async fn deploy(&self) -> Result<Deployment, TopologyError> {
        let network = format!("{}-{}", self.config.name, short_id());
        let subnet = self.allocator.allocate_subnet(&network).await?;

        match self.prepare(&subnet).await {
            Ok((endpoints, node_keys, validators, extra_data, genesis_path)) => Ok(Deployment {
                subnet,
                endpoints,
                node_keys,
                validators,
                extra_data,
                genesis_path,
            }),
            Err(e) => {
                if let Err(release) = self.allocator.release_subnet(&subnet).await {
                    warn!(network = %network, error = %release, "Failed to release subnet");
                }
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    async fn prepare(
        &self,
        subnet: &Subnet,
    ) -> Result<
        (
            Vec<MemberEndpoint>,
            HashMap<shared_types::MemberId, NodeKey>,
            Vec<Address>,
            ExtraData,
            PathBuf,
        ),
        TopologyError,
    > {
        let mut endpoints = Vec::with_capacity(self.members.len());
        let mut node_keys = HashMap::new();

        for spec in &self.members {
            let address = subnet.lease_address()?;
            let (rpc_port, p2p_port) = self.config.ports_for(spec.kind);
            endpoints.push(MemberEndpoint {
                member: spec.id.clone(),
                kind: spec.kind,
                address,
                rpc_port,
                p2p_port,
            });
            if spec.kind == MemberKind::ConsensusNode {
                let key = spec.node_key.clone().unwrap_or_else(NodeKey::generate);
                node_keys.insert(spec.id.clone(), key);
            }
        }

        let identities: Vec<ValidatorIdentity> = self
            .members
            .iter()
            .filter(|spec| spec.validator)
            .filter_map(|spec| node_keys.get(&spec.id))
            .map(NodeKey::identity)
            .collect();
        let validators: Vec<Address> = identities.iter().map(ValidatorIdentity::address).collect();

        let extra_data = codec_for(self.genesis.family).encode(&validators);
        let document = self.genesis.document(&extra_data);
        let genesis_path = self
            .genesis_writer
            .write_genesis(&subnet.handle().name, &document)
            .await
            .map_err(|e| TopologyError::Genesis(e.to_string()))?;

        info!(
            network = %subnet.handle().name,
            cidr = %subnet.cidr(),
            family = %self.genesis.family,
            validators = validators.len(),
            genesis = %genesis_path.display(),
            "Topology deployed"
        );
        Ok((endpoints, node_keys, validators, extra_data, genesis_path))
    }

    fn launch_requests(&self) -> Vec<MemberLaunch> {
        let Some(deployment) = &self.deployment else {
            return Vec::new();
        };

        let bootnodes: Vec<String> = deployment
            .endpoints
            .iter()
            .filter_map(|endpoint| {
                deployment
                    .node_keys
                    .get(&endpoint.member)
                    .map(|key| key.enode(endpoint.address, endpoint.p2p_port))
            })
            .collect();

        self.members
            .iter()
            .zip(&deployment.endpoints)
            .map(|(spec, endpoint)| MemberLaunch {
                endpoint: endpoint.clone(),
                network: deployment.subnet.handle().clone(),
                image: spec.image.clone(),
                node_key: deployment.node_keys.get(&spec.id).cloned(),
                genesis_path: deployment.genesis_path.clone(),
                bootnodes: bootnodes.clone(),
                family: self.genesis.family,
                chain_id: self.genesis.chain_id,
            })
            .collect()
    }

    async fn abort_start(&mut self, previous: TopologyState) {
        for member in std::mem::take(&mut self.running) {
            match self.launcher.fetch_logs(&member).await {
                Ok(logs) => warn!(member = %member.member, %logs, "Member output before abort"),
                Err(e) => warn!(member = %member.member, error = %e, "Could not fetch member logs"),
            }
            if let Err(e) = self.launcher.stop_member(&member).await {
                warn!(member = %member.member, error = %e, "Failed to stop member during abort");
            }
            metrics::add_running_members(-1);
        }

        if previous == TopologyState::Uninitialized {
            if let Some(deployment) = self.deployment.take() {
                if let Err(e) = self.allocator.release_subnet(&deployment.subnet).await {
                    warn!(cidr = %deployment.subnet.cidr(), error = %e, "Failed to release subnet");
                }
            }
        }
    }
}

impl std::fmt::Debug for NetworkTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkTopology")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("members", &self.members.len())
            .field("running", &self.running.len())
            .finish_non_exhaustive()
    }
}

fn short_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

#[cfg(test)]
mod tests;
