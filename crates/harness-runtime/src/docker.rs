//! # Docker Collaborators
//!
//! Networks and members are driven through the `docker` CLI, one process
//! per call.
//!
//! | Port | Command |
//! |------|---------|
//! | `create_isolated_network` | `docker network create --subnet <cidr> --gateway <.1> <name>` |
//! | `close_network` | `docker network rm <id>` |
//! | `start_member` | `docker run -d --network <name> --ip <address> ...` |
//! | `stop_member` | `docker rm -f <container>` |
//! | `fetch_logs` | `docker logs <container>` |
//!
//! The daemon's "Pool overlaps" refusal maps to
//! `ProvisionError::AddressSpaceInUse` so the allocator moves on to the
//! next candidate.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use harness_telemetry::log_member_event;
use qh_01_subnet_allocation::{CidrBlock, NetworkHandle, NetworkProvisioner, ProvisionError};
use qh_02_extra_data::ConsensusFamily;
use qh_04_topology::{LaunchError, MemberLaunch, MemberLauncher, RunningMember};
use shared_types::MemberKind;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::DockerSection;

/// Directory genesis and key files are mounted at inside containers.
pub const CONFIG_MOUNT: &str = "/config";

#[derive(Debug, Error)]
pub enum DockerError {
    #[error("Failed to run {binary}: {reason}")]
    Spawn { binary: String, reason: String },

    #[error("`docker {command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Captured output of one CLI call.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Thin async wrapper over the docker binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub async fn run(&self, args: &[String]) -> Result<CommandOutput, DockerError> {
        debug!(binary = %self.binary, args = ?args, "Running docker command");
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DockerError::Spawn {
                binary: self.binary.clone(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(DockerError::Failed {
                command: args.first().cloned().unwrap_or_default(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(CommandOutput { stdout, stderr })
    }
}

// =============================================================================
// NETWORKS
// =============================================================================

/// `NetworkProvisioner` backed by `docker network`.
#[derive(Debug, Clone)]
pub struct DockerNetworkProvisioner {
    cli: Arc<DockerCli>,
}

impl DockerNetworkProvisioner {
    pub fn new(cli: Arc<DockerCli>) -> Self {
        Self { cli }
    }
}

pub fn network_create_args(name: &str, cidr: &CidrBlock) -> Vec<String> {
    vec![
        "network".to_string(),
        "create".to_string(),
        "--driver".to_string(),
        "bridge".to_string(),
        "--subnet".to_string(),
        cidr.to_string(),
        "--gateway".to_string(),
        cidr.gateway().to_string(),
        name.to_string(),
    ]
}

/// Whether the daemon refused a subnet because it overlaps an existing one.
pub fn is_address_space_conflict(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("pool overlaps") || stderr.contains("overlaps with other one")
}

#[async_trait]
impl NetworkProvisioner for DockerNetworkProvisioner {
    async fn create_isolated_network(
        &self,
        name: &str,
        cidr: &CidrBlock,
    ) -> Result<NetworkHandle, ProvisionError> {
        match self.cli.run(&network_create_args(name, cidr)).await {
            Ok(output) => {
                let handle = NetworkHandle {
                    id: output.stdout.trim().to_string(),
                    name: name.to_string(),
                    cidr: *cidr,
                };
                info!(network = %name, id = %handle.id, %cidr, "Docker network created");
                Ok(handle)
            }
            Err(DockerError::Failed { stderr, .. }) if is_address_space_conflict(&stderr) => {
                Err(ProvisionError::AddressSpaceInUse {
                    cidr: *cidr,
                    reason: stderr,
                })
            }
            Err(e) => Err(ProvisionError::Provider(e.to_string())),
        }
    }

    async fn close_network(&self, handle: &NetworkHandle) -> Result<(), ProvisionError> {
        let args = vec!["network".to_string(), "rm".to_string(), handle.id.clone()];
        match self.cli.run(&args).await {
            Ok(_) => Ok(()),
            Err(DockerError::Failed { stderr, .. })
                if stderr.to_ascii_lowercase().contains("no such network") =>
            {
                Err(ProvisionError::UnknownNetwork(handle.id.clone()))
            }
            Err(e) => Err(ProvisionError::Provider(e.to_string())),
        }
    }
}

// =============================================================================
// MEMBERS
// =============================================================================

/// `MemberLauncher` running one container per member.
#[derive(Debug, Clone)]
pub struct DockerMemberLauncher {
    cli: Arc<DockerCli>,
    images: DockerSection,
}

impl DockerMemberLauncher {
    pub fn new(cli: Arc<DockerCli>, images: DockerSection) -> Self {
        Self { cli, images }
    }

    fn image_for(&self, launch: &MemberLaunch) -> String {
        if let Some(image) = &launch.image {
            return image.clone();
        }
        match launch.endpoint.kind {
            MemberKind::ConsensusNode => self.images.node_image.clone(),
            MemberKind::TransactionSigner => self.images.signer_image.clone(),
            MemberKind::PrivacyManager => self.images.privacy_image.clone(),
        }
    }
}

/// File name of a member's node key inside the config mount.
pub fn key_file_name(launch: &MemberLaunch) -> String {
    format!("{}.key", launch.endpoint.member)
}

/// Container name: unique per network and member.
pub fn container_name(launch: &MemberLaunch) -> String {
    format!("{}-{}", launch.network.name, launch.endpoint.member)
}

/// Full `docker run` argument list for `launch`.
pub fn run_args(launch: &MemberLaunch, image: &str) -> Vec<String> {
    let config_dir = launch
        .genesis_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .display()
        .to_string();

    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        container_name(launch),
        "--network".to_string(),
        launch.network.name.clone(),
        "--ip".to_string(),
        launch.endpoint.address.to_string(),
        "-v".to_string(),
        format!("{config_dir}:{CONFIG_MOUNT}:ro"),
        image.to_string(),
    ];
    args.extend(member_args(launch));
    args
}

/// Arguments passed to the member's own entrypoint.
pub fn member_args(launch: &MemberLaunch) -> Vec<String> {
    let endpoint = &launch.endpoint;
    match endpoint.kind {
        MemberKind::ConsensusNode => {
            let own_enode_suffix = format!("@{}:{}", endpoint.address, endpoint.p2p_port);
            let peers: Vec<&str> = launch
                .bootnodes
                .iter()
                .map(String::as_str)
                .filter(|enode| !enode.ends_with(&own_enode_suffix))
                .collect();

            let mut args = vec![
                format!("--genesis-file={CONFIG_MOUNT}/genesis.json"),
                format!("--node-private-key-file={CONFIG_MOUNT}/{}", key_file_name(launch)),
                format!("--p2p-host={}", endpoint.address),
                format!("--p2p-port={}", endpoint.p2p_port),
                "--rpc-http-enabled".to_string(),
                "--rpc-http-host=0.0.0.0".to_string(),
                format!("--rpc-http-port={}", endpoint.rpc_port),
                format!("--rpc-http-api=ADMIN,ETH,NET,WEB3,{}", consensus_api(launch.family)),
                "--host-allowlist=*".to_string(),
                "--min-gas-price=0".to_string(),
            ];
            if !peers.is_empty() {
                args.push(format!("--bootnodes={}", peers.join(",")));
            }
            args
        }
        MemberKind::TransactionSigner => {
            let mut args = vec![
                format!("--chain-id={}", launch.chain_id),
                "--http-listen-host=0.0.0.0".to_string(),
                format!("--http-listen-port={}", endpoint.rpc_port),
            ];
            if let Some(host) = launch.bootnodes.first().and_then(|e| enode_host(e)) {
                args.push(format!("--downstream-http-host={host}"));
                args.push(format!("--downstream-http-port={}", endpoint.rpc_port));
            }
            args
        }
        MemberKind::PrivacyManager => vec![
            "-o".to_string(),
            format!(
                "serverConfigs[0].serverAddress=http://{}:{}",
                endpoint.address, endpoint.rpc_port
            ),
        ],
    }
}

fn consensus_api(family: ConsensusFamily) -> &'static str {
    match family {
        ConsensusFamily::Clique => "CLIQUE",
        ConsensusFamily::IbftLegacy | ConsensusFamily::Ibft2 => "IBFT",
        ConsensusFamily::Qbft => "QBFT",
    }
}

fn enode_host(enode: &str) -> Option<&str> {
    let (_, address) = enode.split_once('@')?;
    address.split(':').next()
}

#[async_trait]
impl MemberLauncher for DockerMemberLauncher {
    async fn start_member(&self, launch: &MemberLaunch) -> Result<RunningMember, LaunchError> {
        let member = &launch.endpoint.member;

        if let Some(key) = &launch.node_key {
            let dir = launch.genesis_path.parent().unwrap_or_else(|| Path::new("."));
            let key_path = dir.join(key_file_name(launch));
            tokio::fs::write(&key_path, key.to_hex().as_bytes())
                .await
                .map_err(|e| {
                    LaunchError::failed(member, format!("writing {}: {e}", key_path.display()))
                })?;
        }

        let image = self.image_for(launch);
        let output = self
            .cli
            .run(&run_args(launch, &image))
            .await
            .map_err(|e| LaunchError::failed(member, e.to_string()))?;

        let handle = output.stdout.trim().to_string();
        log_member_event!(
            info,
            "docker",
            "Container started",
            member,
            address = %launch.endpoint.address,
            %image,
            container = %handle
        );
        Ok(RunningMember {
            member: member.clone(),
            handle,
        })
    }

    async fn stop_member(&self, member: &RunningMember) -> Result<(), LaunchError> {
        let args = vec!["rm".to_string(), "-f".to_string(), member.handle.clone()];
        self.cli
            .run(&args)
            .await
            .map_err(|e| LaunchError::failed(&member.member, e.to_string()))?;
        log_member_event!(debug, "docker", "Container removed", member.member, container = %member.handle);
        Ok(())
    }

    async fn fetch_logs(&self, member: &RunningMember) -> Result<String, LaunchError> {
        let args = vec!["logs".to_string(), member.handle.clone()];
        let output = self
            .cli
            .run(&args)
            .await
            .map_err(|e| LaunchError::failed(&member.member, e.to_string()))?;
        Ok(format!("{}{}", output.stdout, output.stderr))
    }
}
