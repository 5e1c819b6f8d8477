//! # Harness Runtime
//!
//! Production collaborators for the Quorum-Harness subsystems and the
//! `qh-harness` command line.
//!
//! ## Adapters
//!
//! | Port | Adapter | Backend |
//! |------|---------|---------|
//! | `NetworkProvisioner` | `DockerNetworkProvisioner` | `docker network create/rm` |
//! | `MemberLauncher` | `DockerMemberLauncher` | `docker run/rm/logs` |
//! | `GenesisWriter` | `FileGenesisWriter` | `<work_dir>/<network>/genesis.json` |
//! | `RpcReader` | `JsonRpcReader` | HTTP JSON-RPC, Tessera `/partyinfo` |
//!
//! `Harness` ties them together from a TOML topology file (see `config`).

pub mod commands;
pub mod config;
pub mod docker;
pub mod genesis_file;
pub mod rpc;
pub mod runtime;

pub use config::{ConfigError, HarnessConfig};
pub use docker::{DockerCli, DockerError, DockerMemberLauncher, DockerNetworkProvisioner};
pub use genesis_file::FileGenesisWriter;
pub use rpc::JsonRpcReader;
pub use runtime::Harness;
