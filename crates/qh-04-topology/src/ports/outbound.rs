//! Driven ports (Outbound dependencies)
//!
//! The topology never touches processes or files directly; a launcher and
//! a genesis writer do it on its behalf.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use shared_types::MemberId;

use crate::domain::{MemberLaunch, RunningMember};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("{member}: {reason}")]
    Failed { member: MemberId, reason: String },

    #[error("{0} is not running")]
    NotRunning(MemberId),
}

impl LaunchError {
    pub fn failed(member: &MemberId, reason: impl Into<String>) -> Self {
        Self::Failed {
            member: member.clone(),
            reason: reason.into(),
        }
    }
}

/// The genesis document could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to write genesis for {network}: {reason}")]
pub struct GenesisWriteError {
    pub network: String,
    pub reason: String,
}

/// Starts and stops member processes (containers).
#[async_trait]
pub trait MemberLauncher: Send + Sync {
    async fn start_member(&self, launch: &MemberLaunch) -> Result<RunningMember, LaunchError>;

    async fn stop_member(&self, member: &RunningMember) -> Result<(), LaunchError>;

    /// Output captured from the member so far.
    async fn fetch_logs(&self, member: &RunningMember) -> Result<String, LaunchError>;
}

/// Persists the genesis document where the launcher can mount it.
#[async_trait]
pub trait GenesisWriter: Send + Sync {
    /// Write `document` for network `network` and return its location.
    async fn write_genesis(
        &self,
        network: &str,
        document: &Value,
    ) -> Result<PathBuf, GenesisWriteError>;
}
