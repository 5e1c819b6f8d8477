//! Genesis files on the local filesystem.
//!
//! Layout: `<root>/<network>/genesis.json`. The per-network directory is
//! what the Docker launcher mounts, so node key files land next to it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use qh_04_topology::{GenesisWriteError, GenesisWriter};
use serde_json::Value;
use tracing::debug;

pub const GENESIS_FILE_NAME: &str = "genesis.json";

#[derive(Debug, Clone)]
pub struct FileGenesisWriter {
    root: PathBuf,
}

impl FileGenesisWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the genesis of `network` is (or will be) written.
    pub fn path_for(&self, network: &str) -> PathBuf {
        self.root.join(network).join(GENESIS_FILE_NAME)
    }
}

#[async_trait]
impl GenesisWriter for FileGenesisWriter {
    async fn write_genesis(
        &self,
        network: &str,
        document: &Value,
    ) -> Result<PathBuf, GenesisWriteError> {
        let error = |reason: String| GenesisWriteError {
            network: network.to_string(),
            reason,
        };
        if network.is_empty() || network.contains(['/', '\\']) || network.starts_with('.') {
            return Err(error(format!("'{network}' is not a usable directory name")));
        }

        let path = self.path_for(network);
        let dir = self.root.join(network);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| error(format!("creating {}: {e}", dir.display())))?;

        let encoded = serde_json::to_vec_pretty(document).map_err(|e| error(e.to_string()))?;
        tokio::fs::write(&path, encoded)
            .await
            .map_err(|e| error(format!("writing {}: {e}", path.display())))?;

        debug!(network = %network, path = %path.display(), "Genesis written");
        Ok(path)
    }
}
