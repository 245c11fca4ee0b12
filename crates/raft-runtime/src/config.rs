//! # config
//!
//! why: a node is started from a small json file naming itself, its peers and its data directory
//! relations: builds raft-core's ClusterConfig/RaftConfig, picks a raft-storage backend
//! what: NodeConfig, load_config, open_storage

use crate::error::Result;
use raft_core::{ClusterConfig, NodeId, RaftConfig};
use raft_storage::{FileStorage, InMemoryStorage, Storage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything needed to start one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: NodeId,
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub raft: RaftConfig,
    /// where term, vote and log are persisted; `None` keeps them in memory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl NodeConfig {
    /// in-memory node with default timing
    pub fn new(id: NodeId, cluster: ClusterConfig) -> Self {
        Self {
            id,
            cluster,
            raft: RaftConfig::default(),
            data_dir: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.raft.validate()?;
        self.cluster.validate_member(self.id)?;
        Ok(())
    }
}

/// Read and validate a node configuration from a json file
pub fn load_config(path: impl AsRef<Path>) -> Result<NodeConfig> {
    let data = fs::read_to_string(path)?;
    let config: NodeConfig = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(config)
}

/// Open the storage backend the configuration asks for
pub fn open_storage(config: &NodeConfig) -> Result<Box<dyn Storage + Send>> {
    match &config.data_dir {
        Some(dir) => {
            info!(node = %config.id, dir = %dir.display(), "using file storage");
            Ok(Box::new(FileStorage::new(dir)?))
        }
        None => {
            info!(node = %config.id, "using in-memory storage");
            Ok(Box::new(InMemoryStorage::new()))
        }
    }
}
