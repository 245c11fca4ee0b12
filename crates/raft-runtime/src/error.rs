//! # error
//!
//! why: one error type for everything that can stop a running node
//! relations: wraps raft-core config errors and raft-storage errors
//! what: RuntimeError, Result

use raft_core::ConfigError;
use raft_storage::StorageError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
