//! # error
//!
//! why: name the few local failures the core can hit; protocol outcomes are replies, not errors
//! relations: ConfigError returned by config.rs, LogError by log.rs
//! what: ConfigError, LogError, Result alias

use thiserror::Error;

/// Invalid node or timer configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("election timeout range is empty: min {min_ms}ms >= max {max_ms}ms")]
    EmptyTimeoutRange { min_ms: u64, max_ms: u64 },

    #[error("election timeout must be positive")]
    ZeroTimeout,

    #[error("cluster has no members")]
    EmptyCluster,

    #[error("node {0} is not a member of its own cluster")]
    NotAMember(crate::NodeId),
}

/// Rejected log mutation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    /// the rewrite would drop or replace an entry below the commit boundary
    #[error("rewrite at index {index} would discard committed entries (committed length {committed})")]
    CommittedTruncation { index: u64, committed: u64 },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
