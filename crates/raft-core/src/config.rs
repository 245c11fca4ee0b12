//! # config
//!
//! why: keep the tunables and the cluster membership in one serializable place
//! relations: RaftConfig read by raft-runtime's election timer, ClusterConfig by node.rs
//! what: RaftConfig (election timeout range), ClusterConfig (known peer set)

use crate::error::{ConfigError, Result};
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;
use std::time::Duration;

/// Timing configuration for a raft node
///
/// each node draws its election timeout uniformly from
/// `[election_timeout_min_ms, election_timeout_max_ms)` on every reset,
/// so nodes do not keep timing out in lockstep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaftConfig {
    /// lower bound of the election timeout (inclusive)
    pub election_timeout_min_ms: u64,
    /// upper bound of the election timeout (exclusive)
    pub election_timeout_max_ms: u64,
}

impl Default for RaftConfig {
    fn default() -> Self {
        Self {
            election_timeout_min_ms: 150,
            election_timeout_max_ms: 300,
        }
    }
}

impl RaftConfig {
    /// check that the timeout range is non-empty and positive
    pub fn validate(&self) -> Result<()> {
        if self.election_timeout_min_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.election_timeout_min_ms >= self.election_timeout_max_ms {
            return Err(ConfigError::EmptyTimeoutRange {
                min_ms: self.election_timeout_min_ms,
                max_ms: self.election_timeout_max_ms,
            });
        }
        Ok(())
    }

    /// the range election timeouts are drawn from
    pub fn election_timeout_range(&self) -> Range<Duration> {
        Duration::from_millis(self.election_timeout_min_ms)
            ..Duration::from_millis(self.election_timeout_max_ms)
    }
}

/// The known cluster membership (static; membership changes are not handled)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub nodes: BTreeSet<NodeId>,
}

impl ClusterConfig {
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// number of members, the `n` in majority arithmetic
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// every member except `id`
    pub fn peers(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied().filter(move |&n| n != id)
    }

    /// check the cluster is usable by node `id`
    pub fn validate_member(&self, id: NodeId) -> Result<()> {
        if self.is_empty() {
            return Err(ConfigError::EmptyCluster);
        }
        if !self.contains(id) {
            return Err(ConfigError::NotAMember(id));
        }
        Ok(())
    }
}
