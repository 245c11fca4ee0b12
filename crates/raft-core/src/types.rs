//! # types
//!
//! why: give terms and node identities their own types instead of bare integers
//! relations: used by every other module in raft-core, serialized by raft-storage
//! what: Term, NodeId

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical clock partitioning time into at most one leader's tenure each
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Term(u64);

impl Term {
    /// The term every node starts in
    pub const ZERO: Self = Self(0);

    pub const fn new(t: u64) -> Self {
        Self(t)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The term a new election runs in, or `None` once terms are exhausted
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl From<u64> for Term {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle identifying a cluster member
///
/// mapping names or addresses to ids is the transport's job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
