//! # state
//!
//! why: the fields a node carries across role transitions, split by lifetime
//! relations: PersistentState is what raft-storage saves; RoleState is switched by node.rs
//! what: PersistentState, VolatileState, per-role volatile state, RoleState, Role

use crate::{Log, NodeId, Term};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// State that must survive a crash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentState {
    /// latest term this node has seen, never decreases
    pub current_term: Term,
    /// candidate that received our vote in `current_term`
    pub voted_for: Option<NodeId>,
    pub log: Log,
}

impl PersistentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `term` if it is newer than the current one
    ///
    /// a vote belongs to the term it was cast in, so entering a newer term
    /// leaves the node without one. returns whether the term changed
    pub fn observe_term(&mut self, term: Term) -> bool {
        if term > self.current_term {
            self.current_term = term;
            self.voted_for = None;
            true
        } else {
            false
        }
    }
}

/// State rebuilt from zero on every process start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolatileState {
    /// number of log entries known to be committed (entries `[0, commit_index)`)
    pub commit_index: u64,
    /// number of committed entries already handed to the state machine
    pub last_applied: u64,
}

/// Replication bookkeeping, only meaningful while leader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderVolatileState {
    /// for each peer, index of the next entry to send
    pub next_index: BTreeMap<NodeId, u64>,
    /// for each peer, how much of the log is known to be replicated there
    pub match_index: BTreeMap<NodeId, u64>,
}

impl LeaderVolatileState {
    pub fn new(peers: impl IntoIterator<Item = NodeId>, log_len: u64) -> Self {
        let mut state = Self::default();
        for peer in peers {
            state.next_index.insert(peer, log_len);
            state.match_index.insert(peer, 0);
        }
        state
    }
}

/// Election bookkeeping, only meaningful while candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateVolatileState {
    pub votes_received: BTreeSet<NodeId>,
}

/// The current role together with the data only that role may hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RoleState {
    #[default]
    Follower,
    Candidate(CandidateVolatileState),
    Leader(LeaderVolatileState),
}

impl RoleState {
    pub fn role(&self) -> Role {
        match self {
            Self::Follower => Role::Follower,
            Self::Candidate(_) => Role::Candidate,
            Self::Leader(_) => Role::Leader,
        }
    }
}

/// The three possible roles a raft node can be in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Passive - votes when asked, accepts entries from a leader
    #[default]
    Follower,
    /// Requesting votes to become leader
    Candidate,
    /// Won an election for the current term
    Leader,
}

impl Role {
    pub const fn is_follower(self) -> bool {
        matches!(self, Self::Follower)
    }

    pub const fn is_candidate(self) -> bool {
        matches!(self, Self::Candidate)
    }

    pub const fn is_leader(self) -> bool {
        matches!(self, Self::Leader)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Follower => "follower",
            Self::Candidate => "candidate",
            Self::Leader => "leader",
        };
        f.write_str(name)
    }
}
