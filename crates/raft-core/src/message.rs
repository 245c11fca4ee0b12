//! # message
//!
//! why: define all raft rpc message types for node communication
//! relations: consumed and produced by node.rs, carried by raft-runtime's transport
//! what: RequestVote, VoteReply, AppendEntries, AppendReply, RaftMessage envelope, Event

use crate::{LogEntry, NodeId, Term};
use serde::{Deserialize, Serialize};

/// Request a vote during leader election
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVote {
    pub term: Term,
    pub candidate_id: NodeId,
    /// index of the candidate's last entry, `None` for an empty log
    pub last_log_index: Option<u64>,
    pub last_log_term: Term,
}

/// Answer to a RequestVote, carrying the voter's resulting term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteReply {
    Granted { term: Term },
    Denied { term: Term },
}

impl VoteReply {
    pub fn term(&self) -> Term {
        match *self {
            Self::Granted { term } | Self::Denied { term } => term,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Replicate log entries (also serves as heartbeat when entries is empty)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntries {
    pub term: Term,
    pub leader_id: NodeId,
    /// index of the entry preceding `entries`, `None` to start at the head of the log
    pub prev_log_index: Option<u64>,
    pub prev_log_term: Term,
    pub entries: Vec<LogEntry>,
    pub leader_commit: u64,
}

/// Answer to an AppendEntries, carrying the follower's resulting term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AppendReply {
    Success { term: Term },
    Failure { term: Term },
}

impl AppendReply {
    pub fn term(&self) -> Term {
        match *self {
            Self::Success { term } | Self::Failure { term } => term,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// All possible raft messages between nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaftMessage {
    RequestVote(RequestVote),
    VoteReply(VoteReply),
    AppendEntries(AppendEntries),
    AppendReply(AppendReply),
}

impl RaftMessage {
    pub fn term(&self) -> Term {
        match self {
            Self::RequestVote(m) => m.term,
            Self::VoteReply(m) => m.term(),
            Self::AppendEntries(m) => m.term,
            Self::AppendReply(m) => m.term(),
        }
    }
}

impl From<RequestVote> for RaftMessage {
    fn from(m: RequestVote) -> Self {
        Self::RequestVote(m)
    }
}

impl From<VoteReply> for RaftMessage {
    fn from(m: VoteReply) -> Self {
        Self::VoteReply(m)
    }
}

impl From<AppendEntries> for RaftMessage {
    fn from(m: AppendEntries) -> Self {
        Self::AppendEntries(m)
    }
}

impl From<AppendReply> for RaftMessage {
    fn from(m: AppendReply) -> Self {
        Self::AppendReply(m)
    }
}

/// One unit of input to the node's serial event stream
///
/// `from` is the reply address for requests, so a reply never depends on
/// tracking who sent what
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Message { from: NodeId, message: RaftMessage },
    /// the election timer fired
    Timeout,
}

impl Event {
    pub fn message(from: NodeId, message: impl Into<RaftMessage>) -> Self {
        Self::Message {
            from,
            message: message.into(),
        }
    }
}
