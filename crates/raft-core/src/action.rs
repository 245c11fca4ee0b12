//! # action
//!
//! why: the core does no I/O itself; it describes the I/O an event requires
//! relations: produced by node.rs, executed in order by raft-runtime
//! what: Action

use crate::{LogEntry, NodeId, RaftMessage, Term};

/// A pending side effect requested by a [`crate::RaftNode`] step
///
/// actions must be executed in the order they were returned; persistence
/// actions always precede the reply they guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// cancel any pending election timeout and schedule a new one
    ResetElectionTimer,
    /// cancel the pending election timeout without scheduling another
    CancelElectionTimer,
    /// durably store term and vote
    SaveTermAndVote {
        term: Term,
        voted_for: Option<NodeId>,
    },
    /// durably drop log entries at and after `from`
    TruncateLog { from: u64 },
    /// durably append entries at the end of the log
    AppendLog(Vec<LogEntry>),
    /// deliver an outgoing request to a peer
    Send { to: NodeId, message: RaftMessage },
    /// answer the sender of a request
    Reply { to: NodeId, message: RaftMessage },
}
