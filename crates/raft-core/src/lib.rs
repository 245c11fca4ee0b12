//! # raft-core
//!
//! why: implement the raft consensus core as a pure, portable state machine with no i/o
//! relations: driven by raft-runtime (timer, transport, event loop), persisted via raft-storage
//! what: log, node state, vote arbitration, log consistency check, majority arithmetic, role fsm
//!
//! a node consumes one [`Event`] at a time through [`RaftNode::step`], which
//! returns the next node and the [`Action`]s (persist, send, reply, timer) the
//! caller must carry out in order

pub mod action;
pub mod append;
pub mod config;
pub mod error;
pub mod log;
pub mod message;
pub mod node;
pub mod quorum;
pub mod state;
pub mod types;
pub mod vote;

pub use action::Action;
pub use config::{ClusterConfig, RaftConfig};
pub use error::{ConfigError, LogError};
pub use log::{Log, LogChange, LogEntry};
pub use message::{AppendEntries, AppendReply, Event, RaftMessage, RequestVote, VoteReply};
pub use node::RaftNode;
pub use state::{
    CandidateVolatileState, LeaderVolatileState, PersistentState, Role, RoleState, VolatileState,
};
pub use types::{NodeId, Term};
