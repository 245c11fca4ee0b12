//! # raft-runtime
//!
//! why: give the pure raft-core state machine the clock, network and disk it needs to run
//! relations: drives raft-core's RaftNode, persists through raft-storage
//! what: election timer, transport, serial event loop, node configuration, tracing setup
//!
//! each node runs one [`NodeRuntime`] task. inbound messages and timer
//! firings are merged into a single serial stream and every event is handled
//! to completion before the next one is read

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod timer;
pub mod transport;

pub use config::{load_config, open_storage, NodeConfig};
pub use error::{Result, RuntimeError};
pub use logging::init_tracing;
pub use runtime::{NodeRuntime, NodeStatus};
pub use timer::{ElectionTimer, TimerFired};
pub use transport::{ChannelTransport, Transport};
