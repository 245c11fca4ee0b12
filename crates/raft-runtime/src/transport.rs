//! # transport
//!
//! why: the core only names a destination; something has to carry the message there
//! relations: executes raft-core's Send and Reply actions for runtime.rs
//! what: Transport trait, ChannelTransport (in-process delivery over tokio channels)

use raft_core::{Event, NodeId, RaftMessage};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Delivery of messages between nodes
///
/// delivery is best effort: loss, duplication and reordering are all
/// tolerated by the protocol, so implementations never report failure
pub trait Transport {
    /// deliver an outgoing request
    fn send(&self, from: NodeId, to: NodeId, message: RaftMessage);

    /// deliver the answer to a request `to` sent earlier
    fn reply(&self, from: NodeId, to: NodeId, message: RaftMessage) {
        self.send(from, to, message);
    }
}

/// In-process transport delivering straight into each node's inbox
///
/// register every node first, then hand a clone to each runtime
#[derive(Debug, Clone, Default)]
pub struct ChannelTransport {
    inboxes: BTreeMap<NodeId, mpsc::UnboundedSender<Event>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// add a node and return the inbox its runtime reads from
    ///
    /// registering an id again replaces its inbox
    pub fn register(&mut self, id: NodeId) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes.insert(id, tx);
        rx
    }

    /// stop delivering to `id`; messages to it are dropped from now on
    pub fn unregister(&mut self, id: NodeId) -> bool {
        self.inboxes.remove(&id).is_some()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.inboxes.contains_key(&id)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, from: NodeId, to: NodeId, message: RaftMessage) {
        let Some(inbox) = self.inboxes.get(&to) else {
            warn!(%from, %to, "no route to node, message dropped");
            return;
        };
        trace!(%from, %to, ?message, "deliver");
        if inbox.send(Event::Message { from, message }).is_err() {
            warn!(%from, %to, "inbox closed, message dropped");
        }
    }
}
