//! # runtime
//!
//! why: a raft node must see one event at a time, and must never answer before its state is durable
//! relations: steps raft-core's RaftNode; executes its actions via raft-storage, transport.rs, timer.rs
//! what: NodeRuntime (serial event loop), NodeStatus

use crate::config::NodeConfig;
use crate::error::Result;
use crate::timer::{ElectionTimer, TimerFired};
use crate::transport::Transport;
use raft_core::{Action, Event, NodeId, RaftNode, Role, Term};
use raft_storage::Storage;
use serde::Serialize;
use std::future::Future;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Snapshot of a node published after every handled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub id: NodeId,
    pub role: Role,
    pub term: Term,
    pub voted_for: Option<NodeId>,
    pub log_len: u64,
}

impl NodeStatus {
    fn of(node: &RaftNode) -> Self {
        Self {
            id: node.id(),
            role: node.role(),
            term: node.current_term(),
            voted_for: node.voted_for(),
            log_len: node.log().len(),
        }
    }
}

/// The side effects a step can request, in one place
struct Effects<S, T> {
    id: NodeId,
    storage: S,
    transport: T,
    timer: ElectionTimer,
}

impl<S: Storage, T: Transport> Effects<S, T> {
    /// carry out actions in order; a storage failure stops before anything later is sent
    fn execute(&mut self, actions: Vec<Action>) -> Result<()> {
        for action in actions {
            match action {
                Action::ResetElectionTimer => self.timer.reset(),
                Action::CancelElectionTimer => self.timer.cancel(),
                Action::Send { to, message } => self.transport.send(self.id, to, message),
                Action::Reply { to, message } => self.transport.reply(self.id, to, message),
                persist => {
                    if let Err(e) = self.storage.apply(&persist) {
                        error!(node = %self.id, error = %e, "persisting state failed, stopping node");
                        return Err(e.into());
                    }
                }
            }
        }
        Ok(())
    }
}

enum Input {
    Shutdown,
    Closed,
    Event(Event),
    Timer(TimerFired),
}

/// One running raft node
///
/// inbound messages arrive on the inbox, timer firings on a private channel;
/// both feed the same loop, so the node never sees two events at once
pub struct NodeRuntime<S, T> {
    node: RaftNode,
    effects: Effects<S, T>,
    inbox: mpsc::UnboundedReceiver<Event>,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    status: watch::Sender<NodeStatus>,
}

impl<S: Storage, T: Transport> NodeRuntime<S, T> {
    /// Recover the node's persistent state from `storage` and prepare it to run
    ///
    /// the node always restarts as a follower
    pub fn new(
        config: &NodeConfig,
        storage: S,
        transport: T,
        inbox: mpsc::UnboundedReceiver<Event>,
    ) -> Result<Self> {
        config.validate()?;

        let persistent = storage.load_state()?;
        info!(
            node = %config.id,
            term = %persistent.current_term,
            voted_for = ?persistent.voted_for,
            log_len = persistent.log.len(),
            "recovered persistent state"
        );
        let node = RaftNode::restore(config.id, config.cluster.clone(), persistent);
        let (timer, timer_rx) = ElectionTimer::new(&config.raft);
        let (status, _) = watch::channel(NodeStatus::of(&node));

        Ok(Self {
            node,
            effects: Effects {
                id: config.id,
                storage,
                transport,
                timer,
            },
            inbox,
            timer_rx,
            status,
        })
    }

    pub fn node(&self) -> &RaftNode {
        &self.node
    }

    /// watch the node's status as it changes
    pub fn subscribe(&self) -> watch::Receiver<NodeStatus> {
        self.status.subscribe()
    }

    /// Run until `shutdown` completes or the inbox closes, returning the final node
    ///
    /// a storage failure ends the loop with an error
    pub async fn run_until<F>(self, shutdown: F) -> Result<RaftNode>
    where
        F: Future<Output = ()>,
    {
        let NodeRuntime {
            mut node,
            mut effects,
            mut inbox,
            mut timer_rx,
            status,
        } = self;
        tokio::pin!(shutdown);

        effects.timer.reset();
        info!(node = %node.id(), "node started");

        loop {
            let input = tokio::select! {
                _ = &mut shutdown => Input::Shutdown,
                event = inbox.recv() => event.map_or(Input::Closed, Input::Event),
                Some(fired) = timer_rx.recv() => Input::Timer(fired),
            };

            let event = match input {
                Input::Shutdown => {
                    info!(node = %node.id(), "shutting down");
                    break;
                }
                Input::Closed => {
                    info!(node = %node.id(), "inbox closed, stopping");
                    break;
                }
                Input::Event(event) => event,
                Input::Timer(fired) => {
                    if !effects.timer.fire(fired) {
                        continue;
                    }
                    debug!(node = %node.id(), "election timeout");
                    Event::Timeout
                }
            };

            let (next, actions) = node.step(event);
            node = next;
            effects.execute(actions)?;
            status.send_replace(NodeStatus::of(&node));
        }

        effects.timer.cancel();
        Ok(node)
    }
}

impl<S, T> NodeRuntime<S, T>
where
    S: Storage + Send + 'static,
    T: Transport + Send + 'static,
{
    /// run the node on its own tokio task
    pub fn spawn<F>(self, shutdown: F) -> JoinHandle<Result<RaftNode>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run_until(shutdown))
    }
}
