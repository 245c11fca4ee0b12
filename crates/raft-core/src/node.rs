//! # node
//!
//! why: the role state machine that routes every event to the handler valid for the current role
//! relations: composes vote.rs, append.rs and quorum.rs over state.rs; driven by raft-runtime
//! what: RaftNode, step (event in, next node plus actions out), role transitions

use crate::message::{AppendEntries, Event, RaftMessage, RequestVote, VoteReply};
use crate::state::{CandidateVolatileState, LeaderVolatileState, RoleState};
use crate::{
    append, quorum, vote, Action, ClusterConfig, Log, LogEntry, NodeId, PersistentState, Role,
    Term, VolatileState,
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// A single raft node in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaftNode {
    id: NodeId,
    cluster: ClusterConfig,
    persistent: PersistentState,
    volatile: VolatileState,
    role: RoleState,
}

impl RaftNode {
    /// Create a fresh node: follower, term 0, no vote, empty log
    pub fn new(id: NodeId, cluster: ClusterConfig) -> Self {
        Self::restore(id, cluster, PersistentState::new())
    }

    /// Rebuild a node from recovered persistent state
    ///
    /// volatile state starts from zero and the node always comes back as follower
    pub fn restore(id: NodeId, cluster: ClusterConfig, persistent: PersistentState) -> Self {
        Self {
            id,
            cluster,
            persistent,
            volatile: VolatileState::default(),
            role: RoleState::Follower,
        }
    }

    /// Process one event to completion
    ///
    /// consumes the node and returns its successor together with the actions
    /// the event requires, in execution order
    pub fn step(mut self, event: Event) -> (Self, Vec<Action>) {
        let mut actions = Vec::new();
        debug!(node = %self.id, role = %self.role(), term = %self.current_term(), ?event, "step");

        match self.role() {
            Role::Follower => self.step_follower(event, &mut actions),
            Role::Candidate => self.step_candidate(event, &mut actions),
            Role::Leader => {
                // leader replication is not part of this core
                debug!(node = %self.id, "leader ignores event");
            }
        }

        (self, actions)
    }

    fn step_follower(&mut self, event: Event, actions: &mut Vec<Action>) {
        match event {
            Event::Timeout => self.start_election(actions),
            Event::Message { from, message } => match message {
                RaftMessage::RequestVote(rpc) => self.handle_request_vote(from, &rpc, actions),
                RaftMessage::AppendEntries(rpc) => self.handle_append_entries(from, rpc, actions),
                RaftMessage::VoteReply(_) | RaftMessage::AppendReply(_) => {}
            },
        }
    }

    fn step_candidate(&mut self, event: Event, actions: &mut Vec<Action>) {
        match event {
            Event::Timeout => self.start_election(actions),
            Event::Message { from, message } => match message {
                RaftMessage::RequestVote(rpc) if rpc.candidate_id == self.id => {
                    self.handle_request_vote(from, &rpc, actions)
                }
                RaftMessage::VoteReply(VoteReply::Granted { term }) => {
                    self.count_vote(from, term, actions)
                }
                RaftMessage::AppendEntries(rpc) => {
                    self.become_follower();
                    self.handle_append_entries(from, rpc, actions);
                }
                RaftMessage::RequestVote(_)
                | RaftMessage::VoteReply(VoteReply::Denied { .. })
                | RaftMessage::AppendReply(_) => {}
            },
        }
    }

    fn handle_request_vote(&mut self, from: NodeId, rpc: &RequestVote, actions: &mut Vec<Action>) {
        let before = (self.persistent.current_term, self.persistent.voted_for);
        let state = std::mem::take(&mut self.persistent);
        let (state, reply) = vote::arbitrate(state, rpc, self.id);
        self.persistent = state;

        self.save_term_and_vote_if_changed(before, actions);
        if reply.is_granted() {
            debug!(node = %self.id, candidate = %rpc.candidate_id, term = %reply.term(), "vote granted");
            actions.push(Action::ResetElectionTimer);
        }
        actions.push(Action::Reply {
            to: from,
            message: reply.into(),
        });
    }

    fn handle_append_entries(&mut self, from: NodeId, rpc: AppendEntries, actions: &mut Vec<Action>) {
        if rpc.term >= self.persistent.current_term {
            actions.push(Action::ResetElectionTimer);
        }

        let before = (self.persistent.current_term, self.persistent.voted_for);
        let state = std::mem::take(&mut self.persistent);
        let (state, reply, change) =
            append::check_consistency(state, self.volatile.commit_index, rpc);
        self.persistent = state;

        self.save_term_and_vote_if_changed(before, actions);
        if let Some(from) = change.truncated_from {
            actions.push(Action::TruncateLog { from });
        }
        if !change.appended.is_empty() {
            actions.push(Action::AppendLog(change.appended));
        }
        actions.push(Action::Reply {
            to: from,
            message: reply.into(),
        });
    }

    fn save_term_and_vote_if_changed(
        &self,
        (term, voted_for): (Term, Option<NodeId>),
        actions: &mut Vec<Action>,
    ) {
        if term != self.persistent.current_term || voted_for != self.persistent.voted_for {
            if term != self.persistent.current_term {
                info!(node = %self.id, from = %term, to = %self.persistent.current_term, "term advanced");
            }
            actions.push(Action::SaveTermAndVote {
                term: self.persistent.current_term,
                voted_for: self.persistent.voted_for,
            });
        }
    }

    /// Follower/Candidate -> Candidate: new term, no vote, ask everyone
    ///
    /// at the last representable term no election can start; the node stays
    /// as it is rather than reuse a term it may already have voted in
    fn start_election(&mut self, actions: &mut Vec<Action>) {
        let Some(term) = self.persistent.current_term.next() else {
            warn!(node = %self.id, term = %self.persistent.current_term, "term space exhausted, not starting election");
            return;
        };
        self.persistent.current_term = term;
        self.persistent.voted_for = None;
        self.role = RoleState::Candidate(CandidateVolatileState::default());
        info!(node = %self.id, term = %self.persistent.current_term, "starting election");

        actions.push(Action::SaveTermAndVote {
            term: self.persistent.current_term,
            voted_for: None,
        });
        let request = self.vote_request();
        for to in self.cluster.nodes.iter().copied() {
            actions.push(Action::Send {
                to,
                message: request.clone().into(),
            });
        }
        actions.push(Action::ResetElectionTimer);
    }

    fn count_vote(&mut self, from: NodeId, term: Term, actions: &mut Vec<Action>) {
        if term != self.persistent.current_term {
            debug!(node = %self.id, voter = %from, %term, "stale vote ignored");
            return;
        }
        let cluster_size = self.cluster.len();
        let RoleState::Candidate(candidate) = &mut self.role else {
            return;
        };
        if candidate.votes_received.contains(&from) {
            return;
        }
        if quorum::has_majority(candidate.votes_received.len(), cluster_size) {
            self.become_leader();
            actions.push(Action::CancelElectionTimer);
        } else {
            candidate.votes_received.insert(from);
            debug!(node = %self.id, voter = %from, votes = candidate.votes_received.len(), "vote counted");
        }
    }

    fn become_leader(&mut self) {
        let leader = LeaderVolatileState::new(self.cluster.peers(self.id), self.persistent.log.len());
        self.role = RoleState::Leader(leader);
        info!(node = %self.id, term = %self.persistent.current_term, "became leader");
    }

    fn become_follower(&mut self) {
        self.role = RoleState::Follower;
        info!(node = %self.id, term = %self.persistent.current_term, "stepping down to follower");
    }

    /// The RequestVote this node broadcasts for its current term
    pub fn vote_request(&self) -> RequestVote {
        RequestVote {
            term: self.persistent.current_term,
            candidate_id: self.id,
            last_log_index: self.persistent.log.last_index(),
            last_log_term: self.persistent.log.last_term(),
        }
    }

    /// Record that the first `commit_index` entries are committed
    ///
    /// extension point for a commit layer; never moves backwards and is
    /// capped at the log length. returns whether the index advanced
    pub fn advance_commit_index(&mut self, commit_index: u64) -> bool {
        let commit_index = commit_index.min(self.persistent.log.len());
        if commit_index > self.volatile.commit_index {
            self.volatile.commit_index = commit_index;
            true
        } else {
            false
        }
    }

    /// Committed entries not yet handed out, advancing `last_applied` past them
    pub fn take_entries_to_apply(&mut self) -> Vec<LogEntry> {
        let entries = self
            .persistent
            .log
            .slice(self.volatile.last_applied, self.volatile.commit_index)
            .to_vec();
        self.volatile.last_applied = self.volatile.commit_index;
        entries
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role.role()
    }

    pub fn role_state(&self) -> &RoleState {
        &self.role
    }

    pub fn current_term(&self) -> Term {
        self.persistent.current_term
    }

    pub fn voted_for(&self) -> Option<NodeId> {
        self.persistent.voted_for
    }

    pub fn log(&self) -> &Log {
        &self.persistent.log
    }

    pub fn persistent(&self) -> &PersistentState {
        &self.persistent
    }

    pub fn volatile(&self) -> VolatileState {
        self.volatile
    }

    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    /// votes counted so far, only while candidate
    pub fn votes_received(&self) -> Option<&BTreeSet<NodeId>> {
        match &self.role {
            RoleState::Candidate(c) => Some(&c.votes_received),
            _ => None,
        }
    }

    /// replication bookkeeping, only while leader
    pub fn leader_state(&self) -> Option<&LeaderVolatileState> {
        match &self.role {
            RoleState::Leader(l) => Some(l),
            _ => None,
        }
    }
}
