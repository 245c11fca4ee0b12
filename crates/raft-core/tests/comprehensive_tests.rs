//! # comprehensive raft-core tests
//!
//! why: verify the election and replication rules of the consensus core
//! relations: tests raft-core through its public step api only
//! what: initialization, vote arbitration, consistency check, elections, scenarios, invariants

use raft_core::{
    quorum, Action, AppendEntries, AppendReply, ClusterConfig, Event, LogEntry, NodeId,
    PersistentState, RaftMessage, RaftNode, RequestVote, Role, Term, VoteReply,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};

const X: NodeId = NodeId::new(1);
const Y: NodeId = NodeId::new(2);
const Z: NodeId = NodeId::new(3);

fn cluster(ids: &[u64]) -> ClusterConfig {
    ClusterConfig::new(ids.iter().copied().map(NodeId::new))
}

fn three_nodes(id: NodeId) -> RaftNode {
    RaftNode::new(id, cluster(&[1, 2, 3]))
}

fn follower_with(id: NodeId, term: u64, log_terms: &[u64]) -> RaftNode {
    let persistent = PersistentState {
        current_term: Term::new(term),
        voted_for: None,
        log: log_terms.iter().map(|&t| LogEntry::new(t, vec![])).collect(),
    };
    RaftNode::restore(id, cluster(&[1, 2, 3]), persistent)
}

fn vote_request(term: u64, candidate: NodeId, last_log_index: Option<u64>, last_log_term: u64) -> RequestVote {
    RequestVote {
        term: Term::new(term),
        candidate_id: candidate,
        last_log_index,
        last_log_term: Term::new(last_log_term),
    }
}

fn append(term: u64, prev_log_index: Option<u64>, prev_log_term: u64, entries: Vec<LogEntry>) -> AppendEntries {
    AppendEntries {
        term: Term::new(term),
        leader_id: Y,
        prev_log_index,
        prev_log_term: Term::new(prev_log_term),
        entries,
        leader_commit: 0,
    }
}

fn granted(term: u64) -> VoteReply {
    VoteReply::Granted { term: Term::new(term) }
}

/// the single reply in `actions`
fn reply_of(actions: &[Action]) -> (NodeId, RaftMessage) {
    let replies: Vec<_> = actions
        .iter()
        .filter_map(|a| match a {
            Action::Reply { to, message } => Some((*to, message.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(replies.len(), 1, "expected exactly one reply in {actions:?}");
    replies.into_iter().next().unwrap()
}

fn vote_reply_of(actions: &[Action]) -> VoteReply {
    match reply_of(actions).1 {
        RaftMessage::VoteReply(reply) => reply,
        other => panic!("expected VoteReply, got {other:?}"),
    }
}

fn append_reply_of(actions: &[Action]) -> AppendReply {
    match reply_of(actions).1 {
        RaftMessage::AppendReply(reply) => reply,
        other => panic!("expected AppendReply, got {other:?}"),
    }
}

fn candidate(id: NodeId) -> RaftNode {
    let (node, _) = three_nodes(id).step(Event::Timeout);
    assert_eq!(node.role(), Role::Candidate);
    node
}

// =============================================================================
// SECTION 1: INITIALIZATION TESTS
// =============================================================================

mod initialization {
    use super::*;

    #[test]
    fn new_node_starts_as_follower() {
        let node = three_nodes(X);
        assert_eq!(node.role(), Role::Follower);
        assert_eq!(node.current_term(), Term::ZERO);
        assert_eq!(node.voted_for(), None);
        assert!(node.log().is_empty());
        assert_eq!(node.volatile().commit_index, 0);
        assert_eq!(node.volatile().last_applied, 0);
        assert!(node.votes_received().is_none());
        assert!(node.leader_state().is_none());
    }

    #[test]
    fn node_knows_cluster_membership() {
        let node = three_nodes(X);
        assert_eq!(node.id(), X);
        assert_eq!(node.cluster().len(), 3);
    }

    #[test]
    fn restored_node_keeps_persistent_state() {
        let node = follower_with(X, 7, &[1, 7]);
        assert_eq!(node.role(), Role::Follower);
        assert_eq!(node.current_term(), Term::new(7));
        assert_eq!(node.log().len(), 2);
    }
}

// =============================================================================
// SECTION 2: QUORUM CALCULATION TESTS
// =============================================================================

mod majority {
    use super::*;

    #[test]
    fn boundary_at_one_node() {
        assert!(quorum::has_majority(0, 1));
    }

    #[test]
    fn boundary_at_four_nodes() {
        assert!(quorum::has_majority(1, 4));
        assert!(!quorum::has_majority(0, 4));
    }

    #[test]
    fn matches_ceiling_formula() {
        for n in 1..=9usize {
            for votes in 0..=n {
                assert_eq!(quorum::has_majority(votes, n), votes + 1 >= n.div_ceil(2));
            }
        }
    }
}

// =============================================================================
// SECTION 3: VOTE REQUEST HANDLING TESTS
// =============================================================================

mod vote_requests {
    use super::*;

    #[test]
    fn late_own_request_does_not_override_vote() {
        let node = follower_with(X, 3, &[]);
        let (node, _) = node.step(Event::message(Y, vote_request(3, Y, None, 0)));
        assert_eq!(node.voted_for(), Some(Y));

        // reordered delivery: our own requests from this term and an older one
        let (node, actions) = node.step(Event::message(X, vote_request(3, X, None, 0)));
        assert_eq!(vote_reply_of(&actions), VoteReply::Denied { term: Term::new(3) });
        let (node, actions) = node.step(Event::message(X, vote_request(1, X, None, 0)));
        assert_eq!(vote_reply_of(&actions), VoteReply::Denied { term: Term::new(3) });

        assert_eq!(node.voted_for(), Some(Y));
        assert_eq!(node.current_term(), Term::new(3));
    }

    #[test]
    fn grant_vote_to_valid_candidate() {
        let node = three_nodes(X);
        let (node, actions) = node.step(Event::message(Y, vote_request(1, Y, None, 0)));

        assert_eq!(vote_reply_of(&actions), granted(1));
        assert_eq!(reply_of(&actions).0, Y);
        assert!(actions.contains(&Action::ResetElectionTimer));
        assert_eq!(node.voted_for(), Some(Y));
        assert_eq!(node.role(), Role::Follower);
    }

    #[test]
    fn grant_is_persisted_before_reply() {
        let (_, actions) = three_nodes(X).step(Event::message(Y, vote_request(1, Y, None, 0)));

        let save = actions
            .iter()
            .position(|a| matches!(a, Action::SaveTermAndVote { .. }))
            .unwrap();
        let reply = actions
            .iter()
            .position(|a| matches!(a, Action::Reply { .. }))
            .unwrap();
        assert!(save < reply);
        assert_eq!(
            actions[save],
            Action::SaveTermAndVote {
                term: Term::new(1),
                voted_for: Some(Y)
            }
        );
    }

    #[test]
    fn second_request_in_same_term_is_denied() {
        let (node, _) = three_nodes(X).step(Event::message(Y, vote_request(1, Y, None, 0)));
        let (node, actions) = node.step(Event::message(Z, vote_request(1, Z, Some(9), 1)));

        assert_eq!(vote_reply_of(&actions), VoteReply::Denied { term: Term::new(1) });
        assert!(!actions.contains(&Action::ResetElectionTimer));
        assert_eq!(node.voted_for(), Some(Y));
    }

    #[test]
    fn repeated_request_from_same_candidate_is_denied() {
        let (node, _) = three_nodes(X).step(Event::message(Y, vote_request(1, Y, None, 0)));
        let (node, actions) = node.step(Event::message(Y, vote_request(1, Y, None, 0)));

        assert!(!vote_reply_of(&actions).is_granted());
        assert_eq!(node.voted_for(), Some(Y));
    }

    #[test]
    fn higher_term_request_grants_a_new_vote() {
        let (node, _) = three_nodes(X).step(Event::message(Y, vote_request(1, Y, None, 0)));
        let (node, actions) = node.step(Event::message(Z, vote_request(2, Z, None, 0)));

        assert_eq!(vote_reply_of(&actions), granted(2));
        assert_eq!(node.current_term(), Term::new(2));
        assert_eq!(node.voted_for(), Some(Z));
    }

    #[test]
    fn reject_candidate_with_stale_log_lower_term() {
        let node = follower_with(X, 5, &[5]);
        let (node, actions) = node.step(Event::message(Y, vote_request(5, Y, Some(0), 3)));

        assert!(!vote_reply_of(&actions).is_granted());
        assert_eq!(node.voted_for(), None);
    }

    #[test]
    fn reject_candidate_with_shorter_log_same_term() {
        let node = follower_with(X, 1, &[1, 1]);
        let (_, actions) = node.step(Event::message(Y, vote_request(1, Y, Some(0), 1)));
        assert!(!vote_reply_of(&actions).is_granted());
    }

    #[test]
    fn grant_vote_to_candidate_with_longer_log() {
        let node = follower_with(X, 1, &[1]);
        let (_, actions) = node.step(Event::message(Y, vote_request(1, Y, Some(1), 1)));
        assert!(vote_reply_of(&actions).is_granted());
    }

    #[test]
    fn grant_vote_to_candidate_with_higher_term_log() {
        let node = follower_with(X, 2, &[1, 1, 1]);
        let (_, actions) = node.step(Event::message(Y, vote_request(2, Y, Some(0), 2)));
        assert!(vote_reply_of(&actions).is_granted());
    }

    #[test]
    fn deny_updates_term_but_not_vote() {
        let node = follower_with(X, 3, &[]);
        let (node, actions) = node.step(Event::message(Y, vote_request(1, Y, None, 0)));

        assert_eq!(vote_reply_of(&actions), VoteReply::Denied { term: Term::new(3) });
        assert_eq!(node.current_term(), Term::new(3));
        assert_eq!(node.voted_for(), None);
        assert!(!actions.iter().any(|a| matches!(
            a,
            Action::SaveTermAndVote { .. } | Action::TruncateLog { .. } | Action::AppendLog(_)
        )));
    }
}

// =============================================================================
// SECTION 4: APPEND ENTRIES HANDLING TESTS
// =============================================================================

mod append_entries_handling {
    use super::*;

    #[test]
    fn reject_append_entries_with_lower_term() {
        let node = follower_with(X, 5, &[]);
        let (node, actions) = node.step(Event::message(Y, append(3, None, 0, vec![])));

        assert_eq!(append_reply_of(&actions), AppendReply::Failure { term: Term::new(5) });
        assert!(!actions.contains(&Action::ResetElectionTimer));
        assert_eq!(node.current_term(), Term::new(5));
    }

    #[test]
    fn accept_heartbeat_from_valid_leader() {
        let (node, actions) = three_nodes(X).step(Event::message(Y, append(1, None, 0, vec![])));

        assert_eq!(append_reply_of(&actions), AppendReply::Success { term: Term::new(1) });
        assert!(actions.contains(&Action::ResetElectionTimer));
        assert_eq!(node.current_term(), Term::new(1));
    }

    #[test]
    fn append_entries_adds_new_entries() {
        let entries = vec![
            LogEntry::new(1, b"cmd1".to_vec()),
            LogEntry::new(1, b"cmd2".to_vec()),
        ];
        let (node, actions) = three_nodes(X).step(Event::message(Y, append(1, None, 0, entries.clone())));

        assert_eq!(node.log().as_slice(), entries.as_slice());
        assert!(actions.contains(&Action::AppendLog(entries)));
    }

    #[test]
    fn append_entries_truncates_conflicting_entries() {
        let node = follower_with(X, 1, &[1, 1]);
        let entries = vec![LogEntry::new(2, b"new2".to_vec())];

        let (node, actions) = node.step(Event::message(Y, append(2, Some(0), 1, entries)));

        assert_eq!(node.log().len(), 2);
        assert_eq!(node.log().term_at(1), Some(Term::new(2)));
        assert_eq!(node.log().get(1).unwrap().command, b"new2".to_vec());
        assert!(actions.contains(&Action::TruncateLog { from: 1 }));
    }

    #[test]
    fn reject_append_entries_with_inconsistent_log() {
        let node = follower_with(X, 1, &[1]);
        let (node, actions) = node.step(Event::message(Y, append(1, Some(0), 99, vec![])));

        assert!(!append_reply_of(&actions).is_success());
        assert_eq!(node.log().len(), 1);
        assert!(actions.contains(&Action::ResetElectionTimer));
    }

    #[test]
    fn leader_commit_does_not_move_commit_index() {
        let mut rpc = append(1, None, 0, vec![LogEntry::new(1, vec![])]);
        rpc.leader_commit = 1;

        let (node, _) = three_nodes(X).step(Event::message(Y, rpc));

        assert_eq!(node.volatile().commit_index, 0);
        assert_eq!(node.volatile().last_applied, 0);
    }

    #[test]
    fn committed_entries_survive_a_conflicting_append() {
        let mut node = follower_with(X, 1, &[1, 1, 1]);
        node.advance_commit_index(2);
        let before = node.log().clone();

        let (node, actions) = node.step(Event::message(Y, append(2, Some(0), 1, vec![LogEntry::new(2, vec![])])));

        assert_eq!(append_reply_of(&actions), AppendReply::Failure { term: Term::new(2) });
        assert_eq!(node.log(), &before);
        assert!(!actions.iter().any(|a| matches!(a, Action::TruncateLog { .. } | Action::AppendLog(_))));
    }

    #[test]
    fn candidate_steps_down_on_append_entries() {
        let node = candidate(X);
        let (node, actions) = node.step(Event::message(Y, append(1, None, 0, vec![])));

        assert_eq!(node.role(), Role::Follower);
        assert!(node.votes_received().is_none());
        assert!(append_reply_of(&actions).is_success());
    }
}

// =============================================================================
// SECTION 5: ELECTION TESTS
// =============================================================================

mod election {
    use super::*;

    #[test]
    fn timeout_starts_election() {
        let (node, actions) = three_nodes(X).step(Event::Timeout);

        assert_eq!(node.role(), Role::Candidate);
        assert_eq!(node.current_term(), Term::new(1));
        assert_eq!(node.voted_for(), None);
        assert_eq!(node.votes_received().map(|v| v.len()), Some(0));
        assert!(actions.contains(&Action::ResetElectionTimer));
    }

    #[test]
    fn vote_request_includes_log_info() {
        let node = follower_with(X, 2, &[1, 2]);
        let (_, actions) = node.step(Event::Timeout);

        let expected = RaftMessage::RequestVote(vote_request(3, X, Some(1), 2));
        assert!(actions.contains(&Action::Send { to: Y, message: expected }));
    }

    #[test]
    fn candidate_timeout_starts_new_term() {
        let (node, _) = candidate(X).step(Event::Timeout);
        assert_eq!(node.role(), Role::Candidate);
        assert_eq!(node.current_term(), Term::new(2));
    }

    #[test]
    fn candidate_grants_own_request() {
        let node = candidate(X);
        let request = node.vote_request();
        let (node, actions) = node.step(Event::message(X, request));

        assert_eq!(vote_reply_of(&actions), granted(1));
        assert_eq!(reply_of(&actions).0, X);
        assert_eq!(node.voted_for(), Some(X));
        assert_eq!(node.role(), Role::Candidate);
    }

    #[test]
    fn candidate_ignores_other_candidates() {
        let node = candidate(X);
        let before = node.clone();
        let (node, actions) = node.step(Event::message(Y, vote_request(5, Y, None, 0)));

        assert!(actions.is_empty());
        assert_eq!(node, before);
    }

    #[test]
    fn first_grant_is_counted() {
        let (node, actions) = candidate(X).step(Event::message(Y, granted(1)));

        assert!(actions.is_empty());
        assert_eq!(node.role(), Role::Candidate);
        assert!(node.votes_received().unwrap().contains(&Y));
    }

    #[test]
    fn denied_votes_are_ignored() {
        let node = candidate(X);
        let before = node.clone();
        let (node, _) = node.step(Event::message(Y, VoteReply::Denied { term: Term::new(7) }));
        assert_eq!(node, before);
    }

    #[test]
    fn stale_grants_are_ignored() {
        let (node, _) = candidate(X).step(Event::Timeout); // term 2
        let (node, _) = node.step(Event::message(Y, granted(1)));
        let (node, _) = node.step(Event::message(Z, granted(1)));

        assert_eq!(node.role(), Role::Candidate);
        assert!(node.votes_received().unwrap().is_empty());
    }

    #[test]
    fn duplicate_grants_count_once() {
        let node = RaftNode::new(X, cluster(&[1, 2, 3, 4, 5]));
        let (node, _) = node.step(Event::Timeout);
        let (node, _) = node.step(Event::message(Y, granted(1)));
        let (node, _) = node.step(Event::message(Y, granted(1)));
        let (node, _) = node.step(Event::message(Y, granted(1)));

        assert_eq!(node.role(), Role::Candidate);
        assert_eq!(node.votes_received().unwrap().len(), 1);
    }

    #[test]
    fn single_node_cluster_wins_on_own_vote() {
        let node = RaftNode::new(X, cluster(&[1]));
        let (node, actions) = node.step(Event::Timeout);
        let (node, actions) = node.step(Event::message(X, match &actions[1] {
            Action::Send { message: RaftMessage::RequestVote(rpc), .. } => rpc.clone(),
            other => panic!("expected RequestVote, got {other:?}"),
        }));
        let (to, reply) = reply_of(&actions);
        let (node, _) = node.step(Event::message(to, reply));

        assert_eq!(node.role(), Role::Leader);
        assert!(node.leader_state().unwrap().next_index.is_empty());
    }

    #[test]
    fn votes_are_discarded_on_win() {
        let (node, _) = candidate(X).step(Event::message(Y, granted(1)));
        let (node, actions) = node.step(Event::message(Z, granted(1)));

        assert_eq!(node.role(), Role::Leader);
        assert!(node.votes_received().is_none());
        assert_eq!(actions, vec![Action::CancelElectionTimer]);
    }
}

// =============================================================================
// SECTION 6: LEADER ROLE
// =============================================================================

mod leader_state {
    use super::*;

    fn leader() -> RaftNode {
        let (node, _) = candidate(X).step(Event::message(Y, granted(1)));
        let (node, _) = node.step(Event::message(Z, granted(1)));
        assert_eq!(node.role(), Role::Leader);
        node
    }

    #[test]
    fn become_leader_initializes_indices() {
        let persistent = PersistentState {
            log: vec![LogEntry::new(1, vec![]), LogEntry::new(1, vec![])].into(),
            ..PersistentState::new()
        };
        let node = RaftNode::restore(X, cluster(&[1, 2, 3]), persistent);
        let (node, _) = node.step(Event::Timeout);
        let (node, _) = node.step(Event::message(Y, granted(1)));
        let (node, _) = node.step(Event::message(Z, granted(1)));

        let leader = node.leader_state().unwrap();
        assert_eq!(leader.next_index, BTreeMap::from([(Y, 2), (Z, 2)]));
        assert_eq!(leader.match_index, BTreeMap::from([(Y, 0), (Z, 0)]));
    }

    #[test]
    fn leader_ignores_every_event() {
        let node = leader();
        let events = vec![
            Event::Timeout,
            Event::message(Y, vote_request(9, Y, None, 0)),
            Event::message(Y, append(9, None, 0, vec![])),
            Event::message(Y, granted(1)),
            Event::message(Y, AppendReply::Success { term: Term::new(1) }),
        ];
        for event in events {
            let before = node.clone();
            let (after, actions) = node.clone().step(event);
            assert!(actions.is_empty());
            assert_eq!(after, before);
        }
    }
}

// =============================================================================
// SECTION 7: SCENARIOS
// =============================================================================

mod scenarios {
    use super::*;

    /// routes every send and reply between in-memory nodes until quiet
    struct Network {
        nodes: BTreeMap<NodeId, RaftNode>,
        queue: VecDeque<(NodeId, NodeId, RaftMessage)>,
    }

    impl Network {
        fn new(ids: &[u64]) -> Self {
            let nodes = ids
                .iter()
                .map(|&id| (NodeId::new(id), RaftNode::new(NodeId::new(id), cluster(ids))))
                .collect();
            Self { nodes, queue: VecDeque::new() }
        }

        fn deliver(&mut self, to: NodeId, event: Event) {
            let node = self.nodes.remove(&to).unwrap();
            let (node, actions) = node.step(event);
            self.nodes.insert(to, node);
            for action in actions {
                match action {
                    Action::Send { to: dest, message } | Action::Reply { to: dest, message } => {
                        self.queue.push_back((to, dest, message))
                    }
                    _ => {}
                }
            }
        }

        fn run(&mut self) {
            while let Some((from, to, message)) = self.queue.pop_front() {
                self.deliver(to, Event::Message { from, message });
            }
        }
    }

    #[test]
    fn scenario_a_three_node_election() {
        let mut net = Network::new(&[1, 2, 3]);
        let (x, actions) = net.nodes.remove(&X).unwrap().step(Event::Timeout);
        net.nodes.insert(X, x);

        let request = vote_request(1, X, None, 0);
        for peer in [Y, Z] {
            assert!(actions.contains(&Action::Send { to: peer, message: request.clone().into() }));
        }

        // only the peers' votes, the candidate's own request is dropped
        for peer in [Y, Z] {
            net.deliver(peer, Event::message(X, request.clone()));
        }
        net.run();

        let x = &net.nodes[&X];
        assert_eq!(x.role(), Role::Leader);
        assert_eq!(x.current_term(), Term::new(1));
        let leader = x.leader_state().unwrap();
        assert_eq!(leader.next_index, BTreeMap::from([(Y, 0), (Z, 0)]));
        assert_eq!(leader.match_index, BTreeMap::from([(Y, 0), (Z, 0)]));
        assert_eq!(net.nodes[&Y].voted_for(), Some(X));
        assert_eq!(net.nodes[&Z].voted_for(), Some(X));
    }

    #[test]
    fn scenario_a_with_full_broadcast() {
        let mut net = Network::new(&[1, 2, 3]);
        net.deliver(X, Event::Timeout);
        net.run();

        assert_eq!(net.nodes[&X].role(), Role::Leader);
        assert_eq!(net.nodes[&Y].role(), Role::Follower);
        assert_eq!(net.nodes[&Z].role(), Role::Follower);
    }

    #[test]
    fn scenario_b_append_on_empty_log_fails() {
        let rpc = append(1, Some(0), 0, vec![LogEntry::new(1, b"E1".to_vec())]);
        let (node, actions) = three_nodes(X).step(Event::message(Y, rpc));

        assert_eq!(append_reply_of(&actions), AppendReply::Failure { term: Term::new(1) });
        assert!(node.log().is_empty());
        assert_eq!(node.current_term(), Term::new(1));
    }

    #[test]
    fn scenario_c_stale_vote_request() {
        let node = follower_with(X, 2, &[]);
        let before = node.clone();
        let (node, actions) = node.step(Event::message(Y, vote_request(0, Y, None, 0)));

        assert_eq!(vote_reply_of(&actions), VoteReply::Denied { term: Term::new(2) });
        assert_eq!(node, before);
    }

    #[test]
    fn scenario_d_second_grant_wins() {
        let (node, _) = candidate(X).step(Event::message(Y, granted(1)));
        assert_eq!(node.votes_received().unwrap().len(), 1);

        let (node, _) = node.step(Event::message(Z, granted(1)));
        assert_eq!(node.role(), Role::Leader);
    }
}

// =============================================================================
// SECTION 8: INVARIANTS UNDER RANDOM EVENT SEQUENCES
// =============================================================================

mod invariants {
    use super::*;

    fn random_event(rng: &mut StdRng, term_ceiling: u64) -> Event {
        let from = NodeId::new(rng.gen_range(1..=3));
        let term = rng.gen_range(0..=term_ceiling);
        let index = rng.gen_bool(0.3).then(|| rng.gen_range(0..4));
        match rng.gen_range(0..6) {
            0 => Event::Timeout,
            1 => Event::message(from, vote_request(term, from, index, rng.gen_range(0..=term))),
            2 => {
                let entries = (0..rng.gen_range(0..3)).map(|_| LogEntry::new(term, vec![])).collect();
                Event::message(from, append(term, index, rng.gen_range(0..=term), entries))
            }
            3 => Event::message(from, granted(term)),
            4 => Event::message(from, VoteReply::Denied { term: Term::new(term) }),
            _ => Event::message(from, AppendReply::Failure { term: Term::new(term) }),
        }
    }

    #[test]
    fn term_never_decreases_and_replies_carry_current_term() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let mut node = three_nodes(X);
            for _ in 0..200 {
                let term_before = node.current_term();
                let event = random_event(&mut rng, term_before.get() + 2);
                let (next, actions) = node.step(event);

                assert!(next.current_term() >= term_before);
                for action in &actions {
                    if let Action::Reply { message, .. } = action {
                        assert!(message.term() >= term_before);
                        assert_eq!(message.term(), next.current_term());
                    }
                }
                node = next;
            }
        }
    }

    #[test]
    fn at_most_one_vote_per_term() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut node = three_nodes(X);
        let mut votes: BTreeMap<Term, NodeId> = BTreeMap::new();

        for _ in 0..2000 {
            let event = random_event(&mut rng, node.current_term().get() + 1);
            let (next, actions) = node.step(event);
            for action in &actions {
                if let Action::Reply { to, message: RaftMessage::VoteReply(reply) } = action {
                    if reply.is_granted() {
                        let previous = votes.insert(reply.term(), *to);
                        assert!(
                            previous.is_none() || previous == Some(*to),
                            "two votes in term {}",
                            reply.term()
                        );
                    }
                }
            }
            node = next;
        }
    }

    #[test]
    fn successful_append_matches_prefix_plus_entries() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let len = rng.gen_range(0..5);
            let log: Vec<u64> = (0..len).map(|_| rng.gen_range(0..3)).collect();
            let node = follower_with(X, 2, &log);
            let old = node.log().clone();

            let prev = rng.gen_bool(0.8).then(|| rng.gen_range(0..5u64));
            let entries: Vec<LogEntry> = (0..rng.gen_range(0..3))
                .map(|i| LogEntry::new(2, vec![i]))
                .collect();
            let rpc = append(2, prev, rng.gen_range(0..3), entries.clone());
            let (node, actions) = node.step(Event::message(Y, rpc));

            if append_reply_of(&actions).is_success() {
                let keep = prev.map_or(0, |p| p + 1) as usize;
                let mut expected = old.as_slice()[..keep].to_vec();
                expected.extend(entries);
                assert_eq!(node.log().as_slice(), expected.as_slice());
            } else {
                assert_eq!(node.log(), &old);
            }
        }
    }
}
