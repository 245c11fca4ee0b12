//! # vote
//!
//! why: decide RequestVote rpcs; this is where "one vote per term" is enforced
//! relations: called by node.rs for followers and for a candidate's own request
//! what: arbitrate (pure decision over PersistentState)

use crate::message::{RequestVote, VoteReply};
use crate::{NodeId, PersistentState};
use std::cmp::Ordering;
use tracing::trace;

/// Decide a RequestVote against `state`, returning the updated state and the reply
///
/// a higher rpc term is adopted whatever the outcome; a grant also records
/// the candidate in `voted_for`. the node's own request for the current term
/// is granted unless the vote already went to someone else
pub fn arbitrate(
    mut state: PersistentState,
    rpc: &RequestVote,
    self_id: NodeId,
) -> (PersistentState, VoteReply) {
    let term_before = state.current_term;
    state.observe_term(rpc.term);

    let granted = if rpc.candidate_id == self_id && rpc.term == term_before {
        // a candidate's own request for its current term; the vote may already be its own
        state.voted_for.map_or(true, |id| id == self_id)
    } else if state.voted_for.is_some() {
        trace!(candidate = %rpc.candidate_id, voted_for = ?state.voted_for, "already voted this term");
        false
    } else {
        match rpc.term.cmp(&term_before) {
            Ordering::Less => false,
            Ordering::Equal => candidate_log_is_current(&state, rpc),
            Ordering::Greater => true,
        }
    };

    let term = state.current_term;
    if granted {
        state.voted_for = Some(rpc.candidate_id);
        (state, VoteReply::Granted { term })
    } else {
        (state, VoteReply::Denied { term })
    }
}

/// the candidate's log is at least as up to date as ours
fn candidate_log_is_current(state: &PersistentState, rpc: &RequestVote) -> bool {
    let our_last_term = state.log.last_term();
    if our_last_term > rpc.last_log_term {
        return false;
    }
    let candidate_len = rpc.last_log_index.map_or(0, |i| i + 1);
    !(our_last_term == rpc.last_log_term && state.log.len() > candidate_len)
}
