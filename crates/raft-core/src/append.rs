//! # append
//!
//! why: decide AppendEntries rpcs with the log-matching check before anything is accepted
//! relations: called by node.rs for followers (and candidates stepping down)
//! what: check_consistency (pure decision over PersistentState)

use crate::log::LogChange;
use crate::message::{AppendEntries, AppendReply};
use crate::PersistentState;
use tracing::{trace, warn};

/// Decide an AppendEntries against `state`
///
/// returns the updated state, the reply and the log change storage has to
/// mirror (empty unless the append succeeded). `committed` is the number of
/// leading entries that must never be rewritten
pub fn check_consistency(
    mut state: PersistentState,
    committed: u64,
    rpc: AppendEntries,
) -> (PersistentState, AppendReply, LogChange) {
    if rpc.term < state.current_term {
        trace!(leader = %rpc.leader_id, term = %rpc.term, "stale leader");
        let term = state.current_term;
        return (state, AppendReply::Failure { term }, LogChange::default());
    }
    state.observe_term(rpc.term);
    let term = state.current_term;

    if !state.log.matches(rpc.prev_log_index, rpc.prev_log_term) {
        trace!(
            prev_log_index = ?rpc.prev_log_index,
            prev_log_term = %rpc.prev_log_term,
            log_len = state.log.len(),
            "log mismatch"
        );
        return (state, AppendReply::Failure { term }, LogChange::default());
    }

    match state.log.rewrite(rpc.prev_log_index, rpc.entries, committed) {
        Ok(change) => (state, AppendReply::Success { term }, change),
        Err(err) => {
            warn!(leader = %rpc.leader_id, %err, "refusing append");
            (state, AppendReply::Failure { term }, LogChange::default())
        }
    }
}
