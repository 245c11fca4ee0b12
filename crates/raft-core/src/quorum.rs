//! # quorum
//!
//! why: one place for the majority arithmetic elections are decided by
//! relations: used by node.rs when counting GrantVote replies
//! what: majority_size, has_majority

/// Number of agreeing members needed in a cluster of `cluster_size`: `⌈n/2⌉`
pub const fn majority_size(cluster_size: usize) -> usize {
    cluster_size.div_ceil(2)
}

/// Whether a candidate holding `votes` counted grants has won
///
/// the `+ 1` is the vote that triggered the check, which is not yet in the count
pub const fn has_majority(votes: usize, cluster_size: usize) -> bool {
    votes + 1 >= majority_size(cluster_size)
}
