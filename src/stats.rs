//! Pair Statistics
//!
//! Counts how often each adjacent pair of symbols occurs. Training calls this
//! once per merge round, so it is the hot loop of the whole crate.
//!
//! ```text
//! ids:    [97, 97, 97, 98]
//! pairs:  (97,97) x2, (97,98) x1
//! ```

use crate::{Pair, TokenId};
use std::collections::HashMap;

/// Occurrence count of every adjacent pair.
pub type PairCounts = HashMap<Pair, usize>;

/// Add the adjacent pairs of `ids` into `counts`.
///
/// Counts accumulate, so the same map can be passed for many sequences.
/// Sequences shorter than two symbols add nothing.
pub fn pair_counts(ids: &[TokenId], counts: &mut PairCounts) {
    for window in ids.windows(2) {
        *counts.entry((window[0], window[1])).or_insert(0) += 1;
    }
}

/// Count pairs across independent chunks into one fresh map.
///
/// Pairs are only counted inside a chunk: the last symbol of one chunk and
/// the first symbol of the next never form a pair.
pub fn pair_counts_chunked<S: AsRef<[TokenId]>>(chunks: &[S]) -> PairCounts {
    let mut counts = PairCounts::new();
    for chunk in chunks {
        pair_counts(chunk.as_ref(), &mut counts);
    }
    counts
}

/// Pick the pair to merge next.
///
/// Highest count wins. Equal counts go to the numerically smallest pair,
/// compared as `(left, right)`, so training never depends on hash order.
pub fn most_frequent(counts: &PairCounts) -> Option<(Pair, usize)> {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(&pair, &count)| (pair, count))
}
