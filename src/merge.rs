//! Pair Merger
//!
//! Rewrites a symbol sequence, replacing each occurrence of one pair with a
//! single new symbol. Matches are taken left to right and never overlap:
//!
//! ```text
//! merge (5,5) -> 300 over [5, 5, 5]  =>  [300, 5]
//! ```

use crate::{Pair, TokenId};
use serde::{Deserialize, Serialize};

/// One learned merge: `pair.0` followed by `pair.1` becomes `id`.
///
/// A tokenizer keeps its rules in the order they were learned. That order is
/// the encode priority, and rule `k` always carries ID `256 + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRule {
    pub pair: Pair,
    pub id: TokenId,
}

impl MergeRule {
    pub fn new(left: TokenId, right: TokenId, id: TokenId) -> Self {
        Self {
            pair: (left, right),
            id,
        }
    }
}

/// Replace every non-overlapping occurrence of `pair` in `ids` with `new_id`.
///
/// The input is left untouched. Runs in O(n).
///
/// # Example
///
/// ```rust
/// use bytepair::merge::merge_pair;
///
/// assert_eq!(merge_pair(&[1, 2, 3, 1, 2], (1, 2), 256), vec![256, 3, 256]);
/// ```
pub fn merge_pair(ids: &[TokenId], pair: Pair, new_id: TokenId) -> Vec<TokenId> {
    let mut out = Vec::with_capacity(ids.len());
    merge_pair_into(ids, pair, new_id, &mut out);
    out
}

/// Buffer-reusing form of [`merge_pair`].
///
/// `out` is cleared first. The training and encode loops swap two buffers
/// through this function instead of allocating a new vector per merge.
pub fn merge_pair_into(ids: &[TokenId], pair: Pair, new_id: TokenId, out: &mut Vec<TokenId>) {
    out.clear();

    let mut i = 0;
    while i < ids.len() {
        if i + 1 < ids.len() && ids[i] == pair.0 && ids[i + 1] == pair.1 {
            out.push(new_id);
            i += 2; // both halves consumed
        } else {
            out.push(ids[i]);
            i += 1;
        }
    }
}
