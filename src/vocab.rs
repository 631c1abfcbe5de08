//! Vocabulary Builder
//!
//! The vocabulary maps every token ID to the bytes it stands for. It is never
//! stored as authoritative data: it is rebuilt from the merge history and the
//! special tokens whenever either changes.
//!
//! ## Layout
//!
//! ```text
//! 0..=255          single raw bytes (identity)
//! 256..256+M       learned merges, in the order they were learned
//! after merges     special tokens, as registered
//! ```
//!
//! Every merged entry is the concatenation of its two halves, so the
//! vocabulary is consistent by construction.

use crate::error::{Result, TokenizerError};
use crate::merge::MergeRule;
use crate::{TokenId, BASE_VOCAB_SIZE};
use std::collections::BTreeMap;
use unicode_general_category::{get_general_category, GeneralCategory};

/// Token ID to byte-value mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocab {
    entries: BTreeMap<TokenId, Vec<u8>>,
}

impl Vocab {
    /// Vocabulary holding only the 256 raw byte tokens.
    pub fn base() -> Self {
        let entries = (0..BASE_VOCAB_SIZE as TokenId)
            .map(|id| (id, vec![id as u8]))
            .collect();
        Self { entries }
    }

    /// Build the vocabulary from a merge history and special tokens.
    ///
    /// Merges are resolved in order, since a later merge may be built from an
    /// earlier one. Fails with [`TokenizerError::InvalidMerge`] when a rule
    /// references an ID that does not exist yet or reuses an existing ID.
    pub fn build(merges: &[MergeRule], special_tokens: &[(String, TokenId)]) -> Result<Self> {
        let mut vocab = Self::base();

        for rule in merges {
            let (left, right) = rule.pair;
            let invalid = |reason| TokenizerError::InvalidMerge {
                left,
                right,
                id: rule.id,
                reason,
            };

            if vocab.entries.contains_key(&rule.id) {
                return Err(invalid("id already assigned"));
            }
            let mut bytes = vocab
                .entries
                .get(&left)
                .ok_or_else(|| invalid("left id not in vocabulary"))?
                .clone();
            bytes.extend_from_slice(
                vocab
                    .entries
                    .get(&right)
                    .ok_or_else(|| invalid("right id not in vocabulary"))?,
            );
            vocab.entries.insert(rule.id, bytes);
        }

        for (token, id) in special_tokens {
            if vocab.entries.contains_key(id) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "special token {:?} reuses id {}",
                    token, id
                )));
            }
            vocab.entries.insert(*id, token.as_bytes().to_vec());
        }

        Ok(vocab)
    }

    /// Bytes for `id`, if present.
    pub fn get(&self, id: TokenId) -> Option<&[u8]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of entries (bytes + merges + special tokens).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest ID above every assigned one, or `None` once `u32::MAX` is
    /// taken.
    pub fn next_id(&self) -> Option<TokenId> {
        match self.entries.keys().next_back() {
            Some(&id) => id.checked_add(1),
            None => Some(0),
        }
    }

    /// Entries in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &[u8])> {
        self.entries.iter().map(|(&id, bytes)| (id, bytes.as_slice()))
    }
}

/// Escape every character in Unicode general category C as `\uXXXX`.
///
/// Surrogates cannot occur in a Rust `char`, so control, format, private use
/// and unassigned code points are the ones that get escaped.
pub fn escape_control_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match get_general_category(ch) {
            GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned => {
                out.push_str(&format!("\\u{:04x}", ch as u32));
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Printable form of a token's bytes.
///
/// Invalid UTF-8 becomes U+FFFD and control characters are escaped, so a
/// token never breaks the line it is printed on.
pub fn render_token(bytes: &[u8]) -> String {
    escape_control_chars(&String::from_utf8_lossy(bytes))
}
