//! Pre-split strategies.
//!
//! A pre-tokenizer cuts text into chunks before the byte-level engine sees it.
//! Merges are learned and applied inside each chunk only, so a chunk boundary
//! is a place where no token can ever span.
//!
//! The engine itself knows nothing about language; anything smarter than the
//! strategies here plugs in through [`PreTokenizer`].

use std::fmt;

/// Splits text into independently tokenized chunks.
///
/// Chunks must cover the input exactly and in order: concatenating them has
/// to give back the original text, otherwise encode/decode stops round-tripping.
pub trait PreTokenizer: fmt::Debug + Send + Sync {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// The whole text is one chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteLevel;

impl PreTokenizer for ByteLevel {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![text]
        }
    }
}

/// One chunk per line; each line keeps its trailing `\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSplit;

impl PreTokenizer for LineSplit {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_inclusive('\n').collect()
    }
}
