//! Error types for tokenizer training, persistence and decoding.

use crate::TokenId;

/// Errors produced by the tokenizer.
///
/// Every fallible operation either completes or leaves the tokenizer exactly
/// as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    /// Malformed or wrong-version model file.
    #[error("model format error at line {line}: {message}")]
    Format {
        /// 1-based line number in the model file
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A merge rule references an ID missing from the vocabulary, or its
    /// assigned ID collides with an existing entry.
    #[error("invalid merge ({left}, {right}) -> {id}: {reason}")]
    InvalidMerge {
        left: TokenId,
        right: TokenId,
        id: TokenId,
        reason: &'static str,
    },

    /// Training ran out of adjacent pairs before reaching the target size.
    #[error("training text supports only {reached} tokens, {requested} requested")]
    EmptyVocabulary { requested: usize, reached: usize },

    /// Decode was given an ID the vocabulary does not contain.
    #[error("unknown token id {0}")]
    UnknownToken(TokenId),

    /// Rejected training configuration or special-token registration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TokenizerError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        TokenizerError::Format {
            line,
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TokenizerError>;
