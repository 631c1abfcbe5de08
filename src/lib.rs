//! bytepair: Byte-level BPE Tokenizer
//!
//! A byte pair encoding tokenizer built from scratch. It learns merge rules
//! from training text, applies them to turn text into token IDs, and turns
//! token IDs back into text. Every input is handled at the byte level, so any
//! string can be encoded and decoding never fails on byte content.
//!
//! # Modules
//!
//! - [`stats`] - Adjacent pair counting
//! - [`merge`] - Merge rules and the pair merger
//! - [`vocab`] - Vocabulary construction and token rendering
//! - [`tokenizer`] - Training, encoding and decoding
//! - [`codec`] - The plain-text model format
//! - [`pretokenize`] - Pluggable pre-split strategies
//! - [`config`] - Training settings and progress reporting
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust
//! use bytepair::Tokenizer;
//!
//! // Train a tokenizer
//! let mut tokenizer = Tokenizer::new();
//! tokenizer.train("hello hello world world hello", 270)?;
//!
//! // Encode and decode
//! let ids = tokenizer.encode("hello world");
//! assert_eq!(tokenizer.decode(&ids)?, "hello world");
//!
//! // Save and restore
//! let restored = Tokenizer::from_model_str(&tokenizer.to_model_string())?;
//! assert_eq!(restored.encode("hello world"), ids);
//! # Ok::<(), bytepair::TokenizerError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod merge;
pub mod pretokenize;
pub mod stats;
pub mod tokenizer;
pub mod vocab;

/// Token (symbol) identifier. IDs below 256 are raw bytes.
pub type TokenId = u32;

/// An adjacent `(left, right)` pair of token IDs.
pub type Pair = (TokenId, TokenId);

/// Number of raw byte tokens every vocabulary starts with.
pub const BASE_VOCAB_SIZE: usize = 256;

// Re-export main types for convenience
pub use config::{TrainConfig, TrainProgress};
pub use error::{Result, TokenizerError};
pub use merge::MergeRule;
pub use pretokenize::{ByteLevel, LineSplit, PreTokenizer};
pub use tokenizer::{Tokenizer, TokenizerStats};
pub use vocab::{render_token, Vocab};
