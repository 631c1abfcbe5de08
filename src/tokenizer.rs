//! Byte Pair Encoding (BPE) Tokenizer
//!
//! This module holds the tokenizer engine: training, encoding and decoding.
//!
//! ## How BPE Works
//!
//! 1. **Start with byte-level encoding**: 256 base tokens (one per byte value: 0-255)
//! 2. **Count adjacent pairs**: Find the most common adjacent pair in the corpus
//! 3. **Merge the most frequent pair**: Create a new token representing that pair
//! 4. **Repeat**: Continue until the vocabulary reaches the target size
//!
//! ## Example
//!
//! Given corpus: "aaabdaaabac"
//! - Merge 1: most common pair = ('a','a') x4 → token 256: "[256]abd[256]abac"
//! - Merge 2: ('a','b') and ([256],'a') tie at 2; the smaller pair wins → token 257
//! - Merge 3: most common pair = ([256],[257]) x2 → token 258: "[258]d[258]ac"
//!
//! ## Encoding Order
//!
//! Encoding replays the merge history in the exact order it was learned. It
//! never recounts frequencies on the input: applying the same rules in a
//! different order can produce a different, non-canonical tokenization.
//!
//! ## Lifecycle
//!
//! A tokenizer is constructed empty, then either trained or loaded, and is
//! read-only afterwards. Encoding and decoding take `&self`, so one trained
//! tokenizer can be shared across threads.

use crate::codec;
use crate::config::{TrainConfig, TrainProgress};
use crate::error::{Result, TokenizerError};
use crate::merge::{merge_pair_into, MergeRule};
use crate::pretokenize::{ByteLevel, PreTokenizer};
use crate::stats::{most_frequent, pair_counts_chunked};
use crate::vocab::Vocab;
use crate::{TokenId, BASE_VOCAB_SIZE};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A byte-level Byte Pair Encoding tokenizer
///
/// Holds the merge history learned during training, any registered special
/// tokens, an opaque pattern string, and the vocabulary derived from them.
/// The merge history is an ordered list; its order is the encode priority.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Learned merges, rule `k` has ID `256 + k`
    merges: Vec<MergeRule>,

    /// Special tokens in registration order
    special_tokens: Vec<(String, TokenId)>,

    /// Pre-tokenization pattern, stored and persisted but not interpreted
    pattern: String,

    /// Derived from `merges` and `special_tokens`, never edited directly
    vocab: Vocab,

    /// How text is cut into chunks before byte-level processing
    pre_tokenizer: Arc<dyn PreTokenizer>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Create an untrained tokenizer
    ///
    /// The vocabulary holds only the 256 byte tokens, so encoding maps each
    /// byte to its own ID until the tokenizer is trained or loaded.
    pub fn new() -> Self {
        Self {
            merges: Vec::new(),
            special_tokens: Vec::new(),
            pattern: String::new(),
            vocab: Vocab::base(),
            pre_tokenizer: Arc::new(ByteLevel),
        }
    }

    /// Replace the pre-split strategy
    ///
    /// The strategy is not persisted: a loaded tokenizer uses [`ByteLevel`]
    /// until the caller sets the one it was trained with.
    pub fn with_pre_tokenizer<P: PreTokenizer + 'static>(mut self, pre_tokenizer: P) -> Self {
        self.pre_tokenizer = Arc::new(pre_tokenizer);
        self
    }

    /// Assemble a tokenizer from persisted parts, rebuilding the vocabulary.
    pub(crate) fn from_parts(
        merges: Vec<MergeRule>,
        special_tokens: Vec<(String, TokenId)>,
        pattern: String,
    ) -> Result<Self> {
        let vocab = Vocab::build(&merges, &special_tokens)?;
        Ok(Self {
            merges,
            special_tokens,
            pattern,
            vocab,
            pre_tokenizer: Arc::new(ByteLevel),
        })
    }

    // -- Training -----------------------------------------------------------

    /// Train BPE on a text corpus
    ///
    /// Learns `vocab_size - 256` merges by repeatedly merging the most
    /// frequent adjacent pair. Ties go to the numerically smallest
    /// `(left, right)` pair, so identical input always yields identical merges.
    ///
    /// # Arguments
    ///
    /// * `text` - Training corpus
    /// * `vocab_size` - Target vocabulary size, at least 256
    ///
    /// # Errors
    ///
    /// * [`TokenizerError::InvalidConfig`] if `vocab_size < 256`
    /// * [`TokenizerError::EmptyVocabulary`] if the text runs out of pairs
    ///   before the target is reached; the tokenizer is left unchanged
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytepair::Tokenizer;
    ///
    /// let mut tokenizer = Tokenizer::new();
    /// tokenizer.train("aaabdaaabac", 259)?;
    ///
    /// assert_eq!(tokenizer.merges()[0].pair, (97, 97));
    /// assert_eq!(tokenizer.vocab_size(), 259);
    /// # Ok::<(), bytepair::TokenizerError>(())
    /// ```
    pub fn train(&mut self, text: &str, vocab_size: usize) -> Result<()> {
        self.train_with_config(text, &TrainConfig::new(vocab_size), |_| {})
    }

    /// Train with explicit settings and a progress callback
    ///
    /// The callback runs once per learned merge and is purely observational.
    pub fn train_with_config<F>(
        &mut self,
        text: &str,
        config: &TrainConfig,
        progress: F,
    ) -> Result<()>
    where
        F: FnMut(&TrainProgress),
    {
        let chunks = self
            .pre_tokenizer
            .split(text)
            .into_iter()
            .map(bytes_to_ids)
            .collect();
        self.learn(chunks, config, progress)
    }

    /// Train over caller-defined chunks
    ///
    /// Pair counts accumulate across all chunks, but no merge ever spans two
    /// chunks. The configured pre-tokenizer is bypassed.
    pub fn train_chunks<S: AsRef<str>>(&mut self, chunks: &[S], vocab_size: usize) -> Result<()> {
        let chunks = chunks.iter().map(|c| bytes_to_ids(c.as_ref())).collect();
        self.learn(chunks, &TrainConfig::new(vocab_size), |_| {})
    }

    fn learn<F>(
        &mut self,
        mut chunks: Vec<Vec<TokenId>>,
        config: &TrainConfig,
        mut progress: F,
    ) -> Result<()>
    where
        F: FnMut(&TrainProgress),
    {
        config.validate()?;
        let num_merges = config.num_merges();

        info!(
            "training BPE tokenizer: target vocab size {}, {} merges, {} chunks, {} bytes",
            config.vocab_size,
            num_merges,
            chunks.len(),
            chunks.iter().map(Vec::len).sum::<usize>()
        );

        let mut merges = Vec::with_capacity(num_merges);
        // Double buffer, swapped with each chunk as it is rewritten
        let mut buffer = Vec::new();

        for merge_index in 0..num_merges {
            let counts = pair_counts_chunked(&chunks);
            let Some((pair, count)) = most_frequent(&counts) else {
                return Err(TokenizerError::EmptyVocabulary {
                    requested: config.vocab_size,
                    reached: BASE_VOCAB_SIZE + merges.len(),
                });
            };

            let id = (BASE_VOCAB_SIZE + merge_index) as TokenId;
            for chunk in chunks.iter_mut() {
                merge_pair_into(chunk.as_slice(), pair, id, &mut buffer);
                std::mem::swap(chunk, &mut buffer);
            }
            merges.push(MergeRule { pair, id });

            let step = TrainProgress {
                merge_index,
                num_merges,
                vocab_size: BASE_VOCAB_SIZE + merges.len(),
                pair,
                count,
                distinct_pairs: counts.len(),
            };
            progress(&step);

            if config.log_interval > 0 && merge_index % config.log_interval == 0 {
                info!(
                    "merge {}/{}: {:?} -> {} (count: {}, distinct pairs: {})",
                    merge_index + 1,
                    num_merges,
                    pair,
                    id,
                    count,
                    counts.len()
                );
            }
        }

        // Special tokens registered before this run move past the new merges
        let first_special = BASE_VOCAB_SIZE + merges.len();
        let special_tokens: Vec<(String, TokenId)> = self
            .special_tokens
            .iter()
            .enumerate()
            .map(|(i, (token, _))| (token.clone(), (first_special + i) as TokenId))
            .collect();

        let vocab = Vocab::build(&merges, &special_tokens)?;
        self.merges = merges;
        self.special_tokens = special_tokens;
        self.vocab = vocab;

        info!(
            "training complete: {} merges, vocab size {}",
            self.merges.len(),
            self.vocab.len()
        );
        Ok(())
    }

    // -- Special tokens -----------------------------------------------------

    /// Register special tokens
    ///
    /// Each token gets the next free ID above everything already in the
    /// vocabulary, in the order given. Special tokens are rendered by
    /// [`decode`](Self::decode) but never produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// [`TokenizerError::InvalidConfig`] for an empty token, a token holding a
    /// line break, a token that is already registered (including duplicates
    /// within `tokens`), or when the ID space above the vocabulary is used
    /// up. Nothing is registered on error.
    pub fn register_special_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
        let mut seen: HashSet<&str> = self
            .special_tokens
            .iter()
            .map(|(t, _)| t.as_str())
            .collect();
        let mut next_id = self.vocab.next_id();
        let mut added = Vec::with_capacity(tokens.len());

        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                return Err(TokenizerError::InvalidConfig(
                    "special token must not be empty".to_string(),
                ));
            }
            if token.contains(['\n', '\r']) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "special token {:?} spans more than one line",
                    token
                )));
            }
            if !seen.insert(token) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "special token {:?} registered twice",
                    token
                )));
            }
            let id = next_id.ok_or_else(|| {
                TokenizerError::InvalidConfig("token id space exhausted".to_string())
            })?;
            added.push((token.to_string(), id));
            next_id = id.checked_add(1);
        }

        let mut special_tokens = self.special_tokens.clone();
        special_tokens.extend(added);
        self.vocab = Vocab::build(&self.merges, &special_tokens)?;
        self.special_tokens = special_tokens;
        Ok(())
    }

    /// ID of a registered special token.
    pub fn special_token_id(&self, token: &str) -> Option<TokenId> {
        self.special_tokens
            .iter()
            .find(|(t, _)| t == token)
            .map(|&(_, id)| id)
    }

    // -- Encoding -----------------------------------------------------------

    /// Encode text to token IDs
    ///
    /// The text is split by the pre-tokenizer, each chunk is converted to its
    /// UTF-8 bytes, and every merge rule is applied in learned order. The
    /// result is never longer than the input in bytes, and is non-empty for
    /// non-empty input.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytepair::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::new();
    /// assert_eq!(tokenizer.encode("hi"), vec![104, 105]);
    /// ```
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        let mut ids = Vec::with_capacity(text.len());
        for chunk in self.pre_tokenizer.split(text) {
            ids.extend(self.encode_bytes(chunk.as_bytes()));
        }
        ids
    }

    /// Encode raw bytes as a single chunk
    ///
    /// Works for any byte string, including invalid UTF-8.
    pub fn encode_bytes(&self, bytes: &[u8]) -> Vec<TokenId> {
        let mut ids: Vec<TokenId> = bytes.iter().map(|&b| b as TokenId).collect();
        let mut buffer = Vec::with_capacity(ids.len());

        for rule in &self.merges {
            if ids.len() < 2 {
                break;
            }
            merge_pair_into(&ids, rule.pair, rule.id, &mut buffer);
            std::mem::swap(&mut ids, &mut buffer);
        }
        ids
    }

    /// Encode many texts in parallel
    ///
    /// Each text is encoded independently with [`encode`](Self::encode);
    /// output order matches input order.
    pub fn encode_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Vec<TokenId>> {
        texts.par_iter().map(|text| self.encode(text.as_ref())).collect()
    }

    // -- Decoding -----------------------------------------------------------

    /// Decode token IDs back to text
    ///
    /// Byte values are concatenated first and converted to text once, so a
    /// multi-byte character split across two tokens decodes correctly. Any
    /// invalid UTF-8 left over becomes U+FFFD.
    ///
    /// # Errors
    ///
    /// [`TokenizerError::UnknownToken`] for an ID missing from the vocabulary.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytepair::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::new();
    /// let ids = tokenizer.encode("Hello!");
    /// assert_eq!(tokenizer.decode(&ids)?, "Hello!");
    /// # Ok::<(), bytepair::TokenizerError>(())
    /// ```
    pub fn decode(&self, ids: &[TokenId]) -> Result<String> {
        let bytes = self.decode_bytes(ids)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Decode token IDs to their raw bytes.
    pub fn decode_bytes(&self, ids: &[TokenId]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            let value = self.vocab.get(id).ok_or(TokenizerError::UnknownToken(id))?;
            bytes.extend_from_slice(value);
        }
        Ok(bytes)
    }

    // -- Accessors ----------------------------------------------------------

    /// The vocabulary rebuilt from the merges and special tokens.
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Merge rules in the order they were learned.
    pub fn merges(&self) -> &[MergeRule] {
        &self.merges
    }

    /// Registered special tokens with their IDs, in registration order.
    pub fn special_tokens(&self) -> &[(String, TokenId)] {
        &self.special_tokens
    }

    /// Pattern string stored with the model (empty by default).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Set the pattern string persisted with the model.
    ///
    /// Newlines would break the model file, so they are rejected.
    pub fn set_pattern(&mut self, pattern: impl Into<String>) -> Result<()> {
        let pattern = pattern.into();
        if pattern.contains('\n') || pattern.contains('\r') {
            return Err(TokenizerError::InvalidConfig(
                "pattern must be a single line".to_string(),
            ));
        }
        self.pattern = pattern;
        Ok(())
    }

    /// Number of vocabulary entries (bytes + merges + special tokens).
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Get tokenizer statistics
    ///
    /// # Returns
    ///
    /// Vocabulary, merge and special token counts
    pub fn stats(&self) -> TokenizerStats {
        TokenizerStats {
            vocab_size: self.vocab.len(),
            num_merges: self.merges.len(),
            num_special_tokens: self.special_tokens.len(),
            base_tokens: BASE_VOCAB_SIZE,
        }
    }

    // -- Persistence --------------------------------------------------------

    /// Serialize the model to its text format.
    pub fn to_model_string(&self) -> String {
        codec::serialize(self)
    }

    /// Parse a model from its text format.
    pub fn from_model_str(model: &str) -> Result<Self> {
        codec::deserialize(model)
    }

    /// Save the tokenizer
    ///
    /// Writes `<prefix>.model` (the authoritative model) and `<prefix>.vocab`
    /// (a human-readable listing that is never read back).
    ///
    /// # Returns
    ///
    /// The path of the written `.model` file
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use bytepair::Tokenizer;
    /// # let tokenizer = Tokenizer::new();
    /// let model_path = tokenizer.save("models/dune")?;
    /// let restored = Tokenizer::load(&model_path)?;
    /// # Ok::<(), bytepair::TokenizerError>(())
    /// ```
    pub fn save<P: AsRef<Path>>(&self, prefix: P) -> Result<PathBuf> {
        let prefix = prefix.as_ref();
        let model_path = with_suffix(prefix, "model");
        let vocab_path = with_suffix(prefix, "vocab");

        fs::write(&model_path, codec::serialize(self))?;
        fs::write(&vocab_path, codec::render_vocab(self))?;

        info!(
            "saved tokenizer ({} merges) to {}",
            self.merges.len(),
            model_path.display()
        );
        Ok(model_path)
    }

    /// Load a tokenizer from a `.model` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = codec::deserialize(&fs::read_to_string(path)?)?;
        info!(
            "loaded tokenizer from {}: {} merges, {} special tokens",
            path.display(),
            tokenizer.merges.len(),
            tokenizer.special_tokens.len()
        );
        Ok(tokenizer)
    }
}

/// Statistics about a tokenizer's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerStats {
    /// Total vocabulary size (base tokens + learned merges + special tokens)
    pub vocab_size: usize,
    /// Number of merge rules learned
    pub num_merges: usize,
    /// Number of registered special tokens
    pub num_special_tokens: usize,
    /// Number of base tokens (always 256 for byte-level BPE)
    pub base_tokens: usize,
}

fn bytes_to_ids(text: &str) -> Vec<TokenId> {
    text.bytes().map(TokenId::from).collect()
}

fn with_suffix(prefix: &Path, extension: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}
