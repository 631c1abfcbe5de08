//! Training configuration and progress reporting.

use crate::error::{Result, TokenizerError};
use crate::{Pair, BASE_VOCAB_SIZE};
use serde::{Deserialize, Serialize};

/// Settings for one training run.
///
/// # Example
///
/// ```rust
/// use bytepair::TrainConfig;
///
/// let config = TrainConfig::new(1024).with_log_interval(100);
/// assert_eq!(config.num_merges(), 768);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Target vocabulary size, including the 256 byte tokens
    pub vocab_size: usize,
    /// Log progress every this many merges (0 disables progress logging)
    pub log_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            vocab_size: 512,
            log_interval: 50,
        }
    }
}

impl TrainConfig {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            ..Self::default()
        }
    }

    pub fn with_log_interval(mut self, log_interval: usize) -> Self {
        self.log_interval = log_interval;
        self
    }

    /// Number of merges needed to reach the target size.
    pub fn num_merges(&self) -> usize {
        self.vocab_size.saturating_sub(BASE_VOCAB_SIZE)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.vocab_size < BASE_VOCAB_SIZE {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab_size must be at least {}, got {}",
                BASE_VOCAB_SIZE, self.vocab_size
            )));
        }
        if self.vocab_size > u32::MAX as usize {
            return Err(TokenizerError::InvalidConfig(format!(
                "vocab_size {} does not fit in a token id",
                self.vocab_size
            )));
        }
        Ok(())
    }
}

/// Checkpoint handed to the progress callback after every merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainProgress {
    /// 0-based index of the merge just learned
    pub merge_index: usize,
    /// Total merges this run will perform
    pub num_merges: usize,
    /// Vocabulary size after this merge
    pub vocab_size: usize,
    /// The pair that was merged
    pub pair: Pair,
    /// How often the pair occurred before merging
    pub count: usize,
    /// Distinct adjacent pairs seen in this round
    pub distinct_pairs: usize,
}
