//! Embedding side of the pipeline.
//!
//! The crate ships no model. `HashingEmbedder` is a deterministic stand-in for
//! development, tests and the CLI; `BatchingEmbedder` and `EmbeddingPool` wrap
//! any `EmbeddingProvider` with batch splitting, output checks and a bounded
//! blocking worker pool.

mod batching;
mod hashing;
mod pool;

pub use batching::{check_batch, BatchingEmbedder};
pub use hashing::HashingEmbedder;
pub use pool::EmbeddingPool;

use regdoc_core::config::EmbeddingSettings;
use regdoc_core::error::{Error, Result};

/// Validated batching and concurrency limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingConfig {
    batch_size: usize,
    max_workers: usize,
}

impl EmbeddingConfig {
    pub fn new(batch_size: usize, max_workers: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be positive".into()));
        }
        if max_workers == 0 {
            return Err(Error::InvalidConfig("embedding.max_workers must be positive".into()));
        }
        Ok(Self { batch_size, max_workers })
    }

    pub fn batch_size(&self) -> usize { self.batch_size }
    pub fn max_workers(&self) -> usize { self.max_workers }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let d = EmbeddingSettings::default();
        Self { batch_size: d.batch_size, max_workers: d.max_workers }
    }
}

impl TryFrom<&EmbeddingSettings> for EmbeddingConfig {
    type Error = Error;

    fn try_from(s: &EmbeddingSettings) -> Result<Self> {
        EmbeddingConfig::new(s.batch_size, s.max_workers)
    }
}
