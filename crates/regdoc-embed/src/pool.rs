use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::try_join_all;
use regdoc_core::traits::EmbeddingProvider;
use tokio::sync::Semaphore;

use crate::batching::BatchingEmbedder;
use crate::EmbeddingConfig;

/// Runs a `BatchingEmbedder` on tokio's blocking pool, one `batch_size` slice
/// per task, with at most `max_workers` slices in flight across all callers.
///
/// Cloning shares the provider and the worker limit.
#[derive(Clone)]
pub struct EmbeddingPool {
    batching: Arc<BatchingEmbedder<Arc<dyn EmbeddingProvider>>>,
    config: EmbeddingConfig,
    permits: Arc<Semaphore>,
}

impl EmbeddingPool {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_workers()));
        Self { batching: Arc::new(BatchingEmbedder::new(provider, config)), config, permits }
    }

    pub fn dim(&self) -> usize { self.batching.dim() }
    pub fn config(&self) -> &EmbeddingConfig { &self.config }
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> { self.batching.inner() }

    /// Embed `texts`, preserving order. Fails on the first failing batch.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let total = texts.len();
        let batches: Vec<Vec<String>> = self.batching.batches(&texts)?.map(<[String]>::to_vec).collect();
        let tasks = batches.into_iter().map(|batch| self.embed_batch(batch));
        let results = try_join_all(tasks).await?;
        let vectors: Vec<Vec<f32>> = results.into_iter().flatten().collect();
        tracing::debug!(texts = total, batch_size = self.config.batch_size(), "embedded texts in pool");
        Ok(vectors)
    }

    pub async fn embed_one(&self, text: String) -> Result<Vec<f32>> {
        self.embed(vec![text])
            .await?
            .pop()
            .ok_or_else(|| anyhow!("embedding provider returned no vector"))
    }

    async fn embed_batch(&self, batch: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| anyhow!("embedding pool closed: {e}"))?;
        let batching = Arc::clone(&self.batching);
        tokio::task::spawn_blocking(move || batching.embed_batch(&batch))
            .await
            .map_err(|e| anyhow!("embedding worker failed: {e}"))?
    }
}
