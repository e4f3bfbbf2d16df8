use anyhow::{bail, Result};
use regdoc_core::traits::EmbeddingProvider;

use crate::EmbeddingConfig;

/// Check one provider response: a vector per input, each of length `dim`
/// with finite components.
pub fn check_batch(dim: usize, inputs: usize, vectors: &[Vec<f32>]) -> Result<()> {
    if vectors.len() != inputs {
        bail!("embedding provider returned {} vectors for {} inputs", vectors.len(), inputs);
    }
    for (i, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            bail!("embedding {i} has dimension {}, expected {dim}", v.len());
        }
        if v.iter().any(|x| !x.is_finite()) {
            bail!("embedding {i} has a non-finite component");
        }
    }
    Ok(())
}

/// Splits calls into `batch_size` slices and validates every response.
pub struct BatchingEmbedder<P> {
    inner: P,
    batch_size: usize,
}

impl<P: EmbeddingProvider> BatchingEmbedder<P> {
    pub fn new(inner: P, config: EmbeddingConfig) -> Self {
        Self { inner, batch_size: config.batch_size() }
    }

    pub fn inner(&self) -> &P { &self.inner }
    pub fn batch_size(&self) -> usize { self.batch_size }

    /// `batch_size` slices of `texts`. Empty input is an error.
    pub fn batches<'t>(&self, texts: &'t [String]) -> Result<std::slice::Chunks<'t, String>> {
        if texts.is_empty() {
            bail!("cannot embed an empty list of texts");
        }
        Ok(texts.chunks(self.batch_size))
    }

    /// One provider call, with the response checked against `batch`.
    pub fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.inner.embed(batch)?;
        check_batch(self.inner.dim(), batch.len(), &vectors)?;
        Ok(vectors)
    }
}

impl<P: EmbeddingProvider> EmbeddingProvider for BatchingEmbedder<P> {
    fn dim(&self) -> usize { self.inner.dim() }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in self.batches(texts)? {
            out.extend(self.embed_batch(batch)?);
        }
        tracing::debug!(texts = texts.len(), batch_size = self.batch_size, "embedded texts");
        Ok(out)
    }
}
