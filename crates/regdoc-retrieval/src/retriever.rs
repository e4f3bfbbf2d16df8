use std::sync::Arc;

use regdoc_core::error::{Error, Result};
use regdoc_core::traits::{EmbeddingProvider, VectorIndex};
use regdoc_core::types::{DistanceMetric, Metadata, RetrievedChunk, SearchResult, VectorRecord};
use regdoc_embed::check_batch;
use regdoc_vector::distance::dot;

use crate::config::{RetrievalConfig, RetrievalMode};

/// Query -> embedding -> index search -> floor, dedup, rerank, ranks.
pub struct Retriever {
    config: RetrievalConfig,
    embedder: Arc<dyn EmbeddingProvider>,
}

struct Candidate {
    record: VectorRecord,
    similarity: f32,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: RetrievalConfig) -> Self {
        Self { config, embedder }
    }

    pub fn config(&self) -> &RetrievalConfig { &self.config }

    pub fn retrieve<I>(&self, index: &I, query: &str, filters: Option<&Metadata>) -> Result<Vec<RetrievedChunk>>
    where
        I: VectorIndex + ?Sized,
    {
        self.check_request(query)?;
        let query_vec = self.embed_query(query)?;
        self.retrieve_by_vector(index, &query_vec, filters)
    }

    /// Same as [`Retriever::retrieve`] for a query that is already embedded.
    pub fn retrieve_by_vector<I>(&self, index: &I, query: &[f32], filters: Option<&Metadata>) -> Result<Vec<RetrievedChunk>>
    where
        I: VectorIndex + ?Sized,
    {
        self.check_mode()?;
        let candidates = self.config.candidate_count();
        let results = index.search(query, candidates, filters)?;
        let metric = index.stats().metric;
        let found = results.len();
        let chunks = self.postprocess(results, metric);
        tracing::debug!(candidates, found, returned = chunks.len(), "retrieved chunks");
        Ok(chunks)
    }

    pub(crate) fn check_request(&self, query: &str) -> Result<()> {
        self.check_mode()?;
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }
        Ok(())
    }

    fn check_mode(&self) -> Result<()> {
        match self.config.mode() {
            RetrievalMode::Semantic => Ok(()),
            RetrievalMode::Hybrid => Err(Error::Unimplemented("hybrid retrieval (semantic + keyword)")),
        }
    }

    fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let vectors = self
            .embedder
            .embed(&[query.to_string()])
            .and_then(|v| check_batch(self.embedder.dim(), 1, &v).map(|()| v))
            .map_err(|e| Error::capability("embed_query", 1, e))?;
        vectors.into_iter().next().ok_or_else(|| Error::capability("embed_query", 1, "no vector returned"))
    }

    fn postprocess(&self, results: Vec<SearchResult>, metric: DistanceMetric) -> Vec<RetrievedChunk> {
        let mut candidates: Vec<Candidate> = results
            .into_iter()
            .map(|r| Candidate { similarity: metric.similarity(r.score), record: r.record })
            .filter(|c| c.similarity >= self.config.min_similarity())
            .collect();

        if self.config.filter_duplicates() {
            candidates = drop_near_duplicates(candidates, self.config.duplicate_threshold());
        }
        if self.config.rerank() {
            rerank(&mut candidates);
        }
        candidates.truncate(self.config.top_k());

        candidates
            .into_iter()
            .enumerate()
            .map(|(i, c)| RetrievedChunk {
                id: c.record.id,
                text: c.record.text,
                metadata: c.record.metadata,
                similarity: c.similarity,
                rank: i + 1,
            })
            .collect()
    }
}

/// Greedy, in candidate order: drop a candidate whose cosine similarity to
/// any already accepted one exceeds `threshold`. Stored embeddings are unit
/// length, so the dot product is the cosine.
fn drop_near_duplicates(candidates: Vec<Candidate>, threshold: f32) -> Vec<Candidate> {
    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let duplicate = accepted.iter().any(|a| dot(&a.record.embedding, &candidate.record.embedding) > threshold);
        if duplicate {
            tracing::debug!(id = %candidate.record.id, "dropped near-duplicate");
        } else {
            accepted.push(candidate);
        }
    }
    accepted
}

/// Similarity, descending. Ties keep index order.
fn rerank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
}
