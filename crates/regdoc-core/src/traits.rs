use crate::error::Result;
use crate::types::{IndexStats, Metadata, RecordId, SearchResult, VectorRecord};

/// Maps text to fixed-length vectors. Implementations fail explicitly instead of
/// returning short or malformed vectors.
pub trait EmbeddingProvider: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for std::sync::Arc<T> {
    fn dim(&self) -> usize { (**self).dim() }
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { (**self).embed(texts) }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn dim(&self) -> usize { (**self).dim() }
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { (**self).embed(texts) }
}

/// Storage of (text, vector, metadata) triples answering top-k queries.
///
/// Mutating calls take `&mut self`; callers sharing one index serialize writers.
pub trait VectorIndex: Send + Sync {
    /// Store records and return their ids, generating ids when `ids` is `None`.
    fn add(
        &mut self,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadata: Option<Vec<Metadata>>,
        ids: Option<Vec<RecordId>>,
    ) -> Result<Vec<RecordId>>;

    /// At most `k` results, best first. `filter` keeps records whose metadata
    /// contains every filter pair with an equal value.
    fn search(&self, query: &[f32], k: usize, filter: Option<&Metadata>) -> Result<Vec<SearchResult>>;

    fn get(&self, id: &str) -> Option<VectorRecord>;

    /// Absent ids are ignored.
    fn delete(&mut self, ids: &[RecordId]) -> bool;

    fn clear(&mut self);

    fn stats(&self) -> IndexStats;
}
