use std::sync::Arc;

use tokio::sync::RwLock;

use regdoc_core::chunking::Chunker;
use regdoc_core::config::Settings;
use regdoc_core::error::{Error, Result};
use regdoc_core::traits::{EmbeddingProvider, VectorIndex};
use regdoc_core::types::{Metadata, RecordId, RetrievedChunk, TextChunk};
use regdoc_embed::{EmbeddingConfig, EmbeddingPool};

use crate::config::RetrievalConfig;
use crate::retriever::Retriever;

/// The two operations the surrounding system calls, `chunk_document` and
/// `retrieve`, plus `ingest_document` to populate the shared index.
///
/// Embedding runs on the pool before any index lock is taken; writers hold
/// the write lock only for the `add` call.
pub struct DocumentPipeline<I> {
    chunker: Chunker,
    pool: EmbeddingPool,
    index: Arc<RwLock<I>>,
    retriever: Retriever,
}

impl<I: VectorIndex> DocumentPipeline<I> {
    pub fn new(chunker: Chunker, pool: EmbeddingPool, index: Arc<RwLock<I>>, retrieval: RetrievalConfig) -> Self {
        let retriever = Retriever::new(Arc::clone(pool.provider()), retrieval);
        Self { chunker, pool, index, retriever }
    }

    /// Build every component from configuration sections.
    pub fn from_settings(settings: &Settings, provider: Arc<dyn EmbeddingProvider>, index: I) -> Result<Self> {
        if provider.dim() != index.stats().dimension {
            return Err(Error::InvalidConfig(format!(
                "embedding dimension {} does not match index dimension {}",
                provider.dim(),
                index.stats().dimension
            )));
        }
        let chunker = Chunker::from_settings(&settings.chunking)?;
        let pool = EmbeddingPool::new(provider, EmbeddingConfig::try_from(&settings.embedding)?);
        let retrieval = RetrievalConfig::try_from(&settings.retrieval)?;
        Ok(Self::new(chunker, pool, Arc::new(RwLock::new(index)), retrieval))
    }

    pub fn chunker(&self) -> &Chunker { &self.chunker }
    pub fn retriever(&self) -> &Retriever { &self.retriever }
    pub fn index(&self) -> &Arc<RwLock<I>> { &self.index }

    pub fn chunk_document(&self, text: &str, metadata: &Metadata) -> Vec<TextChunk> {
        self.chunker.chunk(text, metadata)
    }

    /// Chunk, embed and store a document. Each record's metadata is the
    /// document metadata plus `chunk_index`, `start_char` and `end_char`.
    pub async fn ingest_document(&self, text: &str, metadata: &Metadata) -> Result<Vec<RecordId>> {
        let chunks = self.chunk_document(text, metadata);
        if chunks.is_empty() {
            tracing::warn!("document produced no chunks; nothing ingested");
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let n = texts.len();
        let embeddings = self.pool.embed(texts.clone()).await.map_err(|e| Error::capability("embed_chunks", n, e))?;
        let metadata: Vec<Metadata> = chunks.into_iter().map(record_metadata).collect();

        let ids = self.index.write().await.add(texts, embeddings, Some(metadata), None)?;
        tracing::info!(chunks = ids.len(), "ingested document");
        Ok(ids)
    }

    pub async fn retrieve(&self, query: &str, filters: Option<&Metadata>) -> Result<Vec<RetrievedChunk>> {
        self.retriever.check_request(query)?;
        let query_vec = self
            .pool
            .embed_one(query.to_string())
            .await
            .map_err(|e| Error::capability("embed_query", 1, e))?;
        let index = self.index.read().await;
        self.retriever.retrieve_by_vector(&*index, &query_vec, filters)
    }
}

fn record_metadata(chunk: TextChunk) -> Metadata {
    let mut metadata = chunk.metadata;
    metadata.insert("chunk_index".into(), chunk.chunk_index.into());
    metadata.insert("start_char".into(), chunk.start_char.into());
    metadata.insert("end_char".into(), chunk.end_char.into());
    metadata
}
