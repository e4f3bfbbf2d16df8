use std::sync::Arc;

use regdoc_core::chunking::{ChunkConfig, Chunker};
use regdoc_core::config::Settings;
use regdoc_core::error::ErrorKind;
use regdoc_core::traits::{EmbeddingProvider, VectorIndex};
use regdoc_core::types::{DistanceMetric, Metadata};
use regdoc_embed::{EmbeddingConfig, EmbeddingPool, HashingEmbedder};
use regdoc_retrieval::{DocumentPipeline, RetrievalConfig, RetrievalMode};
use regdoc_vector::{IndexConfig, InMemoryIndex};
use serde_json::json;
use tokio::sync::RwLock;

const DIM: usize = 256;

const MICA: &str = "Title II. Crypto-assets other than asset-referenced tokens\n\n\
Article 4. Offers to the public of crypto-assets\n\
An offeror shall publish a crypto-asset white paper before making an offer to the public.\n\n\
Article 36. Reserve of assets\n\
Issuers of asset-referenced tokens shall constitute and maintain a reserve of assets at all times.\n\n\
Article 45. Liquidity requirements\n\
Significant issuers shall ensure that the reserve of assets is held in highly liquid financial instruments.";

fn pipeline(retrieval: RetrievalConfig) -> DocumentPipeline<InMemoryIndex> {
    let chunker = Chunker::recursive(ChunkConfig::builder(120).with_overlap(0).build().expect("chunk config"));
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(DIM).expect("embedder"));
    let pool = EmbeddingPool::new(provider, EmbeddingConfig::new(2, 2).expect("embedding config"));
    let index = InMemoryIndex::new(IndexConfig::new("mica", DIM, DistanceMetric::Cosine).expect("index config"));
    DocumentPipeline::new(chunker, pool, Arc::new(RwLock::new(index)), retrieval)
}

fn source(name: &str) -> Metadata {
    let mut m = Metadata::new();
    m.insert("source".into(), json!(name));
    m
}

#[tokio::test]
async fn ingest_then_retrieve_finds_the_matching_article() {
    let p = pipeline(RetrievalConfig::new(3, 0.1, true, 0.95, true).expect("config"));
    let ids = p.ingest_document(MICA, &source("mica.txt")).await.expect("ingest");
    assert_eq!(ids.len(), p.chunk_document(MICA, &source("mica.txt")).len());
    assert_eq!(p.index().read().await.stats().count, ids.len());

    let article = "Issuers of asset-referenced tokens shall constitute and maintain a reserve of assets at all times.";
    let hits = p.retrieve(article, None).await.expect("retrieve");
    assert!(!hits.is_empty());
    assert_eq!(hits[0].text, article);
    assert!((hits[0].similarity - 1.0).abs() < 1e-4);
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), (1..=hits.len()).collect::<Vec<_>>());
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn records_carry_chunk_positions() {
    let p = pipeline(RetrievalConfig::default());
    let ids = p.ingest_document(MICA, &source("mica.txt")).await.expect("ingest");
    let chunks = p.chunk_document(MICA, &source("mica.txt"));
    let index = p.index().read().await;
    for (id, chunk) in ids.iter().zip(&chunks) {
        let record = index.get(id).expect("stored");
        assert_eq!(record.text, chunk.text);
        assert_eq!(record.metadata["source"], json!("mica.txt"));
        assert_eq!(record.metadata["chunk_index"], json!(chunk.chunk_index));
        assert_eq!(record.metadata["start_char"], json!(chunk.start_char));
        assert_eq!(record.metadata["end_char"], json!(chunk.end_char));
    }
}

#[tokio::test]
async fn filters_restrict_results_to_one_document() -> anyhow::Result<()> {
    let p = pipeline(RetrievalConfig::new(5, 0.0, false, 0.95, true)?);
    p.ingest_document(MICA, &source("mica.txt")).await?;
    p.ingest_document("Article 5. ICT risk management\nFinancial entities shall have an ICT risk management framework.", &source("dora.txt"))
        .await?;

    let hits = p.retrieve("risk management framework", Some(&source("dora.txt"))).await?;
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.metadata["source"] == json!("dora.txt")));
    Ok(())
}

#[tokio::test]
async fn empty_document_and_empty_index() {
    let p = pipeline(RetrievalConfig::default());
    assert!(p.retrieve("anything at all", None).await.expect("empty index").is_empty());
    assert!(p.ingest_document("   \n\n  ", &Metadata::new()).await.expect("blank").is_empty());
    assert_eq!(p.index().read().await.stats().count, 0);
}

#[tokio::test]
async fn concurrent_queries_share_the_index() {
    let p = pipeline(RetrievalConfig::new(2, 0.0, true, 0.95, true).expect("config"));
    p.ingest_document(MICA, &source("mica.txt")).await.expect("ingest");
    let (a, b) = tokio::join!(p.retrieve("white paper offer", None), p.retrieve("liquid financial instruments", None));
    let (a, b) = (a.expect("first"), b.expect("second"));
    assert!(!a.is_empty() && a.len() <= 2);
    assert!(!b.is_empty() && b.len() <= 2);
    assert!(b[0].text.contains("liquid financial instruments"));
}

#[tokio::test]
async fn hybrid_mode_fails_before_embedding() {
    let p = pipeline(RetrievalConfig::default().with_mode(RetrievalMode::Hybrid));
    let err = p.retrieve("reserve", None).await.expect_err("hybrid");
    assert_eq!(err.kind(), ErrorKind::Unimplemented);
}

#[tokio::test]
async fn from_settings_checks_dimensions() {
    let settings = Settings::default();
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(64).expect("embedder"));
    let index = InMemoryIndex::new(IndexConfig::try_from(&settings.index).expect("index config"));
    let err = DocumentPipeline::from_settings(&settings, provider, index).err().expect("64 != 384");
    assert_eq!(err.kind(), ErrorKind::Config);

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(settings.index.dimension).expect("embedder"));
    let index = InMemoryIndex::new(IndexConfig::try_from(&settings.index).expect("index config"));
    let p = DocumentPipeline::from_settings(&settings, provider, index).expect("pipeline");
    assert_eq!(p.chunker().config().chunk_size(), 512);
    assert_eq!(p.retriever().config().top_k(), 5);
}
