use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use regdoc_core::config::EmbeddingSettings;
use regdoc_core::error::ErrorKind;
use regdoc_core::traits::EmbeddingProvider;
use regdoc_embed::{BatchingEmbedder, EmbeddingConfig, HashingEmbedder};

/// Records the size of every batch it receives.
struct RecordingProvider {
    dim: usize,
    batches: Mutex<Vec<usize>>,
}

impl EmbeddingProvider for RecordingProvider {
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.batches.lock().expect("lock").push(texts.len());
        Ok(texts.iter().map(|_| vec![1.0; self.dim]).collect())
    }
}

/// Misbehaves in a configurable way.
struct BrokenProvider {
    drop_one: bool,
    calls: AtomicUsize,
}

impl EmbeddingProvider for BrokenProvider {
    fn dim(&self) -> usize { 4 }

    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.drop_one {
            Ok(texts.iter().skip(1).map(|_| vec![0.5; 4]).collect())
        } else {
            Ok(texts.iter().map(|_| vec![0.5; 3]).collect())
        }
    }
}

fn texts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("text number {i}")).collect()
}

#[test]
fn config_rejects_zero_limits() {
    assert_eq!(EmbeddingConfig::new(0, 4).expect_err("batch").kind(), ErrorKind::Config);
    assert_eq!(EmbeddingConfig::new(8, 0).expect_err("workers").kind(), ErrorKind::Config);
    let from_settings = EmbeddingConfig::try_from(&EmbeddingSettings::default()).expect("defaults");
    assert_eq!(from_settings, EmbeddingConfig::default());
    assert_eq!(from_settings.batch_size(), 32);
}

#[test]
fn batches_are_bounded_by_batch_size() {
    let provider = RecordingProvider { dim: 3, batches: Mutex::new(Vec::new()) };
    let embedder = BatchingEmbedder::new(provider, EmbeddingConfig::new(4, 1).expect("config"));
    let out = embedder.embed(&texts(10)).expect("embed");
    assert_eq!(out.len(), 10);
    assert_eq!(*embedder.inner().batches.lock().expect("lock"), vec![4, 4, 2]);
}

#[test]
fn empty_input_is_rejected_without_calling_the_provider() {
    let provider = RecordingProvider { dim: 3, batches: Mutex::new(Vec::new()) };
    let embedder = BatchingEmbedder::new(provider, EmbeddingConfig::default());
    assert!(embedder.embed(&[]).is_err());
    assert!(embedder.inner().batches.lock().expect("lock").is_empty());
}

#[test]
fn short_or_misshapen_responses_fail_explicitly() {
    let config = EmbeddingConfig::new(2, 1).expect("config");
    let missing = BatchingEmbedder::new(BrokenProvider { drop_one: true, calls: AtomicUsize::new(0) }, config);
    let err = missing.embed(&texts(5)).expect_err("one vector short");
    assert!(err.to_string().contains("1 vectors for 2 inputs"), "{err}");
    assert_eq!(missing.inner().calls.load(Ordering::SeqCst), 1, "stops at the first bad batch");

    let wrong_dim = BatchingEmbedder::new(BrokenProvider { drop_one: false, calls: AtomicUsize::new(0) }, config);
    let err = wrong_dim.embed(&texts(2)).expect_err("wrong dimension");
    assert!(err.to_string().contains("expected 4"), "{err}");
}

#[test]
fn hashing_embedder_through_batching_matches_direct_calls() {
    let hashing = HashingEmbedder::new(32).expect("embedder");
    let embedder = BatchingEmbedder::new(hashing, EmbeddingConfig::new(3, 1).expect("config"));
    let input = texts(7);
    let batched = embedder.embed(&input).expect("batched");
    let direct = hashing.embed(&input).expect("direct");
    assert_eq!(batched, direct);
    assert_eq!(embedder.dim(), 32);
}
