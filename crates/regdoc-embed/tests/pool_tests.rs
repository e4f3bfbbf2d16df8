use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regdoc_core::traits::EmbeddingProvider;
use regdoc_embed::{EmbeddingConfig, EmbeddingPool, HashingEmbedder};

/// Sleeps inside `embed` and tracks how many calls overlap.
#[derive(Default)]
struct SlowProvider {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl EmbeddingProvider for SlowProvider {
    fn dim(&self) -> usize { 2 }

    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
}

struct FailingProvider;

impl EmbeddingProvider for FailingProvider {
    fn dim(&self) -> usize { 2 }

    fn embed(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("backend unavailable")
    }
}

/// Records batch sizes and answers with one vector too few.
#[derive(Default)]
struct ShortProvider {
    batches: Mutex<Vec<usize>>,
}

impl EmbeddingProvider for ShortProvider {
    fn dim(&self) -> usize { 2 }

    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.batches.lock().expect("lock").push(texts.len());
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
    }
}

#[tokio::test]
async fn pool_preserves_input_order() {
    let pool = EmbeddingPool::new(Arc::new(SlowProvider::default()), EmbeddingConfig::new(2, 3).expect("config"));
    let texts: Vec<String> = (1..=9).map(|n| "x".repeat(n)).collect();
    let out = pool.embed(texts).await.expect("embed");
    let lengths: Vec<f32> = out.iter().map(|v| v[0]).collect();
    assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
}

#[tokio::test]
async fn pool_never_exceeds_max_workers() {
    let provider = Arc::new(SlowProvider::default());
    let pool = EmbeddingPool::new(provider.clone(), EmbeddingConfig::new(1, 2).expect("config"));
    let texts: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();

    let (a, b) = tokio::join!(pool.embed(texts.clone()), pool.embed(texts));
    assert_eq!(a.expect("first").len(), 8);
    assert_eq!(b.expect("second").len(), 8);
    assert!(provider.peak.load(Ordering::SeqCst) <= 2, "peak concurrency {}", provider.peak.load(Ordering::SeqCst));
}

#[tokio::test]
async fn pool_surfaces_provider_failures() {
    let pool = EmbeddingPool::new(Arc::new(FailingProvider), EmbeddingConfig::default());
    let err = pool.embed(vec!["anything".into()]).await.expect_err("provider fails");
    assert!(err.to_string().contains("backend unavailable"), "{err}");
    assert!(pool.embed(Vec::new()).await.is_err(), "empty input is rejected");
}

#[tokio::test]
async fn embed_one_returns_a_unit_vector() {
    let pool = EmbeddingPool::new(Arc::new(HashingEmbedder::new(16).expect("embedder")), EmbeddingConfig::default());
    let v = pool.embed_one("capital requirements".into()).await.expect("embed");
    assert_eq!(v.len(), pool.dim());
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn pool_batches_and_checks_every_response() {
    let provider = Arc::new(ShortProvider::default());
    let pool = EmbeddingPool::new(provider.clone(), EmbeddingConfig::new(3, 1).expect("config"));
    let texts: Vec<String> = (0..7).map(|i| format!("t{i}")).collect();
    let err = pool.embed(texts).await.expect_err("short response");
    assert!(err.to_string().contains("vectors for"), "{err}");
    let batches = provider.batches.lock().expect("lock").clone();
    assert!(!batches.is_empty());
    assert!(batches.iter().all(|&n| n <= 3), "batches {batches:?}");
}
