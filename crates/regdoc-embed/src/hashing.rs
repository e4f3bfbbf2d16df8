use std::hash::Hasher;

use anyhow::Result;
use regdoc_core::traits::EmbeddingProvider;
use twox_hash::XxHash64;

/// Feature-hashing embedder: every lowercase alphanumeric token lands in one
/// bucket with a hash-derived sign and weight, then the vector is L2-normalised.
///
/// Identical texts give identical vectors and texts sharing vocabulary score
/// higher than unrelated ones, which is all the retrieval tests need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        anyhow::ensure!(dim > 0, "embedding dimension must be positive");
        Ok(Self { dim })
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        let mut tokens = lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).peekable();
        if tokens.peek().is_none() {
            // punctuation-only input still needs a usable direction
            self.add_token(&mut v, lowered.trim());
        } else {
            for token in tokens {
                self.add_token(&mut v, token);
            }
        }

        let mut norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-6 {
            // colliding tokens cancelled out
            v.iter_mut().for_each(|x| *x = 0.0);
            self.add_token(&mut v, text);
            norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        }
        for x in &mut v {
            *x /= norm;
        }
        v
    }

    fn add_token(&self, v: &mut [f32], token: &str) {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        let h = hasher.finish();
        #[allow(clippy::cast_possible_truncation)]
        let idx = (h % self.dim as u64) as usize;
        let sign = if (h >> 31) & 1 == 0 { 1.0 } else { -1.0 };
        #[allow(clippy::cast_precision_loss)]
        let weight = 0.5 + 0.5 * (((h >> 32) as u32) as f32 / u32::MAX as f32);
        v[idx] += sign * weight;
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

    #[test]
    fn vectors_are_unit_length_and_deterministic() {
        let e = HashingEmbedder::new(64).expect("embedder");
        let out = e.embed(&["hello world".to_string(), "hello world".to_string(), "?!".to_string()]).expect("embed");
        for v in &out {
            assert_eq!(v.len(), 64);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "norm={norm}");
        }
        assert_eq!(out[0], out[1]);
    }

    #[test]
    fn tokenisation_ignores_case_and_punctuation() {
        let e = HashingEmbedder::new(128).expect("embedder");
        let out = e.embed(&["Crypto-Assets, issuers!".to_string(), "crypto assets issuers".to_string()]).expect("embed");
        assert!((cosine(&out[0], &out[1]) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }
}
