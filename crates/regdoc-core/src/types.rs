//! Domain types shared by the chunking, index and retrieval crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type RecordId = String;
pub type Metadata = HashMap<String, serde_json::Value>;

/// A contiguous slice of a source document.
///
/// - `text`: exactly `source[start_char..end_char]`, counted in chars
/// - `metadata`: an owned copy of the caller's document metadata
/// - `chunk_index`: position within one chunking call, contiguous from 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub metadata: Metadata,
    pub start_char: usize,
    pub end_char: usize,
    pub chunk_index: usize,
}

impl TextChunk {
    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}

/// A stored entry of a vector index. `embedding` is unit length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: RecordId,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

/// A record paired with its metric-native score.
///
/// For `Cosine` and `Dot` a higher score is better; for `Euclidean` lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub record: VectorRecord,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub count: usize,
    pub dimension: usize,
    pub name: String,
    pub metric: DistanceMetric,
}

/// A passage returned by retrieval. `rank` is 1-based and dense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: RecordId,
    pub text: String,
    pub metadata: Metadata,
    pub similarity: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    Dot,
}

impl DistanceMetric {
    /// True when larger scores rank first.
    pub fn higher_is_better(self) -> bool {
        !matches!(self, DistanceMetric::Euclidean)
    }

    /// Map a metric-native score onto the cosine scale.
    ///
    /// Stored and query vectors are unit length, so `|a - b|² = 2 - 2·cos`.
    pub fn similarity(self, score: f32) -> f32 {
        match self {
            DistanceMetric::Cosine | DistanceMetric::Dot => score,
            DistanceMetric::Euclidean => 1.0 - (score * score) / 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Dot => "dot",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "dot" | "dot_product" => Ok(DistanceMetric::Dot),
            other => Err(Error::InvalidConfig(format!("unknown distance metric '{other}'"))),
        }
    }
}
