use std::fmt;
use std::str::FromStr;

use regdoc_core::config::RetrievalSettings;
use regdoc_core::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RetrievalMode {
    #[default]
    Semantic,
    /// Semantic plus keyword signals. Not implemented; requests fail with
    /// `Error::Unimplemented`.
    Hybrid,
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalMode::Semantic => f.write_str("semantic"),
            RetrievalMode::Hybrid => f.write_str("hybrid"),
        }
    }
}

impl FromStr for RetrievalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semantic" => Ok(RetrievalMode::Semantic),
            "hybrid" => Ok(RetrievalMode::Hybrid),
            other => Err(Error::InvalidConfig(format!("unknown retrieval mode '{other}'"))),
        }
    }
}

/// Validated retrieval parameters.
///
/// - `top_k`: positive
/// - `min_similarity`, `duplicate_threshold`: within `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    mode: RetrievalMode,
    top_k: usize,
    min_similarity: f32,
    filter_duplicates: bool,
    duplicate_threshold: f32,
    rerank: bool,
}

impl RetrievalConfig {
    pub fn new(
        top_k: usize,
        min_similarity: f32,
        filter_duplicates: bool,
        duplicate_threshold: f32,
        rerank: bool,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be positive".into()));
        }
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(Error::InvalidConfig(format!("min_similarity ({min_similarity}) must be between 0 and 1")));
        }
        if !(0.0..=1.0).contains(&duplicate_threshold) {
            return Err(Error::InvalidConfig(format!(
                "duplicate_threshold ({duplicate_threshold}) must be between 0 and 1"
            )));
        }
        Ok(Self { mode: RetrievalMode::Semantic, top_k, min_similarity, filter_duplicates, duplicate_threshold, rerank })
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RetrievalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RetrievalMode { self.mode }
    pub fn top_k(&self) -> usize { self.top_k }
    pub fn min_similarity(&self) -> f32 { self.min_similarity }
    pub fn filter_duplicates(&self) -> bool { self.filter_duplicates }
    pub fn duplicate_threshold(&self) -> f32 { self.duplicate_threshold }
    pub fn rerank(&self) -> bool { self.rerank }

    /// Candidates to request from the index; doubled when duplicates will be dropped.
    pub fn candidate_count(&self) -> usize {
        if self.filter_duplicates { self.top_k * 2 } else { self.top_k }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let d = RetrievalSettings::default();
        Self {
            mode: RetrievalMode::Semantic,
            top_k: d.top_k,
            min_similarity: d.min_similarity,
            filter_duplicates: d.filter_duplicates,
            duplicate_threshold: d.duplicate_threshold,
            rerank: d.rerank,
        }
    }
}

impl TryFrom<&RetrievalSettings> for RetrievalConfig {
    type Error = Error;

    fn try_from(s: &RetrievalSettings) -> Result<Self> {
        Ok(RetrievalConfig::new(s.top_k, s.min_similarity, s.filter_duplicates, s.duplicate_threshold, s.rerank)?
            .with_mode(s.mode.parse()?))
    }
}
