//! Vector index implementations.
//!
//! `InMemoryIndex` is the reference backend: a vector of records plus an id
//! lookup table, scanned exhaustively per query. Persistent or approximate
//! backends implement the same `regdoc_core::traits::VectorIndex` trait.

pub mod distance;
mod memory;

pub use memory::InMemoryIndex;

use serde::Serialize;

use regdoc_core::config::IndexSettings;
use regdoc_core::error::{Error, Result};
use regdoc_core::types::DistanceMetric;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexConfig {
    name: String,
    dimension: usize,
    metric: DistanceMetric,
}

impl IndexConfig {
    pub fn new(name: impl Into<String>, dimension: usize, metric: DistanceMetric) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidConfig("index.name must not be empty".into()));
        }
        if dimension == 0 {
            return Err(Error::InvalidConfig("index.dimension must be positive".into()));
        }
        Ok(Self { name, dimension, metric })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn dimension(&self) -> usize { self.dimension }
    pub fn metric(&self) -> DistanceMetric { self.metric }
}

impl TryFrom<&IndexSettings> for IndexConfig {
    type Error = Error;

    fn try_from(s: &IndexSettings) -> Result<Self> {
        IndexConfig::new(s.name.clone(), s.dimension, s.metric.parse()?)
    }
}
