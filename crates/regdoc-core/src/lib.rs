//! regdoc-core
//!
//! Domain types, error taxonomy, capability traits, configuration and the
//! chunking engine shared by the other `regdoc-*` crates.

pub mod chunking;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunking::{ChunkConfig, Chunker, ChunkingStrategy};
pub use error::{Error, ErrorKind, Result};
pub use traits::{EmbeddingProvider, VectorIndex};
pub use types::{DistanceMetric, Metadata, RetrievedChunk, SearchResult, TextChunk, VectorRecord};
