//! Retrieval over a populated vector index.
//!
//! `Retriever` is the synchronous core. `DocumentPipeline` wires chunking, the
//! embedding pool and a shared index into the async operations callers use.

mod config;
mod pipeline;
mod retriever;

pub use config::{RetrievalConfig, RetrievalMode};
pub use pipeline::DocumentPipeline;
pub use retriever::Retriever;
