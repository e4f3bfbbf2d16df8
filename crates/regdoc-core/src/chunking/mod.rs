//! Document chunking.
//!
//! Two strategies share one contract: `chunk(text, metadata) -> Vec<TextChunk>`.
//! `Simple` walks a size-bounded window and pulls its end back to a sentence or
//! line boundary. `Recursive` descends paragraph -> line -> sentence -> fixed
//! character offsets until every piece fits.
//!
//! Sizes and offsets count chars, so multi-byte text never splits inside a
//! code point and `chunk.text == source[start_char..end_char]`.

mod recursive;
mod simple;
pub(crate) mod text;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::{Metadata, TextChunk};
use text::CharText;

/// Validated chunking parameters. Construct with [`ChunkConfig::new`] or
/// [`ChunkConfig::builder`]; the fields cannot be changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkConfig {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
    split_on_newline: bool,
    respect_sentences: bool,
}

impl ChunkConfig {
    pub fn new(
        chunk_size: usize,
        chunk_overlap: usize,
        min_chunk_size: usize,
        split_on_newline: bool,
        respect_sentences: bool,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        if min_chunk_size == 0 {
            return Err(Error::InvalidConfig("min_chunk_size must be positive".into()));
        }
        if min_chunk_size > chunk_size {
            return Err(Error::InvalidConfig(format!(
                "min_chunk_size ({min_chunk_size}) must not exceed chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap, min_chunk_size, split_on_newline, respect_sentences })
    }

    /// Start from the default overlap and boundary settings with the given size.
    pub fn builder(chunk_size: usize) -> ChunkConfigBuilder {
        let defaults = ChunkingSettings::default();
        ChunkConfigBuilder {
            chunk_size,
            chunk_overlap: defaults.chunk_overlap,
            min_chunk_size: defaults.min_chunk_size,
            split_on_newline: defaults.split_on_newline,
            respect_sentences: defaults.respect_sentences,
        }
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }
    pub fn chunk_overlap(&self) -> usize { self.chunk_overlap }
    pub fn min_chunk_size(&self) -> usize { self.min_chunk_size }
    pub fn split_on_newline(&self) -> bool { self.split_on_newline }
    pub fn respect_sentences(&self) -> bool { self.respect_sentences }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        let d = ChunkingSettings::default();
        Self {
            chunk_size: d.chunk_size,
            chunk_overlap: d.chunk_overlap,
            min_chunk_size: d.min_chunk_size,
            split_on_newline: d.split_on_newline,
            respect_sentences: d.respect_sentences,
        }
    }
}

impl TryFrom<&ChunkingSettings> for ChunkConfig {
    type Error = Error;

    fn try_from(s: &ChunkingSettings) -> Result<Self> {
        ChunkConfig::new(s.chunk_size, s.chunk_overlap, s.min_chunk_size, s.split_on_newline, s.respect_sentences)
    }
}

#[derive(Debug, Clone)]
pub struct ChunkConfigBuilder {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
    split_on_newline: bool,
    respect_sentences: bool,
}

impl ChunkConfigBuilder {
    pub fn with_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Self {
        self.min_chunk_size = min_chunk_size;
        self
    }

    pub fn with_split_on_newline(mut self, split_on_newline: bool) -> Self {
        self.split_on_newline = split_on_newline;
        self
    }

    pub fn with_respect_sentences(mut self, respect_sentences: bool) -> Self {
        self.respect_sentences = respect_sentences;
        self
    }

    pub fn build(self) -> Result<ChunkConfig> {
        ChunkConfig::new(
            self.chunk_size,
            self.chunk_overlap,
            self.min_chunk_size,
            self.split_on_newline,
            self.respect_sentences,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    Simple,
    #[default]
    Recursive,
}

impl fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkingStrategy::Simple => f.write_str("simple"),
            ChunkingStrategy::Recursive => f.write_str("recursive"),
        }
    }
}

impl FromStr for ChunkingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(ChunkingStrategy::Simple),
            "recursive" => Ok(ChunkingStrategy::Recursive),
            other => Err(Error::InvalidConfig(format!("unknown chunking strategy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    strategy: ChunkingStrategy,
    config: ChunkConfig,
}

impl Chunker {
    pub fn new(strategy: ChunkingStrategy, config: ChunkConfig) -> Self {
        Self { strategy, config }
    }

    pub fn simple(config: ChunkConfig) -> Self {
        Self::new(ChunkingStrategy::Simple, config)
    }

    pub fn recursive(config: ChunkConfig) -> Self {
        Self::new(ChunkingStrategy::Recursive, config)
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Ok(Self::new(settings.strategy.parse()?, ChunkConfig::try_from(settings)?))
    }

    pub fn strategy(&self) -> ChunkingStrategy { self.strategy }
    pub fn config(&self) -> &ChunkConfig { &self.config }

    /// Split `text` into chunks. Empty input yields no chunks.
    pub fn chunk(&self, text: &str, metadata: &Metadata) -> Vec<TextChunk> {
        if text.is_empty() {
            return Vec::new();
        }
        let doc = CharText::new(text);
        let mut sink = ChunkSink::new(&doc, metadata);
        match self.strategy {
            ChunkingStrategy::Simple => simple::chunk(&self.config, &doc, &mut sink),
            ChunkingStrategy::Recursive => recursive::chunk(&self.config, &doc, &mut sink),
        }
        let chunks = sink.finish();
        tracing::debug!(strategy = %self.strategy, chars = doc.len(), chunks = chunks.len(), "chunked document");
        chunks
    }
}

/// Collects chunks in emission order and hands out contiguous indices.
pub(crate) struct ChunkSink<'d, 'a> {
    doc: &'d CharText<'a>,
    metadata: &'d Metadata,
    chunks: Vec<TextChunk>,
}

impl<'d, 'a> ChunkSink<'d, 'a> {
    fn new(doc: &'d CharText<'a>, metadata: &'d Metadata) -> Self {
        Self { doc, metadata, chunks: Vec::new() }
    }

    /// Emit the trimmed span `[start, end)`; whitespace-only spans are skipped.
    pub(crate) fn emit(&mut self, start: usize, end: usize) {
        let Some((start, end)) = self.doc.trim(start, end) else { return };
        self.chunks.push(TextChunk {
            text: self.doc.slice(start, end).to_string(),
            metadata: self.metadata.clone(),
            start_char: start,
            end_char: end,
            chunk_index: self.chunks.len(),
        });
    }

    fn finish(self) -> Vec<TextChunk> {
        self.chunks
    }
}
