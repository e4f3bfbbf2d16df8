//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`APP_RETRIEVAL__TOP_K=3` sets `retrieval.top_k`).
//! Sections are plain data; each crate converts its section into a validated
//! domain config.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment. Defaults are layered underneath it.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if settings.embedding.dimension != settings.index.dimension {
            anyhow::bail!(
                "[{}] embedding.dimension ({}) must match index.dimension ({})",
                env,
                settings.embedding.dimension,
                settings.index.dimension
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub index: IndexSettings,
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub strategy: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
    pub split_on_newline: bool,
    pub respect_sentences: bool,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: "recursive".to_string(),
            chunk_size: 512,
            chunk_overlap: 50,
            min_chunk_size: 20,
            split_on_newline: true,
            respect_sentences: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub mode: String,
    pub top_k: usize,
    pub min_similarity: f32,
    pub filter_duplicates: bool,
    pub duplicate_threshold: f32,
    pub rerank: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            mode: "semantic".to_string(),
            top_k: 5,
            min_similarity: 0.6,
            filter_duplicates: true,
            duplicate_threshold: 0.95,
            rerank: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { name: "regulations".to_string(), dimension: 384, metric: "cosine".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dimension: usize,
    pub batch_size: usize,
    pub max_workers: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { dimension: 384, batch_size: 32, max_workers: 4 }
    }
}

/// `~` and `$VAR` / `${VAR}` expansion for paths given on the command line.
/// Unknown variables are left as written; the path is not canonicalized.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
