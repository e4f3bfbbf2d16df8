//! `regdoc`: chunk regulatory text files and query them from an in-process index.
//!
//! ```text
//! regdoc chunk <path>
//! regdoc ingest-query <path> <query> [--top-k N] [--min-similarity X]
//! ```
//!
//! Settings come from `config.toml`, `config.<env>.toml` and `APP_*` variables.

mod docs;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use regdoc_core::chunking::Chunker;
use regdoc_core::config::{expand_path, Config, Settings};
use regdoc_core::traits::EmbeddingProvider;
use regdoc_embed::HashingEmbedder;
use regdoc_retrieval::DocumentPipeline;
use regdoc_vector::{IndexConfig, InMemoryIndex};

const USAGE: &str = "Usage:\n  regdoc chunk <path>\n  regdoc ingest-query <path> <query> [--top-k N] [--min-similarity X]";

enum Command {
    Chunk { path: PathBuf },
    IngestQuery { path: PathBuf, query: String, top_k: Option<usize>, min_similarity: Option<f32> },
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some((cmd, rest)) = args.split_first() else { bail!("{USAGE}") };
    let mut positional = Vec::new();
    let mut top_k = None;
    let mut min_similarity = None;
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--top-k" | "-k" => {
                let value = iter.next().context("--top-k requires a number")?;
                top_k = Some(value.parse().with_context(|| format!("--top-k: '{value}' is not a number"))?);
            }
            "--min-similarity" => {
                let value = iter.next().context("--min-similarity requires a number")?;
                min_similarity = Some(value.parse().with_context(|| format!("--min-similarity: '{value}' is not a number"))?);
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            _ => positional.push(arg.clone()),
        }
    }

    match (cmd.as_str(), positional.as_slice()) {
        ("chunk", [path]) => Ok(Command::Chunk { path: expand_path(path) }),
        ("ingest-query", [path, query]) => {
            Ok(Command::IngestQuery { path: expand_path(path), query: query.clone(), top_k, min_similarity })
        }
        _ => bail!("{USAGE}"),
    }
}

fn list_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    let files = docs::list_txt_files(path);
    if files.is_empty() {
        tracing::warn!(path = %path.display(), "no .txt files found");
    }
    Ok(files)
}

fn run_chunk(settings: &Settings, path: &Path) -> Result<()> {
    let chunker = Chunker::from_settings(&settings.chunking)?;
    for file in list_inputs(path)? {
        let doc = docs::read_document(&file, path)?;
        let chunks = chunker.chunk(&doc.text, &doc.metadata);
        println!("{} ({} chunks, strategy {})", doc.path.display(), chunks.len(), chunker.strategy());
        for chunk in &chunks {
            let preview: String = chunk.text.chars().take(60).collect::<String>().replace('\n', " ");
            println!("  #{:<4} [{:>6}..{:<6}) {:>4} chars  {preview}", chunk.chunk_index, chunk.start_char, chunk.end_char, chunk.char_len());
        }
    }
    Ok(())
}

async fn run_ingest_query(settings: Settings, path: &Path, query: &str) -> Result<()> {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(settings.embedding.dimension)?);
    let index = InMemoryIndex::new(IndexConfig::try_from(&settings.index)?);
    let pipeline = DocumentPipeline::from_settings(&settings, provider, index)?;

    let files = list_inputs(path)?;
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );
    let mut total_chunks = 0usize;
    for file in &files {
        let doc = docs::read_document(file, path)?;
        pb.set_message(doc.path.display().to_string());
        total_chunks += pipeline.ingest_document(&doc.text, &doc.metadata).await?.len();
        pb.inc(1);
    }
    pb.finish_with_message(format!("{total_chunks} chunks indexed"));

    let results = pipeline.retrieve(query, None).await?;
    if results.is_empty() {
        println!("No passages above similarity {:.2}.", settings.retrieval.min_similarity);
    }
    for hit in &results {
        let source = hit.metadata.get("source").and_then(|v| v.as_str()).unwrap_or("?");
        println!("\n#{} similarity {:.3}  {} [{}]", hit.rank, hit.similarity, source, hit.id);
        println!("{}", hit.text);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().context("failed to load configuration")?;
    let mut settings = config.settings()?;
    let args: Vec<String> = env::args().skip(1).collect();

    match parse_args(&args)? {
        Command::Chunk { path } => run_chunk(&settings, &path),
        Command::IngestQuery { path, query, top_k, min_similarity } => {
            if let Some(k) = top_k {
                settings.retrieval.top_k = k;
            }
            if let Some(min) = min_similarity {
                settings.retrieval.min_similarity = min;
            }
            run_ingest_query(settings, &path, &query).await
        }
    }
}
