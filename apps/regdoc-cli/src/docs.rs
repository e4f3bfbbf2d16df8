use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use regdoc_core::types::Metadata;

/// A plain-text document read from disk.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
    pub metadata: Metadata,
}

/// `.txt` files under `root`, sorted. A file path is returned as-is.
pub fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    files.sort();
    files
}

/// Read a document; invalid UTF-8 is replaced rather than rejected.
pub fn read_document(path: &Path, root: &Path) -> Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());

    let mut metadata = Metadata::new();
    let doc_id = path.file_stem().map_or_else(|| path.to_string_lossy(), |s| s.to_string_lossy()).into_owned();
    metadata.insert("doc_id".into(), json!(doc_id));
    metadata.insert("source".into(), json!(path.to_string_lossy()));
    metadata.insert("category".into(), json!(category(path, root)));
    Ok(Document { path: path.to_path_buf(), text, metadata })
}

/// Parent directory relative to the ingest root, or `misc` at the top level.
fn category(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .and_then(Path::to_str)
        .filter(|p| !p.is_empty())
        .unwrap_or("misc")
        .to_string()
}
