//! Chunking straight from the filesystem.
//!
//! The parser is picked from the file extension through [`ParserRegistry`];
//! unknown extensions are read as plain text.

use crate::chunker::{Chunk, Chunker, ChunkerConfig};
use crate::error::ChunkError;
use crate::parser::ParserRegistry;
use crate::tokenizer::{CharacterTokenizer, Tokenizer};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory names never descended into
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "target",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    "venv",
    ".venv",
    "build",
    "dist",
];

/// Generated files that are never worth chunking
const IGNORED_FILES: &[&str] = &["Cargo.lock", "package-lock.json", "yarn.lock"];

/// Check if a directory entry should be skipped
pub fn should_ignore(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    IGNORED_DIRS.contains(&name)
        || IGNORED_FILES.contains(&name)
        || name.ends_with(".min.js")
        || name.ends_with(".min.css")
}

/// Read a file as text. Invalid UTF-8 is decoded as Latin-1.
pub fn read_text(path: &Path) -> Result<String, ChunkError> {
    let bytes = fs::read(path).map_err(|source| ChunkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    })
}

/// Chunk one file with the parser registered for its extension.
///
/// The file path is recorded as every chunk's `source`.
pub fn chunk_file(
    path: impl AsRef<Path>,
    max_tokens: usize,
    overlap_tokens: usize,
    tokenizer: Option<Arc<dyn Tokenizer>>,
) -> Result<Vec<Chunk>> {
    let config = ChunkerConfig::new(max_tokens, overlap_tokens);
    let tokenizer = tokenizer.unwrap_or_else(|| Arc::new(CharacterTokenizer::new()));
    chunk_file_with(
        path.as_ref(),
        config,
        tokenizer,
        &ParserRegistry::with_defaults(),
    )
}

pub(crate) fn chunk_file_with(
    path: &Path,
    mut config: ChunkerConfig,
    tokenizer: Arc<dyn Tokenizer>,
    registry: &ParserRegistry,
) -> Result<Vec<Chunk>> {
    let text = read_text(path)?;
    if config.source.is_none() {
        config.source = Some(path.display().to_string());
    }
    let chunker = Chunker::new(config, tokenizer)?.with_parser(registry.select(path));
    let chunks = chunker
        .chunk(&text)
        .with_context(|| format!("Failed to chunk file: {}", path.display()))?;

    debug!(
        path = %path.display(),
        parser = chunker.parser().name(),
        chunks = chunks.len(),
        "chunked file"
    );
    Ok(chunks)
}

/// Chunk several files, skipping (and logging) those that fail
pub fn chunk_files<P: AsRef<Path>>(
    paths: &[P],
    max_tokens: usize,
    overlap_tokens: usize,
    tokenizer: Option<Arc<dyn Tokenizer>>,
) -> Result<Vec<Chunk>> {
    let config = ChunkerConfig::new(max_tokens, overlap_tokens);
    config.validate()?;
    let tokenizer = tokenizer.unwrap_or_else(|| Arc::new(CharacterTokenizer::new()));
    let registry = ParserRegistry::with_defaults();

    let mut all_chunks = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match chunk_file_with(path, config.clone(), Arc::clone(&tokenizer), &registry) {
            Ok(chunks) => all_chunks.extend(chunks),
            Err(e) => warn!(path = %path.display(), error = %format!("{:#}", e), "skipping file"),
        }
    }
    Ok(all_chunks)
}

/// Chunk every supported file under `dir`.
///
/// Files are visited in name order so the output is stable. `extensions`
/// (with or without a leading dot, any case) narrows the selection further.
pub fn chunk_directory(
    dir: impl AsRef<Path>,
    recursive: bool,
    extensions: Option<&[&str]>,
    max_tokens: usize,
    overlap_tokens: usize,
    tokenizer: Option<Arc<dyn Tokenizer>>,
) -> Result<Vec<Chunk>> {
    let files = collect_files(dir.as_ref(), recursive, extensions)?;
    chunk_files(&files, max_tokens, overlap_tokens, tokenizer)
}

/// Walk `dir` and collect the files [`chunk_directory`] would chunk
pub fn collect_files(
    dir: &Path,
    recursive: bool,
    extensions: Option<&[&str]>,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }

    let wanted: Option<Vec<String>> = extensions.map(|exts| {
        exts.iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    });
    let registry = ParserRegistry::with_defaults();
    let mut walker = WalkDir::new(dir).follow_links(false).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_ignore(e.path()))
    {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if !entry.file_type().is_file() || !registry.supports(path) {
            continue;
        }
        if let Some(wanted) = &wanted {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .unwrap_or_default();
            if !wanted.contains(&ext) {
                continue;
            }
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}
