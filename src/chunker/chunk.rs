use crate::error::TokenizerError;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// A chunk of text ready for embedding/indexing.
///
/// Immutable once built: fields are private and only readable through
/// accessors. `chunk_id` is derived from the text and position, so equal
/// input always yields an equal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    chunk_id: String,
    text: String,
    /// Count from the tokenizer that packed the chunk
    token_count: usize,
    /// Counts keyed by tokenizer name, the packing tokenizer included
    token_counts: BTreeMap<String, usize>,
    #[serde(flatten)]
    metadata: ChunkMetadata,
}

/// Provenance of a chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    source: Option<String>,
    /// Byte span `(start, end)` in the original document
    position: (usize, usize),
    /// Rendered section path, e.g. "Chapter 1 > Section 1.1"
    section_header: Option<String>,
    /// Set on hard-split pieces: the id the oversized unit would have had
    parent_chunk_id: Option<String>,
    chunk_index: usize,
    total_chunks: usize,
    /// Caller-supplied fields, carried through untouched
    #[serde(default)]
    custom: BTreeMap<String, Value>,
}

/// Content address of a chunk: lowercase hex SHA-256 of
/// `text ‖ 0x1F ‖ "{start}:{end}"`.
pub fn chunk_id(text: &str, position: (usize, usize)) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0x1F]);
    hasher.update(format!("{}:{}", position.0, position.1).as_bytes());
    hex::encode(hasher.finalize())
}

impl Chunk {
    pub fn new(text: impl Into<String>, token_count: usize, metadata: ChunkMetadata) -> Self {
        let text = text.into();
        Self {
            chunk_id: chunk_id(&text, metadata.position),
            text,
            token_count,
            token_counts: BTreeMap::new(),
            metadata,
        }
    }

    /// Record the count of `tokenizer` (does not change `token_count`)
    pub fn with_token_count(mut self, tokenizer: impl Into<String>, count: usize) -> Self {
        self.token_counts.insert(tokenizer.into(), count);
        self
    }

    /// Count the text with another tokenizer and record the result under its
    /// name, e.g. to see what a chunk costs for a second model
    pub fn count_with(self, tokenizer: &dyn Tokenizer) -> Result<Self, TokenizerError> {
        let count = tokenizer.count_tokens(&self.text)?;
        Ok(self.with_token_count(tokenizer.name(), count))
    }

    /// Attach a custom metadata field; the chunk id is unaffected
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.custom.insert(key.into(), value.into());
        self
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn token_counts(&self) -> &BTreeMap<String, usize> {
        &self.token_counts
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }

    pub fn position(&self) -> (usize, usize) {
        self.metadata.position
    }

    /// Flat JSON object with stable field names
    pub fn to_json_value(&self) -> serde_json::Value {
        let m = &self.metadata;
        json!({
            "chunk_id": self.chunk_id,
            "text": self.text,
            "token_count": self.token_count,
            "token_counts": self.token_counts,
            "source": m.source,
            "position": [m.position.0, m.position.1],
            "section_header": m.section_header,
            "parent_chunk_id": m.parent_chunk_id,
            "chunk_index": m.chunk_index,
            "total_chunks": m.total_chunks,
            "custom": m.custom,
        })
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        let value = self.to_json_value();
        if pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(50).collect();
        let ellipsis = if preview.len() < self.text.len() { "..." } else { "" };
        write!(f, "Chunk({}): {:?}{}", &self.chunk_id[..8], preview, ellipsis)
    }
}

impl ChunkMetadata {
    pub fn new(position: (usize, usize)) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_source(self, source: Option<String>) -> Self {
        Self { source, ..self }
    }

    pub fn with_section_header(self, section_header: Option<String>) -> Self {
        Self {
            section_header,
            ..self
        }
    }

    pub fn with_parent_chunk_id(self, parent_chunk_id: Option<String>) -> Self {
        Self {
            parent_chunk_id,
            ..self
        }
    }

    pub fn with_index(self, chunk_index: usize, total_chunks: usize) -> Self {
        Self {
            chunk_index,
            total_chunks,
            ..self
        }
    }

    pub fn with_custom(self, custom: BTreeMap<String, Value>) -> Self {
        Self { custom, ..self }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn position(&self) -> (usize, usize) {
        self.position
    }

    pub fn section_header(&self) -> Option<&str> {
        self.section_header.as_deref()
    }

    pub fn parent_chunk_id(&self) -> Option<&str> {
        self.parent_chunk_id.as_deref()
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    pub fn custom(&self) -> &BTreeMap<String, Value> {
        &self.custom
    }
}
