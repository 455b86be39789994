//! Token-bounded chunk packing.
//!
//! Elements from a [`Parser`] are broken into packing units (sentences for
//! prose, whole blocks for code, lists and headers) and greedily packed into
//! chunks that never exceed `max_tokens`. Units that are too large on their
//! own are hard-split at token boundaries as a last resort.

mod chunk;
mod splitter;


pub use chunk::{chunk_id, Chunk, ChunkMetadata};

use crate::error::{ChunkError, ConfigError};
use crate::parser::{MarkdownParser, Parser, StructuralElement};
use crate::segmenter::Segmenter;
use crate::tokenizer::Tokenizer;
use anyhow::Context;
use serde::{Deserialize, Serialize};
pub(crate) use splitter::{Draft, Packer, PackingUnit};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Maximum target tokens per chunk (configurable)
pub const DEFAULT_MAX_TOKENS: usize = 500;

/// Tokens of trailing context repeated at the start of the next chunk
pub const DEFAULT_OVERLAP_TOKENS: usize = 0;

/// Packing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
    pub overlap_tokens: usize,
    /// Keep fenced code blocks in one piece
    pub preserve_code_blocks: bool,
    /// Keep lists in one piece
    pub preserve_lists: bool,
    /// Copied into every chunk's metadata
    pub source: Option<String>,
    /// Copied into every chunk's `custom` metadata
    pub custom: BTreeMap<String, serde_json::Value>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            preserve_code_blocks: true,
            preserve_lists: true,
            source: None,
            custom: BTreeMap::new(),
        }
    }
}

impl ChunkerConfig {
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            max_tokens,
            overlap_tokens,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.overlap_tokens,
                max: self.max_tokens,
            });
        }
        Ok(())
    }

    /// Load a config from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse chunker config")?;
        config.validate()?;
        Ok(config)
    }
}

/// Structure-aware chunker.
///
/// Holds only immutable collaborators, so one instance can be shared across
/// threads and reused for any number of documents.
#[derive(Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    tokenizer: Arc<dyn Tokenizer>,
    parser: Arc<dyn Parser>,
    segmenter: Segmenter,
}

impl Chunker {
    /// Create a chunker, rejecting an invalid config up front
    pub fn new(config: ChunkerConfig, tokenizer: Arc<dyn Tokenizer>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            tokenizer,
            parser: Arc::new(MarkdownParser::new()),
            segmenter: Segmenter::new(),
        })
    }

    pub fn with_parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    pub fn parser(&self) -> &Arc<dyn Parser> {
        &self.parser
    }

    /// Parse `text` with the configured parser and pack the result.
    ///
    /// Chunks are sliced from the document's source, which is `text` itself
    /// unless the parser renders markup (HTML, JSON, CSV) into readable text.
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, ChunkError> {
        let document = self.parser.parse(text);
        self.pack(document.source(text), &document.elements)
    }

    /// Pack already-parsed elements of `source` into chunks.
    ///
    /// Chunk text is sliced verbatim from `source`, so every element's span
    /// must hold exactly its content in that same string. Elements from any
    /// other text are rejected with [`ChunkError::ForeignElement`].
    pub fn pack(
        &self,
        source: &str,
        elements: &[StructuralElement],
    ) -> Result<Vec<Chunk>, ChunkError> {
        if let Some(element) = elements
            .iter()
            .find(|el| source.get(el.start..el.end) != Some(el.content.as_str()))
        {
            return Err(ChunkError::ForeignElement {
                start: element.start,
                end: element.end,
                source_len: source.len(),
            });
        }

        let packer = Packer {
            source,
            config: &self.config,
            tokenizer: self.tokenizer.as_ref(),
        };
        let units = packer.units(elements, &self.segmenter)?;
        let drafts = packer.pack(&units)?;
        let chunks = assemble(drafts, &self.config, self.tokenizer.name());

        debug!(
            elements = elements.len(),
            units = units.len(),
            chunks = chunks.len(),
            tokenizer = self.tokenizer.name(),
            max_tokens = self.config.max_tokens,
            "packed document"
        );

        Ok(chunks)
    }
}

/// Number the drafts and seal them into chunks
pub(crate) fn assemble(drafts: Vec<Draft>, config: &ChunkerConfig, tokenizer: &str) -> Vec<Chunk> {
    let total = drafts.len();
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            let metadata = ChunkMetadata::new((draft.start, draft.end))
                .with_source(config.source.clone())
                .with_section_header(draft.section_header)
                .with_parent_chunk_id(draft.parent_chunk_id)
                .with_index(index, total)
                .with_custom(config.custom.clone());
            Chunk::new(draft.text, draft.token_count, metadata)
                .with_token_count(tokenizer, draft.token_count)
        })
        .collect()
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("config", &self.config)
            .field("tokenizer", &self.tokenizer.name())
            .field("parser", &self.parser.name())
            .finish()
    }
}
