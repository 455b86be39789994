//! Embedding-driven chunk boundaries.
//!
//! Sentences are embedded in batches and a new group starts wherever two
//! neighbouring sentences stop being similar. Each group is then packed with
//! the same token bound as the structural chunker.

mod batcher;
mod similarity;

#[cfg(test)]
mod tests;

pub use batcher::{Batcher, DEFAULT_BATCH_SIZE};
pub use similarity::{cosine_similarity, find_semantic_boundaries};

use crate::chunker::{self, Chunk, ChunkerConfig, Packer, PackingUnit, DEFAULT_MAX_TOKENS};
use crate::error::ConfigError;
use crate::parser::SectionPath;
use crate::segmenter::{Segmenter, Sentence};
use crate::tokenizer::{CharacterTokenizer, Tokenizer};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MIN_SENTENCES_PER_CHUNK: usize = 2;

/// Turns texts into vectors. One vector per input text, in order.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Chunker that splits on topic shifts instead of structure
pub struct SemanticChunker {
    embedder: Arc<dyn Embedder>,
    tokenizer: Arc<dyn Tokenizer>,
    segmenter: Segmenter,
    threshold: f32,
    max_tokens: usize,
    min_sentences_per_chunk: usize,
    batcher: Batcher,
    source: Option<String>,
}

impl SemanticChunker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            tokenizer: Arc::new(CharacterTokenizer::new()),
            segmenter: Segmenter::new(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_tokens: DEFAULT_MAX_TOKENS,
            min_sentences_per_chunk: DEFAULT_MIN_SENTENCES_PER_CHUNK,
            batcher: Batcher::default(),
            source: None,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Similarity below which a boundary is placed, in -1.0..=1.0
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self, ConfigError> {
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Result<Self, ConfigError> {
        if max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        self.max_tokens = max_tokens;
        Ok(self)
    }

    pub fn with_min_sentences_per_chunk(mut self, min: usize) -> Self {
        self.min_sentences_per_chunk = min;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, ConfigError> {
        self.batcher = Batcher::new(batch_size)?;
        Ok(self)
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Chunk `text` along semantic boundaries.
    ///
    /// Groups that exceed `max_tokens` are re-packed greedily by sentence and
    /// sentences that exceed it on their own are hard-split.
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        let sentences = self.segmenter.segment(text);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let boundaries = if sentences.len() > 1 {
            let embeddings = self.embed_sentences(&sentences)?;
            find_semantic_boundaries(&embeddings, self.threshold, self.min_sentences_per_chunk)
        } else {
            Vec::new()
        };

        let config = ChunkerConfig {
            source: self.source.clone(),
            ..ChunkerConfig::new(self.max_tokens, 0)
        };
        let packer = Packer {
            source: text,
            config: &config,
            tokenizer: self.tokenizer.as_ref(),
        };
        let section = SectionPath::new();

        let mut drafts = Vec::new();
        let mut group_start = 0;
        for group_end in boundaries.iter().copied().chain([sentences.len()]) {
            let units = sentences[group_start..group_end]
                .iter()
                .map(|s| {
                    Ok(PackingUnit {
                        text: &text[s.start..s.end],
                        start: s.start,
                        end: s.end,
                        tokens: self.tokenizer.count_tokens(&s.text)?,
                        is_header: false,
                        section: &section,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            drafts.extend(packer.pack(&units)?);
            group_start = group_end;
        }

        debug!(
            sentences = sentences.len(),
            groups = boundaries.len() + 1,
            chunks = drafts.len(),
            "semantic chunking complete"
        );

        Ok(chunker::assemble(drafts, &config, self.tokenizer.name()))
    }

    fn embed_sentences(&self, sentences: &[Sentence]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = sentences.iter().map(|s| s.text.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in self.batcher.split(&texts) {
            embeddings.extend(self.embedder.embed(batch)?);
        }
        if embeddings.len() != texts.len() {
            bail!(
                "embedder returned {} vectors for {} sentences",
                embeddings.len(),
                texts.len()
            );
        }
        Ok(embeddings)
    }
}
