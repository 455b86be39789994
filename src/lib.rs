//! Deterministic, structure-aware text chunking for retrieval pipelines.
//!
//! Text is parsed into structural elements (headers, code blocks, lists,
//! paragraphs), prose is segmented into sentences, and the resulting units are
//! packed into token-bounded [`Chunk`]s that carry their section context.
//!
//! ```no_run
//! let chunks = chunksmith::chunk("# Intro\n\nHello there. How are you?", 500, None, 0)?;
//! for chunk in &chunks {
//!     println!("{}", chunk.to_json(false)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Public API exports
pub mod chunker;
pub mod error;
pub mod files;
pub mod parser;
pub mod segmenter;
pub mod semantic;
pub mod tokenizer;
pub mod validators;

mod span;

// Re-export main types for convenience
pub use chunker::{
    chunk_id, Chunk, ChunkMetadata, Chunker, ChunkerConfig, DEFAULT_MAX_TOKENS,
    DEFAULT_OVERLAP_TOKENS,
};
pub use error::{ChunkError, ConfigError, TokenizerError};
pub use files::{chunk_directory, chunk_file, chunk_files};
pub use parser::{
    CsvParser, ElementKind, HtmlParser, JsonParser, MarkdownParser, ParsedDocument, Parser,
    ParserRegistry, PlainTextParser, SectionPath, StructuralElement,
};
pub use segmenter::{segment, Segmenter, Sentence};
pub use semantic::{Embedder, SemanticChunker};
pub use tokenizer::{CharacterTokenizer, Tokenizer, WordTokenizer};
pub use validators::{
    validate_chunks, ReferenceWarning, RoundtripReport, TokenLimitViolation, ValidationOptions,
    ValidationReport,
};

use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Chunk Markdown-or-plain `text` in one call.
///
/// Uses [`CharacterTokenizer`] when no tokenizer is given.
pub fn chunk(
    text: &str,
    max_tokens: usize,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    overlap_tokens: usize,
) -> Result<Vec<Chunk>, ChunkError> {
    let tokenizer = tokenizer.unwrap_or_else(|| Arc::new(CharacterTokenizer::new()));
    Chunker::new(ChunkerConfig::new(max_tokens, overlap_tokens), tokenizer)?.chunk(text)
}

/// Configurable entry point.
///
/// ```no_run
/// use chunksmith::ChunkSmith;
///
/// let smith = ChunkSmith::new().max_tokens(256).overlap_tokens(32).validate(true);
/// let chunks = smith.chunk_file("README.md")?;
/// # Ok::<(), chunksmith::ChunkError>(())
/// ```
#[derive(Clone)]
pub struct ChunkSmith {
    config: ChunkerConfig,
    tokenizer: Arc<dyn Tokenizer>,
    /// Overrides extension-based selection when set
    parser: Option<Arc<dyn Parser>>,
    registry: Arc<ParserRegistry>,
    segmenter: Segmenter,
    validate: bool,
}

impl ChunkSmith {
    /// Defaults: character tokenizer, Markdown parser, 500 tokens, no overlap
    pub fn new() -> Self {
        Self {
            config: ChunkerConfig::default(),
            tokenizer: Arc::new(CharacterTokenizer::new()),
            parser: None,
            registry: Arc::new(ParserRegistry::with_defaults()),
            segmenter: Segmenter::new(),
            validate: false,
        }
    }

    /// Start from a loaded config
    pub fn from_config(config: ChunkerConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn overlap_tokens(mut self, overlap_tokens: usize) -> Self {
        self.config.overlap_tokens = overlap_tokens;
        self
    }

    pub fn preserve_code_blocks(mut self, preserve: bool) -> Self {
        self.config.preserve_code_blocks = preserve;
        self
    }

    pub fn preserve_lists(mut self, preserve: bool) -> Self {
        self.config.preserve_lists = preserve;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.config.source = Some(source.into());
        self
    }

    /// Attach a custom metadata field to every chunk
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.custom.insert(key.into(), value.into());
        self
    }

    /// Log validation findings after every chunking call
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk text with the configured parser (Markdown unless overridden)
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, ChunkError> {
        self.run(text, self.text_parser(), self.config.clone())
    }

    /// Chunk text and run every integrity check against the text the chunks
    /// were sliced from (the rendering, for HTML, JSON and CSV parsers)
    pub fn chunk_and_report(
        &self,
        text: &str,
    ) -> Result<(Vec<Chunk>, ValidationReport), ChunkError> {
        self.run_checked(text, self.text_parser(), self.config.clone())
    }

    /// Read and chunk a file, picking the parser from its extension
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>, ChunkError> {
        let path = path.as_ref();
        let text = files::read_text(path)?;
        let parser = self
            .parser
            .clone()
            .unwrap_or_else(|| self.registry.select(path));
        let mut config = self.config.clone();
        if config.source.is_none() {
            config.source = Some(path.display().to_string());
        }
        self.run(&text, parser, config)
    }

    /// Run every integrity check against `chunks` produced from `text`
    pub fn report(&self, text: &str, chunks: &[Chunk]) -> Result<ValidationReport, TokenizerError> {
        let options = ValidationOptions::new()
            .with_original(text)
            .with_token_limit(self.config.max_tokens, self.tokenizer.as_ref());
        validate_chunks(chunks, &options)
    }

    fn text_parser(&self) -> Arc<dyn Parser> {
        self.parser
            .clone()
            .unwrap_or_else(|| Arc::new(MarkdownParser::new()))
    }

    fn chunker(&self, parser: Arc<dyn Parser>, config: ChunkerConfig) -> Result<Chunker, ConfigError> {
        Ok(Chunker::new(config, Arc::clone(&self.tokenizer))?
            .with_parser(parser)
            .with_segmenter(self.segmenter.clone()))
    }

    fn run(
        &self,
        text: &str,
        parser: Arc<dyn Parser>,
        config: ChunkerConfig,
    ) -> Result<Vec<Chunk>, ChunkError> {
        if !self.validate {
            return self.chunker(parser, config)?.chunk(text);
        }

        let (chunks, report) = self.run_checked(text, parser, config)?;
        for violation in &report.token_violations {
            warn!("{}", violation);
        }
        if let Some(roundtrip) = report.roundtrip.as_ref().filter(|r| !r.passed) {
            warn!(
                ratio = roundtrip.ratio,
                tolerance = roundtrip.tolerance,
                "chunks do not reproduce the original text"
            );
        }
        for warning in &report.reference_warnings {
            warn!("{}", warning);
        }
        Ok(chunks)
    }

    fn run_checked(
        &self,
        text: &str,
        parser: Arc<dyn Parser>,
        config: ChunkerConfig,
    ) -> Result<(Vec<Chunk>, ValidationReport), ChunkError> {
        let chunker = self.chunker(parser, config)?;
        let document = chunker.parser().parse(text);
        let source = document.source(text);
        let chunks = chunker.pack(source, &document.elements)?;
        let report = self.report(source, &chunks)?;
        Ok((chunks, report))
    }
}

impl Default for ChunkSmith {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_facade_defaults_to_characters() {
        let chunks = chunk("Hello world. Bye now.", 12, None, 0).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["Hello world.", "Bye now."]);
    }

    #[test]
    fn test_chunk_facade_rejects_bad_config() {
        assert!(matches!(
            chunk("text", 0, None, 0),
            Err(ChunkError::Config(ConfigError::ZeroMaxTokens))
        ));
    }

    #[test]
    fn test_chunksmith_builder_settings() {
        let smith = ChunkSmith::new()
            .tokenizer(Arc::new(WordTokenizer))
            .max_tokens(3)
            .source("inline")
            .custom("batch", 7)
            .validate(true);

        let chunks = smith.chunk("One two three. Four five.").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata().source(), Some("inline"));
        assert_eq!(chunks[0].metadata().custom()["batch"], 7);
        assert!(smith.report("One two three. Four five.", &chunks).unwrap().is_valid());
    }

    #[test]
    fn test_chunksmith_parser_override() {
        let smith = ChunkSmith::new().parser(Arc::new(PlainTextParser::new()));
        let chunks = smith.chunk("# Title\n\nBody.").unwrap();
        assert!(chunks.iter().all(|c| c.metadata().section_header().is_none()));
    }

    #[test]
    fn test_chunksmith_from_config() {
        let config = ChunkerConfig::from_json_str(r#"{"max_tokens": 8}"#).unwrap();
        let smith = ChunkSmith::from_config(config);
        assert_eq!(smith.config().max_tokens, 8);
        assert!(smith.chunk("A long sentence here.").unwrap().len() > 1);
    }

    #[test]
    fn test_chunk_and_report_checks_rendered_html() {
        let html = "<html><body><h1>Guide</h1><p>First point. Second point.</p></body></html>";
        let smith = ChunkSmith::new()
            .parser(Arc::new(HtmlParser::new()))
            .max_tokens(20);

        let (chunks, report) = smith.chunk_and_report(html).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["Guide\n\nFirst point.", "Second point."]);
        assert!(report.is_valid());
        assert!(report.roundtrip.unwrap().passed);
    }
}
