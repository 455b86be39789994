use std::path::PathBuf;
use thiserror::Error;

/// Invalid chunking configuration, reported before any work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_tokens must be greater than zero")]
    ZeroMaxTokens,

    #[error("overlap_tokens ({overlap}) must be smaller than max_tokens ({max})")]
    OverlapTooLarge { overlap: usize, max: usize },

    #[error("roundtrip tolerance must be within 0.0..=1.0, got {0}")]
    InvalidTolerance(f64),

    #[error("similarity threshold must be within -1.0..=1.0, got {0}")]
    InvalidThreshold(f32),

    #[error("chars_per_token must be a positive finite number, got {0}")]
    InvalidCharsPerToken(f64),

    #[error("batch size must be greater than zero")]
    ZeroBatchSize,
}

/// Failure reported by a tokenizer backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("{tokenizer} tokenizer does not support {operation}")]
    Unsupported {
        tokenizer: String,
        operation: &'static str,
    },

    #[error("token id {0} cannot be decoded")]
    InvalidTokenId(u32),

    #[error("tokenizer backend failed: {0}")]
    Backend(String),
}

/// Errors surfaced by the chunking pipeline.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error(
        "element span {start}..{end} does not match the source text ({source_len} bytes)"
    )]
    ForeignElement {
        start: usize,
        end: usize,
        source_len: usize,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
