//! Post-chunking integrity checks.
//!
//! Every check is read-only and reports findings as data; a failed check is
//! never an error. Only tokenizer failures are propagated.

#[cfg(test)]
mod tests;

use crate::chunker::Chunk;
use crate::error::{ConfigError, TokenizerError};
use crate::span;
use crate::tokenizer::Tokenizer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Minimum roundtrip ratio for a chunking to count as lossless
pub const DEFAULT_TOLERANCE: f64 = 0.95;

/// Pronouns that need an antecedent when they open a chunk
pub const DANGLING_PRONOUNS: &[&str] = &["it", "they", "this", "that", "these", "those", "he", "she"];

/// Bytes at the start of a chunk searched for reference phrases
pub const REFERENCE_WINDOW: usize = 200;

static REFERENCE_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:as (?:mentioned|noted|described|shown|stated)|(?:see|mentioned|described|noted) above|the (?:above|previous|aforementioned)|in the (?:previous|last) (?:section|chapter|paragraph))\b",
    )
    .expect("valid reference phrase regex")
});

/// A chunk whose text exceeds the token limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenLimitViolation {
    pub chunk_id: String,
    pub token_count: usize,
    pub max_tokens: usize,
}

impl TokenLimitViolation {
    pub fn excess(&self) -> usize {
        self.token_count.saturating_sub(self.max_tokens)
    }
}

impl fmt::Display for TokenLimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk {} exceeds token limit: {} > {}",
            short_id(&self.chunk_id),
            self.token_count,
            self.max_tokens
        )
    }
}

/// Recount every chunk and report those above `max_tokens`
pub fn validate_token_limits(
    chunks: &[Chunk],
    max_tokens: usize,
    tokenizer: &dyn Tokenizer,
) -> Result<Vec<TokenLimitViolation>, TokenizerError> {
    let mut violations = Vec::new();
    for chunk in chunks {
        let token_count = tokenizer.count_tokens(chunk.text())?;
        if token_count > max_tokens {
            violations.push(TokenLimitViolation {
                chunk_id: chunk.chunk_id().to_string(),
                token_count,
                max_tokens,
            });
        }
    }
    Ok(violations)
}

/// Outcome of comparing the chunks against the original text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundtripReport {
    /// Matched non-whitespace characters over the larger of the two lengths
    pub ratio: f64,
    pub tolerance: f64,
    /// Non-whitespace characters in the original
    pub original_len: usize,
    /// Non-whitespace characters in the de-duplicated chunk text
    pub reconstructed_len: usize,
    pub passed: bool,
}

/// Check that the chunks reproduce the original content.
///
/// Overlapping prefixes are removed first: a chunk wholly inside the already
/// covered range is skipped, and a chunk that starts inside it loses the
/// covered bytes when its text is a verbatim slice of its span.
pub fn validate_roundtrip(original: &str, chunks: &[Chunk], tolerance: f64) -> RoundtripReport {
    let reconstructed = deduplicate(chunks);

    let expected = char_counts(original);
    let actual = char_counts(&reconstructed);
    let original_len: usize = expected.values().sum();
    let reconstructed_len: usize = actual.values().sum();

    let matched: usize = expected
        .iter()
        .map(|(c, n)| (*n).min(actual.get(c).copied().unwrap_or(0)))
        .sum();
    let denominator = original_len.max(reconstructed_len);
    let ratio = if denominator == 0 {
        1.0
    } else {
        matched as f64 / denominator as f64
    };

    RoundtripReport {
        ratio,
        tolerance,
        original_len,
        reconstructed_len,
        passed: ratio >= tolerance,
    }
}

fn deduplicate(chunks: &[Chunk]) -> String {
    let mut covered_end = 0;
    let mut out = String::new();

    for chunk in chunks {
        let (start, end) = chunk.position();
        let text = chunk.text();
        if end <= covered_end && start < end {
            continue;
        }

        let piece = if start < covered_end {
            let cut = covered_end - start;
            let verbatim = text.len() == end - start;
            match text.get(cut..) {
                Some(rest) if verbatim => rest,
                _ => text,
            }
        } else {
            text
        };

        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(piece);
        covered_end = covered_end.max(end);
    }

    out
}

fn char_counts(text: &str) -> HashMap<char, usize> {
    let mut counts = HashMap::new();
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// The chunk opens with a pronoun such as "It" or "They"
    DanglingPronoun,
    /// A backward reference such as "as mentioned" near the chunk start
    ReferencePhrase,
}

/// A chunk that may depend on context from an earlier chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceWarning {
    pub chunk_id: String,
    pub chunk_index: usize,
    pub kind: ReferenceKind,
    /// The pronoun or phrase that triggered the warning
    pub detail: String,
}

impl fmt::Display for ReferenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ReferenceKind::DanglingPronoun => "starts with pronoun",
            ReferenceKind::ReferencePhrase => "contains reference phrase",
        };
        write!(
            f,
            "chunk {} {} {:?}",
            short_id(&self.chunk_id),
            what,
            self.detail
        )
    }
}

/// Flag chunks that likely refer back to content they do not contain.
///
/// A chunk that opens a headed section is exempt from the pronoun check: it
/// is the first chunk or its section differs from the previous chunk's, and
/// it has a section header. Reference phrases are only looked for in chunks
/// after the first.
pub fn flag_dangling_references(chunks: &[Chunk]) -> Vec<ReferenceWarning> {
    let mut warnings = Vec::new();

    for (i, chunk) in chunks.iter().enumerate() {
        let text = chunk.text().trim_start();
        let section = chunk.metadata().section_header();
        let opens_section =
            i == 0 || chunks[i - 1].metadata().section_header() != section;

        if !(opens_section && section.is_some()) {
            if let Some(word) = first_word(text) {
                if DANGLING_PRONOUNS.contains(&word.to_lowercase().as_str()) {
                    warnings.push(ReferenceWarning {
                        chunk_id: chunk.chunk_id().to_string(),
                        chunk_index: i,
                        kind: ReferenceKind::DanglingPronoun,
                        detail: word.to_string(),
                    });
                }
            }
        }

        if i > 0 {
            let window = &text[..span::floor_char_boundary(text, REFERENCE_WINDOW)];
            if let Some(found) = REFERENCE_PHRASE.find(window) {
                warnings.push(ReferenceWarning {
                    chunk_id: chunk.chunk_id().to_string(),
                    chunk_index: i,
                    kind: ReferenceKind::ReferencePhrase,
                    detail: found.as_str().to_string(),
                });
            }
        }
    }

    warnings
}

/// Leading alphabetic run of the first word, ignoring opening punctuation
fn first_word(text: &str) -> Option<&str> {
    let word = text
        .split_whitespace()
        .next()?
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    let end = word
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map_or(word.len(), |(i, _)| i);
    let word = &word[..end];
    (!word.is_empty()).then_some(word)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Inputs for [`validate_chunks`]; each check runs only when its inputs are set
#[derive(Clone, Copy)]
pub struct ValidationOptions<'a> {
    /// Enables the roundtrip check
    pub original: Option<&'a str>,
    /// Enables the token limit check
    pub token_limit: Option<(usize, &'a dyn Tokenizer)>,
    pub tolerance: f64,
    pub check_references: bool,
}

impl Default for ValidationOptions<'_> {
    fn default() -> Self {
        Self {
            original: None,
            token_limit: None,
            tolerance: DEFAULT_TOLERANCE,
            check_references: true,
        }
    }
}

impl<'a> ValidationOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_original(mut self, original: &'a str) -> Self {
        self.original = Some(original);
        self
    }

    pub fn with_token_limit(mut self, max_tokens: usize, tokenizer: &'a dyn Tokenizer) -> Self {
        self.token_limit = Some((max_tokens, tokenizer));
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&tolerance) {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    pub fn check_references(mut self, check: bool) -> Self {
        self.check_references = check;
        self
    }
}

/// Combined findings of [`validate_chunks`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub token_violations: Vec<TokenLimitViolation>,
    pub roundtrip: Option<RoundtripReport>,
    pub reference_warnings: Vec<ReferenceWarning>,
}

impl ValidationReport {
    /// No token violations and no failed roundtrip. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.token_violations.is_empty() && self.roundtrip.as_ref().map_or(true, |r| r.passed)
    }

    pub fn has_warnings(&self) -> bool {
        !self.reference_warnings.is_empty()
    }
}

/// Run every check whose inputs are present in `options`
pub fn validate_chunks(
    chunks: &[Chunk],
    options: &ValidationOptions<'_>,
) -> Result<ValidationReport, TokenizerError> {
    let token_violations = match options.token_limit {
        Some((max_tokens, tokenizer)) => validate_token_limits(chunks, max_tokens, tokenizer)?,
        None => Vec::new(),
    };
    let roundtrip = options
        .original
        .map(|original| validate_roundtrip(original, chunks, options.tolerance));
    let reference_warnings = if options.check_references {
        flag_dangling_references(chunks)
    } else {
        Vec::new()
    };

    Ok(ValidationReport {
        token_violations,
        roundtrip,
        reference_warnings,
    })
}
