use super::Tokenizer;
use crate::error::{ConfigError, TokenizerError};

/// Character-based tokenizer: one token per `chars_per_token` characters.
///
/// Encoding maps every `char` to its code point, so encode/decode round-trip
/// exactly. With the default ratio of 1.0 the count equals the encoding
/// length; larger ratios approximate subword tokenizers for counting only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterTokenizer {
    chars_per_token: f64,
}

impl CharacterTokenizer {
    pub fn new() -> Self {
        Self {
            chars_per_token: 1.0,
        }
    }

    /// Use a custom characters-per-token ratio (~4.0 approximates English BPE)
    pub fn with_chars_per_token(chars_per_token: f64) -> Result<Self, ConfigError> {
        if !chars_per_token.is_finite() || chars_per_token <= 0.0 {
            return Err(ConfigError::InvalidCharsPerToken(chars_per_token));
        }
        Ok(Self { chars_per_token })
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }
}

impl Default for CharacterTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for CharacterTokenizer {
    fn name(&self) -> &str {
        "chars"
    }

    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        let chars = text.chars().count();
        if chars == 0 {
            return Ok(0);
        }
        Ok(((chars as f64 / self.chars_per_token) as usize).max(1))
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn token_offsets(&self, text: &str) -> Result<Option<Vec<(usize, usize)>>, TokenizerError> {
        Ok(Some(
            text.char_indices()
                .map(|(i, c)| (i, i + c.len_utf8()))
                .collect(),
        ))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        tokens
            .iter()
            .map(|&t| char::from_u32(t).ok_or(TokenizerError::InvalidTokenId(t)))
            .collect()
    }
}
