//! Token counting capability.
//!
//! The packer and validators only ever talk to [`Tokenizer`]; concrete
//! backends are chosen by the caller. [`CharacterTokenizer`] is the
//! zero-dependency fallback used when nothing else is configured.

mod character;
#[cfg(feature = "huggingface")]
mod huggingface;
#[cfg(feature = "tiktoken")]
mod tiktoken;
mod word;

#[cfg(test)]
mod tests;

pub use character::CharacterTokenizer;
#[cfg(feature = "huggingface")]
pub use huggingface::HuggingFaceTokenizer;
#[cfg(feature = "tiktoken")]
pub use tiktoken::{TiktokenTokenizer, DEFAULT_ENCODING};
pub use word::WordTokenizer;

use crate::error::TokenizerError;

/// Core trait that all tokenizer backends implement.
///
/// Implementations are expected to satisfy `decode(encode(t)) == t`; the
/// pipeline relies on it for hard-split pieces but never verifies it.
pub trait Tokenizer: Send + Sync {
    /// Stable identifier for this backend (e.g. "chars", "words")
    fn name(&self) -> &str;

    /// Encode text into token ids
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    /// Decode token ids back into text
    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError>;

    /// Byte range of every token of `encode(text)` within `text`, when the
    /// backend tracks them. `None` means positions must be derived from
    /// decoded lengths.
    fn token_offsets(&self, _text: &str) -> Result<Option<Vec<(usize, usize)>>, TokenizerError> {
        Ok(None)
    }

    /// Count tokens in text. Defaults to the length of the encoding.
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.encode(text)?.len())
    }

    /// Cut text down to at most `max_tokens` tokens.
    fn truncate(&self, text: &str, max_tokens: usize) -> Result<String, TokenizerError> {
        let tokens = self.encode(text)?;
        if tokens.len() <= max_tokens {
            return Ok(text.to_string());
        }
        self.decode(&tokens[..max_tokens])
    }

    /// Split text into a head of at most `max_tokens` tokens and the remainder.
    fn split_at_token_boundary(
        &self,
        text: &str,
        max_tokens: usize,
    ) -> Result<(String, String), TokenizerError> {
        let tokens = self.encode(text)?;
        if tokens.len() <= max_tokens {
            return Ok((text.to_string(), String::new()));
        }
        Ok((
            self.decode(&tokens[..max_tokens])?,
            self.decode(&tokens[max_tokens..])?,
        ))
    }
}
