use super::Tokenizer;
use crate::error::TokenizerError;

/// Whitespace word counter.
///
/// Closer to real token counts than characters for English prose, but the
/// encoding is positional only, so decoding is not supported and hard-split
/// with this backend reports [`TokenizerError::Unsupported`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn name(&self) -> &str {
        "words"
    }

    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(text.split_whitespace().count())
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok((0..text.split_whitespace().count() as u32).collect())
    }

    fn decode(&self, _tokens: &[u32]) -> Result<String, TokenizerError> {
        Err(TokenizerError::Unsupported {
            tokenizer: self.name().to_string(),
            operation: "decode",
        })
    }
}
