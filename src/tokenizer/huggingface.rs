use super::Tokenizer;
use crate::error::TokenizerError;
use std::path::Path;

/// Adapter over a serialized HuggingFace `tokenizer.json`.
pub struct HuggingFaceTokenizer {
    inner: tokenizers::Tokenizer,
    name: String,
}

impl HuggingFaceTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenizerError> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TokenizerError::Backend(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            inner,
            name: format!("hf:{}", path.display()),
        })
    }

    /// Build from serialized tokenizer JSON bytes
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, TokenizerError> {
        let inner = tokenizers::Tokenizer::from_bytes(bytes)
            .map_err(|e| TokenizerError::Backend(e.to_string()))?;
        Ok(Self {
            inner,
            name: name.into(),
        })
    }
}

impl HuggingFaceTokenizer {
    // Offsets of a plain `encode` are byte offsets into `text`
    fn encoding(&self, text: &str) -> Result<tokenizers::Encoding, TokenizerError> {
        self.inner
            .encode(text, false)
            .map_err(|e| TokenizerError::Backend(e.to_string()))
    }
}

impl Tokenizer for HuggingFaceTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(self.encoding(text)?.get_ids().to_vec())
    }

    fn token_offsets(&self, text: &str) -> Result<Option<Vec<(usize, usize)>>, TokenizerError> {
        Ok(Some(self.encoding(text)?.get_offsets().to_vec()))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        self.inner
            .decode(tokens, false)
            .map_err(|e| TokenizerError::Backend(e.to_string()))
    }
}
