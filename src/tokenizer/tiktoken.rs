use super::Tokenizer;
use crate::error::TokenizerError;
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Encoding used when none is named and for models tiktoken does not know
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// OpenAI BPE encodings (GPT-3.5, GPT-4, GPT-4o and the embedding models).
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
    name: String,
}

impl TiktokenTokenizer {
    /// Load an encoding by name: `cl100k_base`, `o200k_base`, `p50k_base`,
    /// `p50k_edit` or `r50k_base`
    pub fn for_encoding(encoding: &str) -> Result<Self, TokenizerError> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(TokenizerError::Backend(format!(
                    "unknown tiktoken encoding: {}",
                    other
                )))
            }
        }
        .map_err(|e| TokenizerError::Backend(e.to_string()))?;

        Ok(Self {
            bpe,
            name: format!("tiktoken-{}", encoding),
        })
    }

    /// Encoding of an OpenAI model such as "gpt-4" or "gpt-4o".
    ///
    /// Unknown models get [`DEFAULT_ENCODING`].
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(e) => {
                warn!(model, error = %e, "unknown model, using {}", DEFAULT_ENCODING);
                return Self::for_encoding(DEFAULT_ENCODING).map(|tok| Self {
                    name: format!("tiktoken-{}", model),
                    ..tok
                });
            }
        };
        Ok(Self {
            bpe,
            name: format!("tiktoken-{}", model),
        })
    }

    pub fn cl100k_base() -> Result<Self, TokenizerError> {
        Self::for_encoding("cl100k_base")
    }

    pub fn o200k_base() -> Result<Self, TokenizerError> {
        Self::for_encoding("o200k_base")
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(self.bpe.encode_ordinary(text))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| TokenizerError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cl100k_counts_and_roundtrips() {
        let tok = TiktokenTokenizer::cl100k_base().unwrap();
        assert_eq!(tok.name(), "tiktoken-cl100k_base");
        assert_eq!(tok.count_tokens("hello world").unwrap(), 2);

        let text = "Chunking keeps sections together.";
        let tokens = tok.encode(text).unwrap();
        assert_eq!(tok.decode(&tokens).unwrap(), text);
    }

    #[test]
    fn test_model_lookup() {
        let tok = TiktokenTokenizer::for_model("gpt-4o").unwrap();
        assert_eq!(tok.name(), "tiktoken-gpt-4o");

        // Unknown models fall back to the default encoding
        let fallback = TiktokenTokenizer::for_model("my-private-model").unwrap();
        let default = TiktokenTokenizer::cl100k_base().unwrap();
        assert_eq!(
            fallback.encode("same tokens").unwrap(),
            default.encode("same tokens").unwrap()
        );
    }

    #[test]
    fn test_unknown_encoding_is_an_error() {
        assert!(matches!(
            TiktokenTokenizer::for_encoding("nope"),
            Err(TokenizerError::Backend(_))
        ));
    }
}
