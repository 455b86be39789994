use super::*;
use crate::error::{ConfigError, TokenizerError};

#[test]
fn test_character_count_matches_chars() {
    let tok = CharacterTokenizer::new();
    assert_eq!(tok.count_tokens("Hello world").unwrap(), 11);
    assert_eq!(tok.count_tokens("").unwrap(), 0);
    // Counts chars, not bytes
    assert_eq!(tok.count_tokens("日本語").unwrap(), 3);
}

#[test]
fn test_character_ratio() {
    let tok = CharacterTokenizer::with_chars_per_token(4.0).unwrap();
    assert_eq!(tok.count_tokens("abcdefgh").unwrap(), 2);
    // Never rounds non-empty text down to zero
    assert_eq!(tok.count_tokens("ab").unwrap(), 1);
}

#[test]
fn test_character_rejects_bad_ratio() {
    assert_eq!(
        CharacterTokenizer::with_chars_per_token(0.0),
        Err(ConfigError::InvalidCharsPerToken(0.0))
    );
    assert!(CharacterTokenizer::with_chars_per_token(f64::NAN).is_err());
}

#[test]
fn test_character_roundtrip() {
    let tok = CharacterTokenizer::new();
    let text = "Bonjour 🌍, ça va?";
    let ids = tok.encode(text).unwrap();
    assert_eq!(ids.len(), text.chars().count());
    assert_eq!(tok.decode(&ids).unwrap(), text);
}

#[test]
fn test_character_offsets_are_byte_ranges() {
    let tok = CharacterTokenizer::new();
    let offsets = tok.token_offsets("a\u{e9}b").unwrap().unwrap();
    assert_eq!(offsets, vec![(0, 1), (1, 3), (3, 4)]);
    assert_eq!(WordTokenizer.token_offsets("a b").unwrap(), None);
}

#[test]
fn test_character_invalid_id() {
    let tok = CharacterTokenizer::new();
    assert_eq!(
        tok.decode(&[0xD800]),
        Err(TokenizerError::InvalidTokenId(0xD800))
    );
}

#[test]
fn test_truncate_and_split() {
    let tok = CharacterTokenizer::new();
    assert_eq!(tok.truncate("abcdef", 3).unwrap(), "abc");
    assert_eq!(tok.truncate("ab", 3).unwrap(), "ab");

    let (head, rest) = tok.split_at_token_boundary("abcdef", 4).unwrap();
    assert_eq!(head, "abcd");
    assert_eq!(rest, "ef");

    let (head, rest) = tok.split_at_token_boundary("abc", 4).unwrap();
    assert_eq!(head, "abc");
    assert!(rest.is_empty());
}

#[test]
fn test_word_tokenizer() {
    let tok = WordTokenizer;
    assert_eq!(tok.count_tokens("Hello,  world!\nbye").unwrap(), 3);
    assert_eq!(tok.count_tokens("   ").unwrap(), 0);
    assert_eq!(tok.encode("a b c").unwrap(), vec![0, 1, 2]);
    assert!(matches!(
        tok.decode(&[0]),
        Err(TokenizerError::Unsupported { operation: "decode", .. })
    ));
}

#[test]
fn test_tokenizer_names() {
    assert_eq!(CharacterTokenizer::new().name(), "chars");
    assert_eq!(WordTokenizer.name(), "words");
}
