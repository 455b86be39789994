use super::*;
use crate::chunker::{ChunkMetadata, Chunker, ChunkerConfig};
use crate::tokenizer::{CharacterTokenizer, WordTokenizer};
use std::sync::Arc;

fn make_chunk(text: &str, start: usize, section: Option<&str>) -> Chunk {
    let metadata = ChunkMetadata::new((start, start + text.len()))
        .with_section_header(section.map(str::to_string));
    Chunk::new(text, text.chars().count(), metadata)
}

fn chunk_text(text: &str, max_tokens: usize, overlap_tokens: usize) -> Vec<Chunk> {
    Chunker::new(
        ChunkerConfig::new(max_tokens, overlap_tokens),
        Arc::new(CharacterTokenizer::new()),
    )
    .unwrap()
    .chunk(text)
    .unwrap()
}

#[test]
fn test_token_limits_report_excess() {
    let chunks = vec![
        make_chunk("short", 0, None),
        make_chunk("this one is far too long", 6, None),
    ];
    let violations = validate_token_limits(&chunks, 10, &CharacterTokenizer::new()).unwrap();

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].chunk_id, chunks[1].chunk_id());
    assert_eq!(violations[0].token_count, 24);
    assert_eq!(violations[0].excess(), 14);
    assert!(violations[0].to_string().contains("24 > 10"));
}

#[test]
fn test_token_limits_use_given_tokenizer() {
    let chunks = vec![make_chunk("one two three", 0, None)];
    assert!(validate_token_limits(&chunks, 3, &WordTokenizer).unwrap().is_empty());
    assert_eq!(validate_token_limits(&chunks, 2, &WordTokenizer).unwrap().len(), 1);
}

#[test]
fn test_roundtrip_full_coverage_passes() {
    let text = "First sentence here. Second sentence here. Third one.";
    let chunks = chunk_text(text, 25, 0);
    assert!(chunks.len() > 1);

    let report = validate_roundtrip(text, &chunks, DEFAULT_TOLERANCE);
    assert_eq!(report.ratio, 1.0);
    assert!(report.passed);
    assert_eq!(report.original_len, report.reconstructed_len);
}

#[test]
fn test_roundtrip_removes_overlap() {
    let text = "Alpha one is here. Beta two is here. Gamma three is here.";
    let chunks = chunk_text(text, 40, 20);
    assert!(chunks.windows(2).any(|w| w[1].position().0 < w[0].position().1));

    let report = validate_roundtrip(text, &chunks, DEFAULT_TOLERANCE);
    assert_eq!(report.ratio, 1.0);
    assert!(report.passed);
}

#[test]
fn test_roundtrip_detects_loss() {
    let text = "Kept sentence. Dropped sentence that is much longer than the kept one.";
    let chunks = vec![make_chunk("Kept sentence.", 0, None)];

    let report = validate_roundtrip(text, &chunks, DEFAULT_TOLERANCE);
    assert!(report.ratio < 0.5);
    assert!(!report.passed);
}

#[test]
fn test_roundtrip_of_empty_input() {
    let report = validate_roundtrip("   ", &[], DEFAULT_TOLERANCE);
    assert_eq!(report.ratio, 1.0);
    assert!(report.passed);

    let report = validate_roundtrip("content", &[], DEFAULT_TOLERANCE);
    assert_eq!(report.ratio, 0.0);
    assert!(!report.passed);
}

#[test]
fn test_first_chunk_pronoun_without_header_is_flagged() {
    let chunks = vec![make_chunk("It was unclear what happened.", 0, None)];
    let warnings = flag_dangling_references(&chunks);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, ReferenceKind::DanglingPronoun);
    assert_eq!(warnings[0].detail, "It");
    assert_eq!(warnings[0].chunk_index, 0);
}

#[test]
fn test_pronoun_opening_headed_section_is_exempt() {
    let chunks = vec![
        make_chunk("This chapter covers setup.", 0, Some("Setup")),
        make_chunk("They said nothing.", 27, Some("Setup")),
        make_chunk("These notes are new.", 46, Some("Notes")),
    ];
    let warnings = flag_dangling_references(&chunks);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].chunk_index, 1);
    assert_eq!(warnings[0].detail, "They");
}

#[test]
fn test_pronoun_match_ignores_case_and_punctuation() {
    let chunks = vec![
        make_chunk("Intro.", 0, None),
        make_chunk("\"THOSE, at least, remained.\"", 7, None),
        make_chunk("It's late.", 36, None),
        make_chunk("Items were listed.", 47, None),
    ];
    let flagged: Vec<usize> = flag_dangling_references(&chunks)
        .iter()
        .map(|w| w.chunk_index)
        .collect();

    assert_eq!(flagged, vec![1, 2]);
}

#[test]
fn test_reference_phrases_are_flagged_once() {
    let chunks = vec![
        make_chunk("As mentioned above, nothing precedes this.", 0, None),
        make_chunk("Results, as noted in the previous section, vary.", 43, None),
    ];
    let warnings = flag_dangling_references(&chunks);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].chunk_index, 1);
    assert_eq!(warnings[0].kind, ReferenceKind::ReferencePhrase);
    assert_eq!(warnings[0].detail, "as noted");
}

#[test]
fn test_reference_phrase_outside_window_is_ignored() {
    let late = format!("{} see above.", "word ".repeat(50));
    let chunks = vec![make_chunk("Start.", 0, None), make_chunk(&late, 7, None)];
    assert!(flag_dangling_references(&chunks).is_empty());
}

#[test]
fn test_validate_chunks_runs_configured_checks() {
    let text = "It begins here. Then it continues on.";
    let chunks = chunk_text(text, 25, 0);
    let tokenizer = CharacterTokenizer::new();

    let options = ValidationOptions::new()
        .with_original(text)
        .with_token_limit(25, &tokenizer);
    let report = validate_chunks(&chunks, &options).unwrap();

    assert!(report.token_violations.is_empty());
    assert!(report.roundtrip.as_ref().unwrap().passed);
    assert!(report.is_valid());
    assert!(report.has_warnings());

    let strict = validate_chunks(&chunks, &options.with_token_limit(5, &tokenizer)).unwrap();
    assert!(!strict.is_valid());
}

#[test]
fn test_validate_chunks_skips_unconfigured_checks() {
    let chunks = vec![make_chunk("It stands alone.", 0, None)];
    let report = validate_chunks(&chunks, &ValidationOptions::new().check_references(false)).unwrap();
    assert_eq!(report, ValidationReport::default());
}

#[test]
fn test_tolerance_is_checked() {
    assert!(ValidationOptions::new().with_tolerance(0.8).is_ok());
    assert_eq!(
        ValidationOptions::new().with_tolerance(1.5).err(),
        Some(ConfigError::InvalidTolerance(1.5))
    );
}
