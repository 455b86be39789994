use chunksmith::validators::{flag_dangling_references, validate_roundtrip, DEFAULT_TOLERANCE};
use chunksmith::{
    chunk, segment, CharacterTokenizer, Chunk, Chunker, ChunkerConfig, ElementKind,
    MarkdownParser, Parser, Segmenter, Tokenizer,
};
use std::sync::Arc;

const DOCUMENT: &str = "# Field Guide

Dr. Rivera wrote this guide in Jan. 2024. It covers U.S. parks only! Does it cover
everything? No... but it tries. See https://example.com/parks.html for more.

## Equipment

- A tent rated for 3.5 seasons
- Two liters of water
- A map, e.g. the official one

```python
def pack(bag):
    bag.add(\"tent\")
    return bag
```

## Café notes

Naïve hikers underestimate the trail. The résumé of a good guide is long. Rangers
say “plan ahead.” They are right.

### Weather

Storms arrive fast. Check the forecast at 6 a.m. every day. A storm that arrives without any warning at all can turn a pleasant afternoon walk into a long and dangerous ordeal for everyone involved.
";

const CONFIGS: &[(usize, usize)] = &[(30, 0), (30, 10), (60, 20), (120, 0), (120, 40), (500, 100)];

fn chars() -> Arc<dyn Tokenizer> {
    Arc::new(CharacterTokenizer::new())
}

fn run(max_tokens: usize, overlap_tokens: usize) -> Vec<Chunk> {
    Chunker::new(ChunkerConfig::new(max_tokens, overlap_tokens), chars())
        .unwrap()
        .chunk(DOCUMENT)
        .unwrap()
}

/// Spans that must never be cut: every sentence and every atomic element
fn atomic_spans() -> Vec<(usize, usize)> {
    let segmenter = Segmenter::new();
    let mut spans = Vec::new();
    for element in MarkdownParser::new().parse(DOCUMENT).elements {
        match element.kind {
            ElementKind::Paragraph => {
                for s in segmenter.segment(&element.content) {
                    spans.push((element.start + s.start, element.start + s.end));
                }
            }
            _ => spans.push(element.position()),
        }
    }
    spans
}

fn is_piece(chunk: &Chunk) -> bool {
    chunk.metadata().parent_chunk_id().is_some()
}

#[test]
fn every_non_whitespace_byte_is_covered() {
    for &(max, overlap) in CONFIGS {
        let chunks = run(max, overlap);
        for (i, c) in DOCUMENT.char_indices().filter(|(_, c)| !c.is_whitespace()) {
            assert!(
                chunks.iter().any(|ch| ch.position().0 <= i && i < ch.position().1),
                "max={} overlap={}: byte {} ({:?}) uncovered",
                max,
                overlap,
                i,
                c
            );
        }
    }
}

#[test]
fn packed_chunks_stay_within_token_bound() {
    let tokenizer = CharacterTokenizer::new();
    for &(max, overlap) in CONFIGS {
        for chunk in run(max, overlap) {
            let recount = tokenizer.count_tokens(chunk.text()).unwrap();
            assert_eq!(recount, chunk.token_count());
            if is_piece(&chunk) {
                assert!(tokenizer.encode(chunk.text()).unwrap().len() <= max);
            } else {
                assert!(chunk.token_count() <= max, "{} > {}", chunk.token_count(), max);
            }
        }
    }
}

#[test]
fn chunk_text_is_the_source_span() {
    for &(max, overlap) in CONFIGS {
        for chunk in run(max, overlap) {
            let (start, end) = chunk.position();
            assert_eq!(chunk.text(), &DOCUMENT[start..end]);
        }
    }
}

#[test]
fn sentences_and_blocks_are_never_cut() {
    let spans = atomic_spans();
    for &(max, overlap) in CONFIGS {
        for chunk in run(max, overlap).iter().filter(|c| !is_piece(c)) {
            let (start, end) = chunk.position();
            for &(s, e) in &spans {
                let disjoint = e <= start || s >= end;
                let contained = start <= s && e <= end;
                assert!(
                    disjoint || contained,
                    "max={} overlap={}: chunk {:?} cuts span {:?}",
                    max,
                    overlap,
                    (start, end),
                    (s, e)
                );
            }
        }
    }
}

#[test]
fn code_block_lands_in_one_chunk() {
    for &(max, overlap) in CONFIGS.iter().filter(|(max, _)| *max >= 120) {
        let holding: Vec<Chunk> = run(max, overlap)
            .into_iter()
            .filter(|c| c.text().contains("def pack"))
            .collect();
        assert!(!holding.is_empty());
        for chunk in holding {
            assert!(chunk.text().contains("```python"));
            assert!(chunk.text().contains("return bag\n```"));
        }
    }
}

#[test]
fn overlap_never_exceeds_budget() {
    let tokenizer = CharacterTokenizer::new();
    for &(max, overlap) in CONFIGS {
        let chunks = run(max, overlap);
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.position().0 >= prev.position().1 {
                continue;
            }
            assert!(!is_piece(prev) && !is_piece(next));
            let shared = &DOCUMENT[next.position().0..prev.position().1];
            assert!(tokenizer.count_tokens(shared).unwrap() <= overlap);
        }
        if overlap == 0 {
            assert!(chunks
                .windows(2)
                .all(|w| w[1].position().0 >= w[0].position().1));
        }
    }
}

#[test]
fn chunking_is_deterministic() {
    for &(max, overlap) in CONFIGS {
        let first = run(max, overlap);
        let second = run(max, overlap);
        assert_eq!(first, second);
        let ids: Vec<&str> = first.iter().map(|c| c.chunk_id()).collect();
        let again: Vec<&str> = second.iter().map(|c| c.chunk_id()).collect();
        assert_eq!(ids, again);
    }
}

#[test]
fn section_headers_follow_the_outline() {
    let chunks = run(120, 0);
    // The long closing sentence is hard-split; its pieces keep the section
    let weather = chunks
        .iter()
        .find(|c| c.text().starts_with("A storm that arrives"))
        .unwrap();
    assert!(is_piece(weather));
    assert_eq!(
        weather.metadata().section_header(),
        Some("Field Guide > Café notes > Weather")
    );
    let equipment = chunks.iter().find(|c| c.text().contains("Two liters")).unwrap();
    assert_eq!(
        equipment.metadata().section_header(),
        Some("Field Guide > Equipment")
    );
}

#[test]
fn roundtrip_holds_with_and_without_overlap() {
    for &(max, overlap) in CONFIGS {
        let report = validate_roundtrip(DOCUMENT, &run(max, overlap), DEFAULT_TOLERANCE);
        assert!(report.passed, "max={} overlap={}: {:?}", max, overlap, report);
        assert_eq!(report.ratio, 1.0);
    }
}

#[test]
fn segmenter_keeps_abbreviations_together() {
    let texts: Vec<String> = segment("Mr. Smith went home. He was tired.")
        .into_iter()
        .map(|s| s.text)
        .collect();
    assert_eq!(texts, vec!["Mr. Smith went home.", "He was tired."]);
}

#[test]
fn ten_sentences_pack_with_one_sentence_overlap() {
    let sentences: Vec<String> = (0..10).map(|i| format!("Sentence number {:03}.", i)).collect();
    let text = sentences.join(" ");
    let chunks = chunk(&text, 55, None, 20).unwrap();

    assert_eq!(chunks[0].text(), format!("{} {}", sentences[0], sentences[1]));
    assert!(chunks[1].text().starts_with(&sentences[1]));
    assert!(chunks.iter().all(|c| c.token_count() <= 55));
}

#[test]
fn oversized_sentence_becomes_four_pieces() {
    let sentence = format!("{}.", "z".repeat(199));
    let chunks = chunk(&sentence, 50, None, 0).unwrap();

    assert_eq!(chunks.len(), 4);
    assert!(chunks.iter().all(|c| c.token_count() == 50));
    assert!(chunks.iter().all(is_piece));
}

#[test]
fn leading_pronoun_of_unheaded_document_is_flagged() {
    let chunks = chunk("It was unclear who left first. Nobody asked.", 500, None, 0).unwrap();
    let warnings = flag_dangling_references(&chunks);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].chunk_index, 0);
}
