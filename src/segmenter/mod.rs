//! Sentence segmentation with position tracking.
//!
//! A sentence ends at a run of terminators (`.`, `!`, `?`, `…`), optionally
//! followed by closing quotes or brackets, when the run is followed by
//! whitespace or the end of the text. A lone period after an abbreviation or
//! an initial (`Mr.`, `J.`, `U.S.`) does not end a sentence. Periods inside
//! decimals (`3.14`) and URLs (`https://a.com/b.html`) are never followed by
//! whitespace, so they never qualify in the first place.
//!
//! Whitespace between sentences belongs to neither span: every gap between
//! consecutive sentences is pure whitespace, and the packer reproduces it from
//! the source when sentences are rejoined.

mod abbreviations;


pub use abbreviations::DEFAULT_ABBREVIATIONS;

use crate::span;
use abbreviations::DEFAULT_ABBREVIATION_SET;
use serde::Serialize;
use std::collections::HashSet;

/// A sentence and its byte span in the segmented text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Sentence {
    /// Verbatim `text[start..end]`
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

const TERMINATORS: &[char] = &['.', '!', '?', '…'];
const CLOSERS: &[char] = &['"', '\'', '”', '’', '»', ')', ']'];
const OPENERS: &[char] = &['"', '\'', '“', '‘', '«', '(', '['];

/// Sentence segmenter. Stateless apart from its abbreviation table.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    /// Replaces the default table when set
    abbreviations: Option<HashSet<String>>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `abbreviations` instead of [`DEFAULT_ABBREVIATIONS`]
    pub fn with_abbreviations<I, S>(abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            abbreviations: Some(abbreviations.into_iter().map(Into::into).collect()),
        }
    }

    /// Default table plus `extra`
    pub fn with_extra_abbreviations<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: HashSet<String> = DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect();
        set.extend(extra.into_iter().map(Into::into));
        Self {
            abbreviations: Some(set),
        }
    }

    fn is_abbreviation(&self, word: &str) -> bool {
        match &self.abbreviations {
            Some(set) => set.contains(word),
            None => DEFAULT_ABBREVIATION_SET.contains(word),
        }
    }

    /// Split `text` into sentences. Empty or blank input yields no sentences.
    pub fn segment(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut start: Option<usize> = None;
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if start.is_none() {
                if c.is_whitespace() {
                    continue;
                }
                start = Some(i);
            }
            if !TERMINATORS.contains(&c) {
                continue;
            }

            // Collapse the whole run (e.g. "?!", "...") into one candidate
            let mut run_len = 1;
            let mut run_end = i + c.len_utf8();
            while let Some(&(j, d)) = chars.peek() {
                if !TERMINATORS.contains(&d) {
                    break;
                }
                run_len += 1;
                run_end = j + d.len_utf8();
                chars.next();
            }
            while let Some(&(j, d)) = chars.peek() {
                if !CLOSERS.contains(&d) {
                    break;
                }
                run_end = j + d.len_utf8();
                chars.next();
            }

            let followed_by_space = chars.peek().map_or(true, |&(_, d)| d.is_whitespace());
            if !followed_by_space {
                continue;
            }
            if run_len == 1 && c == '.' && self.is_false_ending(&text[..i]) {
                continue;
            }

            if let Some(s) = start.take() {
                sentences.push(Sentence {
                    text: text[s..run_end].to_string(),
                    start: s,
                    end: run_end,
                });
            }
        }

        if let Some(s) = start {
            if let Some((s, e)) = span::trimmed_span(text, s, text.len()) {
                sentences.push(Sentence {
                    text: text[s..e].to_string(),
                    start: s,
                    end: e,
                });
            }
        }

        sentences
    }

    /// Whether a period following `before` is an abbreviation or initial
    fn is_false_ending(&self, before: &str) -> bool {
        let token_start = before
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(p, c)| p + c.len_utf8())
            .unwrap_or(0);
        let word = before[token_start..].trim_start_matches(OPENERS);

        !word.is_empty() && (self.is_abbreviation(word) || is_initialism(word))
    }
}

/// "J", "U.S", "J.R.R"
fn is_initialism(word: &str) -> bool {
    word.split('.').all(|part| {
        let mut chars = part.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
    })
}

/// Segment with the default abbreviation table.
pub fn segment(text: &str) -> Vec<Sentence> {
    Segmenter::new().segment(text)
}

/// Split text into blank-line separated paragraphs as `(text, start, end)`.
///
/// Spans are trimmed to their non-whitespace content.
pub fn split_paragraphs(text: &str) -> Vec<(String, usize, usize)> {
    let mut paragraphs = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (offset, line) in span::lines(text) {
        if line.trim().is_empty() {
            if let Some((s, e)) = current.take() {
                push_paragraph(text, s, e, &mut paragraphs);
            }
            continue;
        }
        let end = offset + line.len();
        current = Some(match current {
            Some((s, _)) => (s, end),
            None => (offset, end),
        });
    }
    if let Some((s, e)) = current {
        push_paragraph(text, s, e, &mut paragraphs);
    }

    paragraphs
}

fn push_paragraph(text: &str, start: usize, end: usize, out: &mut Vec<(String, usize, usize)>) {
    if let Some((s, e)) = span::trimmed_span(text, start, end) {
        out.push((text[s..e].to_string(), s, e));
    }
}

/// Whitespace-separated word count
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
