use super::{ElementKind, ParsedDocument, Parser, SectionPath, StructuralElement};
use crate::segmenter::split_paragraphs;
use crate::span;

/// Fallback parser for text without markup: paragraphs only
#[derive(Debug, Clone, Copy)]
pub struct PlainTextParser {
    split_paragraphs: bool,
}

impl PlainTextParser {
    pub fn new() -> Self {
        Self {
            split_paragraphs: true,
        }
    }

    /// When false, the whole trimmed text becomes a single paragraph
    pub fn split_paragraphs(mut self, split: bool) -> Self {
        self.split_paragraphs = split;
        self
    }
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PlainTextParser {
    fn parse(&self, text: &str) -> ParsedDocument {
        let spans: Vec<(usize, usize)> = if self.split_paragraphs {
            split_paragraphs(text)
                .into_iter()
                .map(|(_, s, e)| (s, e))
                .collect()
        } else {
            span::trimmed_span(text, 0, text.len()).into_iter().collect()
        };

        let elements = spans
            .into_iter()
            .map(|(start, end)| StructuralElement {
                kind: ElementKind::Paragraph,
                content: text[start..end].to_string(),
                start,
                end,
                section_path: SectionPath::new(),
            })
            .collect();

        ParsedDocument {
            elements,
            title: None,
            format: self.name(),
            rendered: None,
        }
    }

    fn name(&self) -> &'static str {
        "plaintext"
    }
}
