use super::{ElementKind, ParsedDocument, Parser, SectionPath, StructuralElement};
use crate::span;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("valid header regex")
});
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})[ \t]*(\S*)").expect("valid fence regex"));
static FENCE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})[ \t]*$").expect("valid fence regex"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*(?:[-*+]|\d{1,9}[.)])[ \t]+\S").expect("valid list regex"));

/// Markdown structure parser.
///
/// Single forward pass over lines. Recognizes ATX headers, fenced code
/// blocks (``` and ~~~), runs of list lines and blank-line delimited
/// paragraphs. An unterminated fence runs to the end of the document.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownParser {
    preserve_code_blocks: bool,
    extract_lists: bool,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self {
            preserve_code_blocks: true,
            extract_lists: true,
        }
    }

    /// When false, fence lines are treated as ordinary paragraph text
    pub fn preserve_code_blocks(mut self, preserve: bool) -> Self {
        self.preserve_code_blocks = preserve;
        self
    }

    /// When false, list lines are treated as ordinary paragraph text
    pub fn extract_lists(mut self, extract: bool) -> Self {
        self.extract_lists = extract;
        self
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

struct OpenFence {
    marker: char,
    len: usize,
    start: usize,
    language: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum BlockKind {
    Paragraph,
    List,
}

/// Lines accumulated for the paragraph or list being built
struct OpenBlock {
    kind: BlockKind,
    start: usize,
    end: usize,
}

struct Builder<'a> {
    text: &'a str,
    section: SectionPath,
    elements: Vec<StructuralElement>,
    block: Option<OpenBlock>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, kind: ElementKind, start: usize, end: usize) {
        if let Some((start, end)) = span::trimmed_span(self.text, start, end) {
            self.elements.push(StructuralElement {
                kind,
                content: self.text[start..end].to_string(),
                start,
                end,
                section_path: self.section.clone(),
            });
        }
    }

    fn flush(&mut self) {
        if let Some(block) = self.block.take() {
            let kind = match block.kind {
                BlockKind::Paragraph => ElementKind::Paragraph,
                BlockKind::List => ElementKind::List,
            };
            self.push(kind, block.start, block.end);
        }
    }

    fn extend(&mut self, kind: BlockKind, line_start: usize, line_end: usize) {
        match &mut self.block {
            Some(block) if block.kind == kind => block.end = line_end,
            _ => {
                self.flush();
                self.block = Some(OpenBlock {
                    kind,
                    start: line_start,
                    end: line_end,
                });
            }
        }
    }
}

impl Parser for MarkdownParser {
    fn parse(&self, text: &str) -> ParsedDocument {
        let mut builder = Builder {
            text,
            section: SectionPath::new(),
            elements: Vec::new(),
            block: None,
        };
        let mut fence: Option<OpenFence> = None;
        let mut title = None;

        for (offset, line) in span::lines(text) {
            let line_end = offset + line.len();

            if let Some(open) = &fence {
                if closes_fence(line, open) {
                    let language = open.language.clone();
                    builder.push(ElementKind::CodeBlock { language }, open.start, line_end);
                    fence = None;
                }
                continue;
            }

            if self.preserve_code_blocks {
                if let Some(caps) = FENCE_OPEN.captures(line) {
                    let marker = &caps[1];
                    let info = &caps[2];
                    // Backtick fences cannot carry backticks in their info string
                    if !(marker.starts_with('`') && info.contains('`')) {
                        builder.flush();
                        fence = Some(OpenFence {
                            marker: marker.chars().next().unwrap_or('`'),
                            len: marker.len(),
                            start: offset,
                            language: (!info.is_empty()).then(|| info.to_string()),
                        });
                        continue;
                    }
                }
            }

            if let Some(caps) = HEADER.captures(line) {
                builder.flush();
                let level = caps[1].len() as u8;
                let header_title = caps[2].trim().to_string();
                if level == 1 && title.is_none() {
                    title = Some(header_title.clone());
                }
                builder.section.enter(level, header_title.clone());
                builder.push(
                    ElementKind::Header {
                        level,
                        title: header_title,
                    },
                    offset,
                    line_end,
                );
                continue;
            }

            if line.trim().is_empty() {
                builder.flush();
                continue;
            }

            if self.extract_lists && LIST_ITEM.is_match(line) {
                builder.extend(BlockKind::List, offset, line_end);
            } else {
                builder.extend(BlockKind::Paragraph, offset, line_end);
            }
        }

        if let Some(open) = fence {
            builder.push(
                ElementKind::CodeBlock {
                    language: open.language,
                },
                open.start,
                text.len(),
            );
        }
        builder.flush();

        ParsedDocument {
            elements: builder.elements,
            title,
            format: self.name(),
            rendered: None,
        }
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}

fn closes_fence(line: &str, open: &OpenFence) -> bool {
    FENCE_CLOSE.captures(line).is_some_and(|caps| {
        let marker = &caps[1];
        marker.starts_with(open.marker) && marker.len() >= open.len
    })
}
