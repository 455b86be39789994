use serde::Serialize;
use std::fmt;

/// Result of parsing a document
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Structural elements in document order
    pub elements: Vec<StructuralElement>,
    /// Title of the first level-1 header, if any
    pub title: Option<String>,
    /// Format name of the parser that produced this document
    pub format: &'static str,
    /// Readable text the element spans index into, for formats whose markup
    /// is not itself chunkable (HTML, JSON, CSV). `None` means the spans
    /// index into the parsed input.
    pub rendered: Option<String>,
}

/// A position-tagged block of the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralElement {
    /// What kind of block this is
    pub kind: ElementKind,
    /// Verbatim `source[start..end]`, see [`ParsedDocument::source`]
    pub content: String,
    /// Byte offset in the document source (start)
    pub start: usize,
    /// Byte offset in the document source (end, exclusive)
    pub end: usize,
    /// Headers enclosing this element (a header includes itself)
    pub section_path: SectionPath,
}

/// Classification of structural elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// ATX header, level 1..=6
    Header { level: u8, title: String },
    /// Fenced code block including both fences
    CodeBlock { language: Option<String> },
    /// Run of adjacent bullet or numbered list lines
    List,
    /// Anything else, delimited by blank lines
    Paragraph,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Header { .. } => "header",
            ElementKind::CodeBlock { .. } => "code",
            ElementKind::List => "list",
            ElementKind::Paragraph => "paragraph",
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, ElementKind::Header { .. })
    }
}

impl StructuralElement {
    pub fn position(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// Breadcrumb of enclosing headers, e.g. "Chapter 1 > Section 1.1"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SectionPath(Vec<(u8, String)>);

impl SectionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a header: drop entries at the same or a deeper level, then append
    pub fn enter(&mut self, level: u8, title: impl Into<String>) {
        self.0.retain(|(l, _)| *l < level);
        self.0.push((level, title.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, t)| t.as_str())
    }

    /// Rendered breadcrumb, `None` outside any section
    pub fn header(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, title) in self.titles().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            f.write_str(title)?;
        }
        Ok(())
    }
}

impl ParsedDocument {
    /// Text the element spans index into: the rendering when there is one,
    /// otherwise `input`, the text that was parsed
    pub fn source<'a>(&'a self, input: &'a str) -> &'a str {
        self.rendered.as_deref().unwrap_or(input)
    }

    pub fn headers(&self) -> impl Iterator<Item = &StructuralElement> {
        self.elements.iter().filter(|e| e.kind.is_header())
    }

    pub fn code_blocks(&self) -> impl Iterator<Item = &StructuralElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e.kind, ElementKind::CodeBlock { .. }))
    }

    /// `(level, title)` for every header in order
    pub fn outline(&self) -> Vec<(u8, String)> {
        self.elements
            .iter()
            .filter_map(|e| match &e.kind {
                ElementKind::Header { level, title } => Some((*level, title.clone())),
                _ => None,
            })
            .collect()
    }

    /// All element contents joined by blank lines
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .map(|e| e.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
