use super::{ElementKind, ParsedDocument, Parser, SectionPath, StructuralElement};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid title selector"));

/// Subtrees that never carry readable text
const SKIP_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "meta", "link", "svg",
];

/// Elements that break the flow of inline text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "ul",
];

/// HTML structure parser.
///
/// Markup is rendered into plain text (one block per element, separated by
/// blank lines) and element spans index into that rendering, which the
/// document carries in [`ParsedDocument::rendered`]. Headings become headers,
/// `<pre>` becomes a code block, `<ul>`/`<ol>` and tables become lists with
/// one line per item or row, and `<p>`/`<blockquote>` and loose text become
/// paragraphs.
#[derive(Debug, Clone, Copy)]
pub struct HtmlParser {
    extract_tables: bool,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self {
            extract_tables: true,
        }
    }

    /// When false, tables are dropped from the rendering
    pub fn extract_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates the rendered text and the elements that point into it
pub(super) struct Renderer {
    pub text: String,
    pub elements: Vec<StructuralElement>,
    section: SectionPath,
    // Inline text waiting for the next block boundary
    pending: String,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            elements: Vec::new(),
            section: SectionPath::new(),
            pending: String::new(),
        }
    }

    /// Queue inline text; it becomes a paragraph at the next block boundary
    pub fn inline(&mut self, text: &str) {
        let text = collapse(text);
        if text.is_empty() {
            return;
        }
        if !self.pending.is_empty() {
            self.pending.push(' ');
        }
        self.pending.push_str(&text);
    }

    pub fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.append(ElementKind::Paragraph, &pending);
    }

    /// Append one block; blank content is skipped
    pub fn push(&mut self, kind: ElementKind, content: &str) {
        self.flush();
        self.append(kind, content);
    }

    fn append(&mut self, kind: ElementKind, content: &str) {
        let content = content.trim_matches(|c: char| c == '\n' || c == '\r').trim_end();
        if content.trim().is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        let start = self.text.len();
        self.text.push_str(content);
        let end = self.text.len();

        if let ElementKind::Header { level, title } = &kind {
            self.section.enter(*level, title.clone());
        }
        self.elements.push(StructuralElement {
            kind,
            content: content.to_string(),
            start,
            end,
            section_path: self.section.clone(),
        });
    }

    pub fn finish(mut self, title: Option<String>, format: &'static str) -> ParsedDocument {
        self.flush();
        ParsedDocument {
            elements: self.elements,
            title,
            format,
            rendered: Some(self.text),
        }
    }
}

/// Collapse runs of whitespace into single spaces
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inner_text(element: ElementRef<'_>) -> String {
    collapse(&element.text().collect::<String>())
}

/// `language-x` / `lang-x` class on the block or its `<code>` child
fn code_language(pre: ElementRef<'_>) -> Option<String> {
    let code = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code");
    [Some(pre), code]
        .into_iter()
        .flatten()
        .flat_map(|el| el.value().classes())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .map(str::to_string)
        })
}

impl HtmlParser {
    fn walk(&self, element: ElementRef<'_>, out: &mut Renderer) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.inline(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&self, element: ElementRef<'_>, out: &mut Renderer) {
        let name = element.value().name();
        if SKIP_TAGS.contains(&name) {
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let title = inner_text(element);
                let level = name[1..].parse().unwrap_or(1);
                out.push(
                    ElementKind::Header {
                        level,
                        title: title.clone(),
                    },
                    &title,
                );
            }
            "pre" => {
                let language = code_language(element);
                let code: String = element.text().collect();
                out.push(ElementKind::CodeBlock { language }, &code);
            }
            "ul" | "ol" => {
                let items: Vec<String> = element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| child.value().name() == "li")
                    .map(inner_text)
                    .filter(|item| !item.is_empty())
                    .map(|item| format!("- {}", item))
                    .collect();
                out.push(ElementKind::List, &items.join("\n"));
            }
            "table" => {
                if self.extract_tables {
                    out.push(ElementKind::List, &table_rows(element).join("\n"));
                }
            }
            "p" | "blockquote" | "figcaption" | "dt" | "dd" => {
                out.push(ElementKind::Paragraph, &inner_text(element));
            }
            _ if is_block(element) => {
                out.flush();
                self.walk(element, out);
                out.flush();
            }
            _ => out.inline(&inner_text(element)),
        }
    }
}

/// Whether the element is, or contains, a block-level element
fn is_block(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| BLOCK_TAGS.contains(&el.value().name()))
}

/// One `| a | b |` line per row
fn table_rows(table: ElementRef<'_>) -> Vec<String> {
    static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid row selector"));
    static CELL: Lazy<Selector> =
        Lazy::new(|| Selector::parse("th, td").expect("valid cell selector"));

    table
        .select(&ROW)
        .map(|row| row.select(&CELL).map(inner_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .map(|cells| format!("| {} |", cells.join(" | ")))
        .collect()
}

impl Parser for HtmlParser {
    fn parse(&self, text: &str) -> ParsedDocument {
        let document = Html::parse_document(text);
        let mut renderer = Renderer::new();
        self.walk(document.root_element(), &mut renderer);

        let title = document
            .select(&TITLE)
            .next()
            .map(inner_text)
            .filter(|t| !t.is_empty())
            .or_else(|| {
                renderer.elements.iter().find_map(|e| match &e.kind {
                    ElementKind::Header { level: 1, title } => Some(title.clone()),
                    _ => None,
                })
            });

        renderer.finish(title, self.name())
    }

    fn name(&self) -> &'static str {
        "html"
    }
}
