mod data;
mod html;
mod markdown;
mod plaintext;
mod registry;
mod result;


pub use data::{CsvParser, JsonParser, RowFormat};
pub use html::HtmlParser;
pub use markdown::MarkdownParser;
pub use plaintext::PlainTextParser;
pub use registry::ParserRegistry;
pub use result::{ElementKind, ParsedDocument, SectionPath, StructuralElement};

/// Core trait that all structure parsers must implement
pub trait Parser: Send + Sync {
    /// Parse raw text into position-tagged structural elements
    ///
    /// # Arguments
    /// * `text` - Full document text
    ///
    /// # Returns
    /// Elements in document order whose spans never overlap; everything
    /// outside the spans is whitespace. Spans index into
    /// [`ParsedDocument::source`], which is `text` unless the parser renders
    /// its input into readable text first
    fn parse(&self, text: &str) -> ParsedDocument;

    /// Short format name (e.g. "markdown")
    fn name(&self) -> &'static str;
}
