use super::{CsvParser, HtmlParser, JsonParser, MarkdownParser, Parser, PlainTextParser};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Dynamic dispatch table for document parsers
pub struct ParserRegistry {
    /// Fallback parser for unknown extensions
    fallback: Arc<dyn Parser>,
    /// Extension -> Parser mapping
    map: HashMap<String, Arc<dyn Parser>>,
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd"];

const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

const PLAINTEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "log", "rst", "py", "js", "ts", "java", "c", "cpp", "h", "hpp", "cs", "go",
    "rs", "rb", "php", "swift", "kt", "scala", "r", "sql", "sh", "bash", "zsh", "ps1", "yaml",
    "yml", "toml", "ini", "cfg", "conf", "xml",
];

impl ParserRegistry {
    /// Create an empty registry with PlainTextParser as fallback
    pub fn new() -> Self {
        Self {
            fallback: Arc::new(PlainTextParser::new()),
            map: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in extension table
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let markdown: Arc<dyn Parser> = Arc::new(MarkdownParser::new());
        let plaintext: Arc<dyn Parser> = Arc::new(PlainTextParser::new());
        for ext in MARKDOWN_EXTENSIONS {
            registry.register_shared(*ext, Arc::clone(&markdown));
        }
        for ext in PLAINTEXT_EXTENSIONS {
            registry.register_shared(*ext, Arc::clone(&plaintext));
        }
        let html: Arc<dyn Parser> = Arc::new(HtmlParser::new());
        for ext in HTML_EXTENSIONS {
            registry.register_shared(*ext, Arc::clone(&html));
        }
        registry.register("json", JsonParser::new());
        registry.register("jsonl", JsonParser::new().json_lines(true));
        registry.register("ndjson", JsonParser::new().json_lines(true));
        registry.register("csv", CsvParser::new());
        registry.register("tsv", CsvParser::tsv());
        registry
    }

    /// Register a parser for a specific file extension
    ///
    /// # Arguments
    /// * `extension` - File extension without dot (e.g., "md"), case-insensitive
    /// * `parser` - Parser implementation
    pub fn register(&mut self, extension: impl Into<String>, parser: impl Parser + 'static) {
        self.register_shared(extension, Arc::new(parser));
    }

    /// Register an already shared parser
    pub fn register_shared(&mut self, extension: impl Into<String>, parser: Arc<dyn Parser>) {
        self.map.insert(extension.into().to_lowercase(), parser);
    }

    /// Select the appropriate parser for a given file path
    ///
    /// Falls back to PlainTextParser if no extension-specific parser exists
    pub fn select(&self, path: impl AsRef<Path>) -> Arc<dyn Parser> {
        self.map
            .get(&extension_of(path.as_ref()))
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Whether a parser is registered for the path's extension
    pub fn supports(&self, path: impl AsRef<Path>) -> bool {
        self.map.contains_key(&extension_of(path.as_ref()))
    }

    /// Get the number of registered extensions (excluding fallback)
    pub fn parser_count(&self) -> usize {
        self.map.len()
    }

    /// List all registered extensions
    pub fn registered_extensions(&self) -> Vec<&str> {
        self.map.keys().map(|s| s.as_str()).collect()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_to_plaintext() {
        let registry = ParserRegistry::new();
        let parser = registry.select("foo.xyz");
        assert_eq!(parser.name(), "plaintext");
    }

    #[test]
    fn test_extension_selection_is_case_insensitive() {
        let registry = ParserRegistry::with_defaults();
        assert_eq!(registry.select("README.md").name(), "markdown");
        assert_eq!(registry.select("notes/INTRO.MD").name(), "markdown");
        assert_eq!(registry.select("main.rs").name(), "plaintext");
        assert_eq!(registry.select("Makefile").name(), "plaintext");
        assert_eq!(registry.select("site/index.HTML").name(), "html");
        assert_eq!(registry.select("data.json").name(), "json");
        assert_eq!(registry.select("events.jsonl").name(), "json");
        assert_eq!(registry.select("table.csv").name(), "csv");
        assert_eq!(registry.select("table.tsv").name(), "tsv");
    }

    #[test]
    fn test_supports_registered_extensions_only() {
        let registry = ParserRegistry::with_defaults();
        assert!(registry.supports("docs/guide.markdown"));
        assert!(registry.supports("LOG.TXT"));
        assert!(!registry.supports("image.png"));
        assert!(!registry.supports("Makefile"));
        assert!(!ParserRegistry::new().supports("README.md"));
    }
}
