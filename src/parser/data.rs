//! Parsers for structured data files.
//!
//! JSON and CSV carry no prose of their own, so both render their records as
//! readable `key: value` text. Like HTML, element spans index into that
//! rendering ([`ParsedDocument::rendered`]), never into the raw input.

use super::html::Renderer;
use super::{ElementKind, ParsedDocument, Parser, PlainTextParser};
use serde_json::{Map, Value};
use tracing::warn;

/// JSON (and JSON Lines) parser.
///
/// A top-level array yields one paragraph per item, a top-level object one
/// paragraph per key. Nested objects are flattened into dotted keys
/// (`owner.name: Ada`), arrays of scalars are joined with commas and other
/// arrays are indexed (`tags[0].id: 7`). Input that is not valid JSON is
/// parsed as plain text.
#[derive(Debug, Clone, Copy)]
pub struct JsonParser {
    json_lines: bool,
    flatten: bool,
    max_depth: usize,
    include_nulls: bool,
}

impl JsonParser {
    pub fn new() -> Self {
        Self {
            json_lines: false,
            flatten: true,
            max_depth: 10,
            include_nulls: false,
        }
    }

    /// Treat every non-blank line as a separate JSON value
    pub fn json_lines(mut self, enabled: bool) -> Self {
        self.json_lines = enabled;
        self
    }

    /// When false, nested objects are rendered inline as compact JSON
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Objects nested deeper than this are rendered as compact JSON
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn include_nulls(mut self, include: bool) -> Self {
        self.include_nulls = include;
        self
    }

    fn values(&self, text: &str) -> serde_json::Result<Vec<Value>> {
        if self.json_lines {
            return text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<Value>)
                .collect();
        }
        match serde_json::from_str::<Value>(text)? {
            Value::Array(items) => Ok(items),
            value => Ok(vec![value]),
        }
    }

    fn object_lines(&self, object: &Map<String, Value>, prefix: &str, depth: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for (key, value) in object {
            let key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            self.value_lines(&key, value, depth, &mut lines);
        }
        lines
    }

    fn value_lines(&self, key: &str, value: &Value, depth: usize, lines: &mut Vec<String>) {
        match value {
            Value::Null if !self.include_nulls => {}
            Value::Object(object) if self.flatten && depth < self.max_depth => {
                lines.extend(self.object_lines(object, key, depth + 1));
            }
            Value::Array(items) if items.iter().all(is_scalar) => {
                let joined: Vec<String> = items.iter().map(scalar_text).collect();
                lines.push(format!("{}: {}", key, joined.join(", ")));
            }
            Value::Array(items) if depth < self.max_depth => {
                for (i, item) in items.iter().enumerate() {
                    self.value_lines(&format!("{}[{}]", key, i), item, depth + 1, lines);
                }
            }
            _ => lines.push(format!("{}: {}", key, scalar_text(value))),
        }
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Strings without quotes, everything else as compact JSON
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Parser for JsonParser {
    fn parse(&self, text: &str) -> ParsedDocument {
        let values = match self.values(text) {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "invalid JSON, parsing as plain text");
                return PlainTextParser::new().parse(text);
            }
        };

        let mut renderer = Renderer::new();
        for value in &values {
            match value {
                Value::Object(object) if values.len() == 1 => {
                    for (key, value) in object {
                        let mut lines = Vec::new();
                        self.value_lines(key, value, 1, &mut lines);
                        renderer.push(ElementKind::Paragraph, &lines.join("\n"));
                    }
                }
                Value::Object(object) => {
                    let lines = self.object_lines(object, "", 1);
                    renderer.push(ElementKind::Paragraph, &lines.join("\n"));
                }
                other => renderer.push(ElementKind::Paragraph, &scalar_text(other)),
            }
        }
        renderer.finish(None, self.name())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// How CSV rows are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// `name: Ada, age: 36`
    KeyValue,
    /// Markdown table with the header row repeated per element
    Table,
    /// Cells joined by the delimiter
    Raw,
}

/// CSV / TSV parser.
///
/// Rows are grouped `rows_per_element` at a time into list elements with
/// one line per row, so a group is kept whole when lists are preserved and
/// split by row otherwise. Malformed records are skipped with a warning.
#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    delimiter: u8,
    has_header: bool,
    rows_per_element: usize,
    format: RowFormat,
}

impl CsvParser {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            rows_per_element: 1,
            format: RowFormat::KeyValue,
        }
    }

    /// Tab-separated values
    pub fn tsv() -> Self {
        Self::new().delimiter(b'\t')
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// When false, the first row is data and rows render without keys
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Rows per element, at least one
    pub fn rows_per_element(mut self, rows: usize) -> Self {
        self.rows_per_element = rows.max(1);
        self
    }

    pub fn format(mut self, format: RowFormat) -> Self {
        self.format = format;
        self
    }

    fn records(&self, text: &str) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            match record {
                Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
                Err(e) => warn!(record = line + 1, error = %e, "skipping malformed CSV record"),
            }
        }
        rows
    }

    fn render_row(&self, row: &[String], headers: Option<&[String]>) -> String {
        match (self.format, headers) {
            (RowFormat::KeyValue, Some(headers)) => row
                .iter()
                .enumerate()
                .map(|(i, cell)| match headers.get(i) {
                    Some(header) => format!("{}: {}", header, cell),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            (RowFormat::KeyValue, None) => row.join(", "),
            (RowFormat::Table, _) => format!("| {} |", row.join(" | ")),
            (RowFormat::Raw, _) => {
                let delimiter = char::from(self.delimiter).to_string();
                row.join(&delimiter)
            }
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for CsvParser {
    fn parse(&self, text: &str) -> ParsedDocument {
        let mut rows = self.records(text);
        let headers = if self.has_header && !rows.is_empty() {
            Some(rows.remove(0))
        } else {
            None
        };

        let mut renderer = Renderer::new();
        for batch in rows.chunks(self.rows_per_element) {
            let mut lines = Vec::with_capacity(batch.len() + 2);
            if let (RowFormat::Table, Some(headers)) = (self.format, &headers) {
                lines.push(self.render_row(headers, None));
                lines.push(format!("|{}|", vec!["---"; headers.len()].join("|")));
            }
            for row in batch {
                lines.push(self.render_row(row, headers.as_deref()));
            }
            renderer.push(ElementKind::List, &lines.join("\n"));
        }
        renderer.finish(None, self.name())
    }

    fn name(&self) -> &'static str {
        if self.delimiter == b'\t' {
            "tsv"
        } else {
            "csv"
        }
    }
}
