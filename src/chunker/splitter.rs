use super::chunk::chunk_id;
use super::ChunkerConfig;
use crate::error::TokenizerError;
use crate::parser::{ElementKind, SectionPath, StructuralElement};
use crate::segmenter::Segmenter;
use crate::span;
use crate::tokenizer::Tokenizer;
use std::borrow::Cow;

/// Smallest piece the packer may place into a chunk
#[derive(Debug, Clone, Copy)]
pub(crate) struct PackingUnit<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub tokens: usize,
    pub is_header: bool,
    pub section: &'a SectionPath,
}

/// A packed chunk before indices and ids are assigned
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Draft {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub token_count: usize,
    pub section_header: Option<String>,
    pub parent_chunk_id: Option<String>,
}

/// Greedy token-bounded packer over one document
pub(crate) struct Packer<'a> {
    pub source: &'a str,
    pub config: &'a ChunkerConfig,
    pub tokenizer: &'a dyn Tokenizer,
}

impl<'a> Packer<'a> {
    /// Turn elements into packing units.
    ///
    /// Paragraphs become sentences. Headers are always whole; code blocks and
    /// lists are whole when preserved and fall back to one unit per line
    /// otherwise.
    pub fn units(
        &self,
        elements: &'a [StructuralElement],
        segmenter: &Segmenter,
    ) -> Result<Vec<PackingUnit<'a>>, TokenizerError> {
        let mut units = Vec::new();

        for element in elements {
            let atomic = match element.kind {
                ElementKind::Header { .. } => true,
                ElementKind::CodeBlock { .. } => self.config.preserve_code_blocks,
                ElementKind::List => self.config.preserve_lists,
                ElementKind::Paragraph => false,
            };
            let content = element.content.as_str();
            let mut push = |start: usize, end: usize| -> Result<(), TokenizerError> {
                let text = &content[start..end];
                units.push(PackingUnit {
                    text,
                    start: element.start + start,
                    end: element.start + end,
                    tokens: self.tokenizer.count_tokens(text)?,
                    is_header: element.kind.is_header(),
                    section: &element.section_path,
                });
                Ok(())
            };

            if atomic {
                push(0, content.len())?;
            } else if matches!(element.kind, ElementKind::Paragraph) {
                for sentence in segmenter.segment(content) {
                    push(sentence.start, sentence.end)?;
                }
            } else {
                for (offset, line) in span::lines(content) {
                    if let Some((s, e)) = span::trimmed_span(content, offset, offset + line.len()) {
                        push(s, e)?;
                    }
                }
            }
        }

        Ok(units)
    }

    /// Pack units into drafts according to the rules:
    /// - Grow the current chunk while its text stays within max_tokens
    /// - Seed each new chunk with whole trailing units up to overlap_tokens
    /// - Hard-split a unit that exceeds max_tokens on its own
    pub fn pack(&self, units: &[PackingUnit<'a>]) -> Result<Vec<Draft>, TokenizerError> {
        let max_tokens = self.config.max_tokens;
        let mut drafts = Vec::new();
        let mut current: Vec<PackingUnit<'a>> = Vec::new();

        for &unit in units {
            // If this unit alone exceeds max_tokens, split it separately
            if unit.tokens > max_tokens {
                if !current.is_empty() {
                    drafts.push(self.draft(&current)?);
                    current.clear();
                }
                drafts.extend(self.hard_split(&unit)?);
                continue;
            }

            current.push(unit);
            if current.len() == 1 || self.count_span(&current)? <= max_tokens {
                continue;
            }
            current.pop();
            drafts.push(self.draft(&current)?);

            // The seed must leave room for the pending unit
            let mut seed = self.overlap_suffix(&current)?;
            seed.push(unit);
            while seed.len() > 1 && self.count_span(&seed)? > max_tokens {
                seed.remove(0);
            }
            current = seed;
        }

        // Flush remaining units
        if !current.is_empty() {
            drafts.push(self.draft(&current)?);
        }

        Ok(drafts)
    }

    /// Longest run of trailing whole units within overlap_tokens
    fn overlap_suffix(
        &self,
        units: &[PackingUnit<'a>],
    ) -> Result<Vec<PackingUnit<'a>>, TokenizerError> {
        if units.is_empty() || self.config.overlap_tokens == 0 {
            return Ok(Vec::new());
        }

        let mut first = units.len();
        for i in (0..units.len()).rev() {
            if self.count_span(&units[i..])? > self.config.overlap_tokens {
                break;
            }
            first = i;
        }
        Ok(units[first..].to_vec())
    }

    /// Last resort for a unit larger than max_tokens: cut it at raw token
    /// boundaries into pieces of exactly max_tokens (the last may be shorter).
    ///
    /// Piece positions come from the tokenizer's offsets when it has them,
    /// otherwise from decoded lengths. Pieces are contiguous and the last one
    /// always ends at the unit's end.
    fn hard_split(&self, unit: &PackingUnit<'a>) -> Result<Vec<Draft>, TokenizerError> {
        let tokens = self.tokenizer.encode(unit.text)?;
        let section_header = section_header(std::slice::from_ref(unit));
        if tokens.is_empty() {
            return Ok(vec![self.draft(std::slice::from_ref(unit))?]);
        }

        let offsets = self
            .tokenizer
            .token_offsets(unit.text)?
            .filter(|offsets| offsets.len() == tokens.len());
        let parent = chunk_id(unit.text, (unit.start, unit.end));
        let max_tokens = self.config.max_tokens;
        let pieces = tokens.len().div_ceil(max_tokens);
        // Relative to the unit
        let mut cursor = 0;
        let mut drafts = Vec::with_capacity(pieces);

        for (i, group) in tokens.chunks(max_tokens).enumerate() {
            let text = self.tokenizer.decode(group)?;
            let start = cursor;
            let end = if i + 1 == pieces {
                unit.text.len()
            } else {
                let last_token = i * max_tokens + group.len() - 1;
                let end = offsets
                    .as_ref()
                    .and_then(|offsets| offsets.get(last_token))
                    .map_or(start + text.len(), |&(_, end)| end);
                span::floor_char_boundary(unit.text, end).max(start)
            };
            cursor = end;

            drafts.push(Draft {
                token_count: self.tokenizer.count_tokens(&text)?,
                text,
                start: unit.start + start,
                end: unit.start + end,
                section_header: section_header.clone(),
                parent_chunk_id: Some(parent.clone()),
            });
        }

        Ok(drafts)
    }

    fn draft(&self, units: &[PackingUnit<'a>]) -> Result<Draft, TokenizerError> {
        let (start, end) = match (units.first(), units.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (0, 0),
        };
        let text = self.span_text(units);
        Ok(Draft {
            token_count: self.tokenizer.count_tokens(&text)?,
            text: text.into_owned(),
            start,
            end,
            section_header: section_header(units),
            parent_chunk_id: None,
        })
    }

    /// Verbatim source text from the first unit's start to the last unit's end
    fn span_text(&self, units: &[PackingUnit<'a>]) -> Cow<'a, str> {
        let (Some(first), Some(last)) = (units.first(), units.last()) else {
            return Cow::Borrowed("");
        };
        match self.source.get(first.start..last.end) {
            Some(text) => Cow::Borrowed(text),
            // Elements that do not belong to `source`: join the units instead
            None => Cow::Owned(
                units
                    .iter()
                    .map(|u| u.text)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        }
    }

    /// Tokens in exactly the text a draft over `units` would carry
    fn count_span(&self, units: &[PackingUnit<'a>]) -> Result<usize, TokenizerError> {
        self.tokenizer.count_tokens(&self.span_text(units))
    }
}

/// Section of the first non-header unit, or of the leading header
fn section_header(units: &[PackingUnit<'_>]) -> Option<String> {
    units
        .iter()
        .find(|u| !u.is_header)
        .or(units.first())
        .and_then(|u| u.section.header())
}
