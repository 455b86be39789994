//! Byte-offset helpers shared by the parser, segmenter and packer.

/// Iterate over lines as `(start_offset, line)` pairs.
///
/// `line` excludes the terminating `\n` (and a preceding `\r`), so
/// `start_offset + line.len()` is the end of the line's content.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        (start, line)
    })
}

/// Shrink `start..end` so it begins and ends on non-whitespace.
///
/// Returns `None` when the range holds only whitespace.
pub(crate) fn trimmed_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let trimmed = slice.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let lead = slice.len() - trimmed.len();
    let trail = trimmed.len() - trimmed.trim_end().len();
    Some((start + lead, end - trail))
}

/// Largest char boundary of `text` that is not past `index`
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_offsets() {
        let text = "ab\r\ncd\n\nef";
        let lines: Vec<_> = lines(text).collect();
        assert_eq!(lines, vec![(0, "ab"), (4, "cd"), (7, ""), (8, "ef")]);
    }

    #[test]
    fn test_trimmed_span() {
        let text = "  hello world \n";
        assert_eq!(trimmed_span(text, 0, text.len()), Some((2, 13)));
        assert_eq!(trimmed_span(" \n\t", 0, 3), None);
    }

    #[test]
    fn test_floor_char_boundary() {
        let text = "caf\u{e9}!";
        assert_eq!(floor_char_boundary(text, 4), 3);
        assert_eq!(floor_char_boundary(text, 5), 5);
        assert_eq!(floor_char_boundary(text, 99), text.len());
    }
}
