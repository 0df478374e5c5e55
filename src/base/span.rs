//! Byte offset to line/column conversion.

use super::Span;
use text_size::{TextRange, TextSize};

/// A zero-based line/column pair. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Maps byte offsets of one source text to line/column pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Offset of the first byte of every line.
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::new(offset as u32 + 1));
            }
        }
        Self { line_starts }
    }

    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Convert a byte range into a line/column [`Span`].
    pub fn span(&self, range: TextRange) -> Span {
        Span::new(
            self.line_col(range.start()).into(),
            self.line_col(range.end()).into(),
        )
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Position;

    #[test]
    fn test_line_col_first_line() {
        let index = LineIndex::new("class A;\nclass B;");
        assert_eq!(index.line_col(TextSize::new(0)), LineCol { line: 0, col: 0 });
        assert_eq!(index.line_col(TextSize::new(6)), LineCol { line: 0, col: 6 });
    }

    #[test]
    fn test_line_col_after_newline() {
        let index = LineIndex::new("class A;\nclass B;");
        assert_eq!(index.line_col(TextSize::new(9)), LineCol { line: 1, col: 0 });
        assert_eq!(index.line_col(TextSize::new(15)), LineCol { line: 1, col: 6 });
        assert_eq!(index.line_count(), 2);
    }

    #[test]
    fn test_span_conversion() {
        let index = LineIndex::new("a\nbc\nd");
        let span = index.span(TextRange::new(TextSize::new(2), TextSize::new(6)));
        assert_eq!(span.start, Position::new(1, 0));
        assert_eq!(span.end, Position::new(2, 1));
        assert_eq!(span.to_string(), "2:1-3:2");
    }

    #[test]
    fn test_single_line_span_display() {
        let index = LineIndex::new("int value;");
        let span = index.span(TextRange::new(TextSize::new(4), TextSize::new(9)));
        assert!(!span.is_multiline());
        assert_eq!(span.to_string(), "1:5-10");
    }
}
