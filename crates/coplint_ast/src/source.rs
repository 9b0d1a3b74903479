//! Source text with a line index.
//!
//! A [`SourceBuffer`] is built once per correction pass and never mutated;
//! rewriting a file produces a new buffer.

use crate::{Location, Position, Span};

/// Pre-computed metadata for a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    /// Byte offset of line start (inclusive).
    pub start: u32,
    /// Byte offset of end of line content, excluding `\n` and a preceding `\r`.
    pub end: u32,
    /// Byte offset just past the line terminator (equals `end` on the last line).
    pub next: u32,
}

impl LineInfo {
    /// Span of the line content without the terminator.
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Span of the line including its terminator.
    pub fn full_span(&self) -> Span {
        Span::new(self.start, self.next)
    }
}

/// Raw source text plus a line/offset index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    text: String,
    lines: Vec<LineInfo>,
}

impl SourceBuffer {
    /// Creates a buffer and indexes its lines.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = index_lines(&text);
        Self { text, lines }
    }

    /// Returns the full source text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the length of the text in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    /// Returns true if the buffer holds no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines. An empty buffer has one (empty) line, and a trailing
    /// newline does not start an extra line.
    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Metadata of a 1-indexed line.
    pub fn line(&self, line: u32) -> Option<&LineInfo> {
        self.lines.get(line.checked_sub(1)? as usize)
    }

    /// Iterates over all lines with their 1-indexed numbers.
    pub fn lines(&self) -> impl Iterator<Item = (u32, &LineInfo)> {
        self.lines.iter().enumerate().map(|(i, l)| (i as u32 + 1, l))
    }

    /// Text of a 1-indexed line without its terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        self.line(line).map(|info| self.slice(info.span()))
    }

    /// Converts a byte offset into a line/column position.
    ///
    /// Offsets past the end clamp to the end of the buffer.
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.len());
        let idx = self
            .lines
            .partition_point(|line| line.start <= offset)
            .saturating_sub(1);
        let line = &self.lines[idx];
        Position::new(idx as u32 + 1, offset - line.start)
    }

    /// Converts a line/column position back into a byte offset.
    pub fn offset(&self, position: Position) -> Option<u32> {
        let line = self.line(position.line)?;
        let offset = line.start.checked_add(position.column)?;
        (offset <= line.next).then_some(offset)
    }

    /// Converts a span into start/end positions.
    pub fn location(&self, span: Span) -> Location {
        Location::new(self.position(span.start), self.position(span.end))
    }

    /// Returns the text covered by `span`, or an empty string when the span
    /// is out of bounds or splits a character.
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.range()).unwrap_or("")
    }

    /// Returns true when `offset` is a valid UTF-8 boundary in the text.
    pub fn is_char_boundary(&self, offset: u32) -> bool {
        self.text.is_char_boundary(offset as usize)
    }

    /// Consumes the buffer and returns its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

fn index_lines(text: &str) -> Vec<LineInfo> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            let end = if i > start && bytes[i - 1] == b'\r' {
                i - 1
            } else {
                i
            };
            lines.push(LineInfo {
                start: start as u32,
                end: end as u32,
                next: (i + 1) as u32,
            });
            start = i + 1;
        }
    }

    if start < text.len() || lines.is_empty() {
        lines.push(LineInfo {
            start: start as u32,
            end: text.len() as u32,
            next: text.len() as u32,
        });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn indexes_lines_without_terminators() {
        let buffer = SourceBuffer::new("a = 1\nbb\r\n\nlast");

        assert_eq!(buffer.line_count(), 4);
        assert_eq!(buffer.line_text(1), Some("a = 1"));
        assert_eq!(buffer.line_text(2), Some("bb"));
        assert_eq!(buffer.line_text(3), Some(""));
        assert_eq!(buffer.line_text(4), Some("last"));
        assert_eq!(buffer.line_text(5), None);
        assert_eq!(buffer.line_text(0), None);
    }

    #[test]
    fn trailing_newline_does_not_add_a_line() {
        let buffer = SourceBuffer::new("one\ntwo\n");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line(2).map(|l| l.full_span()), Some(Span::new(4, 8)));
    }

    #[test]
    fn empty_buffer_has_one_line() {
        let buffer = SourceBuffer::new("");
        assert_eq!(buffer.line_count(), 1);
        assert_eq!(buffer.position(0), Position::new(1, 0));
    }

    #[rstest]
    #[case(0, Position::new(1, 0))]
    #[case(4, Position::new(1, 4))]
    #[case(5, Position::new(2, 0))]
    #[case(7, Position::new(2, 2))]
    #[case(100, Position::new(2, 3))]
    fn maps_offsets_to_positions(#[case] offset: u32, #[case] expected: Position) {
        let buffer = SourceBuffer::new("abcd\nxyz");
        assert_eq!(buffer.position(offset), expected);
    }

    #[test]
    fn maps_positions_back_to_offsets() {
        let buffer = SourceBuffer::new("abcd\nxyz");
        assert_eq!(buffer.offset(Position::new(2, 1)), Some(6));
        assert_eq!(buffer.offset(Position::new(1, 5)), Some(5));
        assert_eq!(buffer.offset(Position::new(1, 6)), None);
        assert_eq!(buffer.offset(Position::new(3, 0)), None);
    }

    #[test]
    fn multibyte_columns_are_bytes() {
        let buffer = SourceBuffer::new("s = \"東京\"\n");
        let loc = buffer.location(Span::new(4, 12));
        assert_eq!(loc.start, Position::new(1, 4));
        assert_eq!(loc.end, Position::new(1, 12));
        assert!(!buffer.is_char_boundary(6));
        assert_eq!(buffer.slice(Span::new(5, 6)), "");
    }
}
