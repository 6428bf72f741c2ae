//! Byte offset to line/column conversion.

use super::{Position, Span, TextRange, TextSize};

/// Maps byte offsets of one source buffer to 0-based line/column positions.
///
/// Built once per buffer; lookups are a binary search over line starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (offset, byte) in source.iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(TextSize::new(offset as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::new(source.len() as u32),
        }
    }

    /// Number of lines (a trailing newline starts an empty last line)
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset; offsets past the end clamp to the end.
    pub fn position(&self, offset: TextSize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = u32::from(offset - self.line_starts[line]) as usize;
        Position::new(line, column)
    }

    /// Span of a byte range
    pub fn span(&self, range: TextRange) -> Span {
        Span::new(self.position(range.start()), self.position(range.end()))
    }

    /// Byte offset of a position, if it lies inside the buffer
    pub fn offset(&self, position: Position) -> Option<TextSize> {
        let start = *self.line_starts.get(position.line)?;
        let end = self
            .line_starts
            .get(position.line + 1)
            .copied()
            .unwrap_or(self.len);
        let offset = start + TextSize::new(position.column as u32);
        (offset <= end).then_some(offset)
    }
}
