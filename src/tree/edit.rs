//! Byte-range edits and position mapping
//!
//! Editing a tree never rebuilds it. The edit is recorded next to the
//! shared green root and every position read through the red layer is
//! mapped through the recorded edits:
//!
//! ```text
//!              start        old_end
//! old text  ───────[  removed  ]────────
//! new text  ───────[ inserted ]─────────
//!              start      new_end
//!
//! x <= start     → x
//! x >= old_end   → x - old_end + new_end
//! otherwise      → new_end
//! ```
//!
//! A node whose extent (end plus the bytes its construction looked at)
//! lies entirely before the edit, or that starts at or after `old_end`, is
//! unaffected and only shifts. Anything else is marked changed.

use serde::{Deserialize, Serialize};

/// Replacement of the byte range `start_byte..old_end_byte` by new text
/// ending at `new_end_byte`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputEdit {
    pub start_byte: u32,
    pub old_end_byte: u32,
    pub new_end_byte: u32,
}

impl InputEdit {
    pub fn new(start_byte: u32, old_end_byte: u32, new_end_byte: u32) -> Self {
        Self {
            start_byte,
            old_end_byte: old_end_byte.max(start_byte),
            new_end_byte: new_end_byte.max(start_byte),
        }
    }

    pub fn insert(at: u32, len: u32) -> Self {
        Self::new(at, at, at + len)
    }

    pub fn delete(start: u32, end: u32) -> Self {
        Self::new(start, end, start)
    }

    /// Splice `replacement` over `start..old_end` of `source`, returning the
    /// new text and the matching edit.
    pub fn splice(source: &[u8], start: u32, old_end: u32, replacement: &[u8]) -> (Vec<u8>, Self) {
        let start = start.min(source.len() as u32);
        let old_end = old_end.clamp(start, source.len() as u32);
        let mut text = Vec::with_capacity(source.len() + replacement.len());
        text.extend_from_slice(&source[..start as usize]);
        text.extend_from_slice(replacement);
        text.extend_from_slice(&source[old_end as usize..]);
        let edit = Self::new(start, old_end, start + replacement.len() as u32);
        (text, edit)
    }

    /// Length change of the text
    pub fn delta(&self) -> i64 {
        self.new_end_byte as i64 - self.old_end_byte as i64
    }

    /// Map an old-text offset into the new text
    pub fn map_position(&self, offset: u32) -> u32 {
        if offset <= self.start_byte {
            offset
        } else if offset >= self.old_end_byte {
            offset - self.old_end_byte + self.new_end_byte
        } else {
            self.new_end_byte
        }
    }
}

impl InputEdit {
    /// Move an offset at or past `old_end_byte` by the length change
    fn shift(&self, offset: u32) -> u32 {
        offset - self.old_end_byte + self.new_end_byte
    }
}

/// A node's span in new-text coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MappedSpan {
    pub start: u32,
    pub end: u32,
    /// End of the bytes that influenced the node, in new coordinates
    pub extent_end: u32,
    pub changed: bool,
}

/// Map `start..end` (with influence up to `extent_end`) through `edits`,
/// applied in order.
pub(crate) fn map_span(edits: &[InputEdit], start: u32, end: u32, extent_end: u32) -> MappedSpan {
    let mut span = MappedSpan {
        start,
        end,
        extent_end,
        changed: false,
    };
    for edit in edits {
        if !span.changed {
            if span.extent_end <= edit.start_byte {
                continue;
            }
            if span.start >= edit.old_end_byte {
                // Also moves a node starting right at an insertion point.
                span.start = edit.shift(span.start);
                span.end = edit.shift(span.end);
                span.extent_end = edit.shift(span.extent_end);
                continue;
            }
            span.changed = true;
        }
        span.start = edit.map_position(span.start);
        span.end = edit.map_position(span.end);
        span.extent_end = edit.map_position(span.extent_end);
    }
    span
}
