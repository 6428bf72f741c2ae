//! Foundation types for the treeloom engine.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineIndex`] - Byte offset to line/column conversion
//! - [`Position`], [`Span`] - Line/column positions for diagnostics
//!
//! This module has NO dependencies on other treeloom modules.

mod line_index;
mod position;

pub use line_index::LineIndex;
pub use position::{Position, Span};
pub use text_size::{TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
