//! Syntax diagnostics
//!
//! Values produced from a finished tree by [`SyntaxTree::diagnostics`]:
//! - Codes grouped by category (lexical, structural, fallback)
//! - Messages naming the missing or unexpected token
//! - Related spans, e.g. where an unclosed delimiter was opened
//!
//! [`SyntaxTree::diagnostics`]: crate::tree::SyntaxTree::diagnostics

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{RelatedInfo, Severity, SyntaxError};
