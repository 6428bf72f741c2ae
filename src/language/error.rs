//! Error types for grammar artifacts.

use thiserror::Error;

/// Errors raised while loading or validating a [`Language`](super::Language).
///
/// All of these are fatal: a language that fails to load is never handed to
/// a parser.
#[derive(Debug, Error)]
pub enum LanguageError {
    /// The artifact was produced for a different engine ABI.
    #[error("Language version mismatch: engine expects {expected}, artifact is {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// Table dimensions or indices are inconsistent.
    #[error("Malformed language artifact: {0}")]
    Malformed(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LanguageError {
    /// Create a malformed-artifact error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
