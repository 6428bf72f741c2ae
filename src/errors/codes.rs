//! Diagnostic codes
//!
//! Codes follow the pattern E{category}{number}:
//! - E01xx: lexical (unmatched input, unterminated literals)
//! - E02xx: structural (terminators and delimiters)
//! - E09xx: fallback

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical
    // =========================================================================
    /// Input no token pattern matches
    E0101,
    /// String closed by neither its quote nor the end of the line
    E0102,
    /// Block comment running to the end of the input
    E0103,

    // =========================================================================
    // E02xx: Structural
    // =========================================================================
    /// Missing statement terminator
    E0201,
    /// Unclosed brace
    E0202,
    /// Unclosed parenthesis
    E0203,
    /// Unclosed bracket
    E0204,
    /// Closing delimiter with nothing to close
    E0205,

    // =========================================================================
    // E09xx: Fallback
    // =========================================================================
    /// Token the grammar does not allow here
    E0901,
    /// Token the parser had to assume
    E0902,
    /// Parse stopped before the end of input
    E0999,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0204 => "E0204",
            Self::E0205 => "E0205",
            Self::E0901 => "E0901",
            Self::E0902 => "E0902",
            Self::E0999 => "E0999",
        }
    }

    /// Message used when nothing more specific is known
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "invalid character",
            Self::E0102 => "unterminated string literal",
            Self::E0103 => "unterminated block comment",
            Self::E0201 => "missing terminator",
            Self::E0202 => "unclosed brace",
            Self::E0203 => "unclosed parenthesis",
            Self::E0204 => "unclosed bracket",
            Self::E0205 => "unexpected closing delimiter",
            Self::E0901 => "unexpected token",
            Self::E0902 => "expected token",
            Self::E0999 => "parse stopped early",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
