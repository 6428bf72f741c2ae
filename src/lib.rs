//! # treeloom
//!
//! Grammar-driven incremental parsing engine. A compiled grammar (the parse
//! table artifact) drives a table-based lexer and an LR parser that always
//! produces a complete concrete syntax tree, recovers from malformed input
//! deterministically, and re-parses edited text by reusing unchanged subtrees
//! of the previous tree.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! moo       → Bundled MOO grammar
//!   ↓
//! parser    → LR driver, error recovery, incremental reuse
//!   ↓
//! tree      → Immutable shared syntax tree, cursor, edits, diagnostics
//!   ↓
//! errors    → Diagnostic values and codes
//!   ↓
//! lexer     → DFA interpreter with lexical states
//!   ↓
//! generate  → Grammar builder, LALR(1) and lexer table construction
//!   ↓
//! language  → Parse table artifact (versioned, serializable)
//!   ↓
//! base      → Primitives (TextRange, LineIndex, Position)
//! ```
//!
//! ## Example
//!
//! ```
//! use treeloom::{InputEdit, Parser, moo};
//!
//! let parser = Parser::new(moo::language().unwrap()).unwrap();
//! let source = b"x = 1 + 2;";
//! let tree = parser.parse(source, None).unwrap();
//! assert!(!tree.has_error());
//!
//! let (edited, edit) = InputEdit::splice(source, 8, 9, b"40");
//! let old = tree.edit(&edit);
//! let new = parser.parse(&edited, Some(&old)).unwrap();
//! assert_eq!(new.to_sexp(), parser.parse(&edited, None).unwrap().to_sexp());
//! ```

// ============================================================================
// MODULES (dependency order: base → language → generate → lexer → errors → tree → parser → moo)
// ============================================================================

/// Foundation types: TextRange, LineIndex, Position
pub mod base;

/// Parse table artifact: symbols, actions, gotos, lexer DFA
pub mod language;

/// Grammar compiler: builder, regex, LALR(1)
pub mod generate;

/// Table-driven lexer
pub mod lexer;

/// Syntax diagnostics: codes, severities, related spans
pub mod errors;

/// Syntax trees, cursors and edit descriptors
pub mod tree;

/// Incremental LR parser with error recovery
pub mod parser;

/// Bundled MOO language
pub mod moo;

// Re-export the engine surface
pub use generate::{GrammarBuilder, GrammarError};
pub use language::{LANGUAGE_VERSION, Language, LanguageError, SymbolId};
pub use errors::{ErrorCode, Severity, SyntaxError};
pub use parser::{ParseError, ParseOptions, Parser, RecoveryConfig};
pub use tree::{InputEdit, SyntaxNode, SyntaxTree, TreeCursor};

// Re-export foundation types
pub use base::{LineIndex, Position, Span, TextRange, TextSize};
