//! Table-driven lexer
//!
//! Interprets the DFA of a [`Language`]'s lexer table. Lexing is a pure
//! function of `(source, offset, lexical state)`, so it can restart at any
//! token boundary with the state recorded there:
//!
//! ```text
//! (offset, state) ──DFA, longest match──▶ Token { kind, start..end,
//!                                                 state_before, state_after,
//!                                                 lookahead_end }
//! ```
//!
//! No match yields a single-byte `ERROR` token; the end of input yields the
//! zero-width `<end>` token.


use text_size::{TextRange, TextSize};

pub use crate::language::LexState;
use crate::language::{Language, LexTable, SymbolId};

/// A token with its kind, byte range and lexical states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SymbolId,
    pub start: u32,
    pub end: u32,
    pub lex_state_before: LexState,
    pub lex_state_after: LexState,
    /// One past the furthest byte examined to produce this token
    pub lookahead_end: u32,
    /// A keyword the parser re-read as the grammar's word token
    pub contextual: bool,
}

impl Token {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_end(&self) -> bool {
        self.kind == SymbolId::END
    }

    pub fn is_error(&self) -> bool {
        self.kind == SymbolId::ERROR
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(TextSize::new(self.start), TextSize::new(self.end))
    }

    pub fn text<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        &source[self.start as usize..self.end as usize]
    }
}

/// Lexer over one language's tables
#[derive(Clone, Copy)]
pub struct Lexer<'a> {
    table: &'a LexTable,
}

impl<'a> Lexer<'a> {
    pub fn new(language: &'a Language) -> Self {
        Self {
            table: language.lex_table(),
        }
    }

    /// Produce the token starting at `offset` in lexical `state`.
    pub fn lex(&self, source: &[u8], offset: u32, state: LexState) -> Token {
        let len = source.len() as u32;
        if offset >= len {
            return Token {
                kind: SymbolId::END,
                start: len,
                end: len,
                lex_state_before: state,
                lex_state_after: state,
                lookahead_end: len + 1,
                contextual: false,
            };
        }

        let start_state = self
            .table
            .states
            .get(state.index())
            .or_else(|| self.table.states.first())
            .map_or(0, |info| info.start);

        let mut current = start_state;
        let mut pos = offset;
        let mut examined_end = offset;
        let mut best = None;
        while let Some(dfa_state) = self.table.dfa.get(current as usize) {
            if pos > offset {
                if let Some(accept) = dfa_state.accept {
                    best = Some((pos, accept));
                }
            }
            if dfa_state.transitions.is_empty() {
                break;
            }
            if pos >= len {
                examined_end = len + 1;
                break;
            }
            examined_end = pos + 1;
            match dfa_state.next(source[pos as usize]) {
                Some(next) => {
                    current = next;
                    pos += 1;
                }
                None => break,
            }
        }

        match best {
            Some((end, accept)) => Token {
                kind: accept.symbol,
                start: offset,
                end,
                lex_state_before: state,
                lex_state_after: accept.next_state.unwrap_or(state),
                lookahead_end: examined_end.max(end),
                contextual: false,
            },
            None => Token {
                kind: SymbolId::ERROR,
                start: offset,
                end: offset + 1,
                lex_state_before: state,
                lex_state_after: state,
                lookahead_end: examined_end.max(offset + 1),
                contextual: false,
            },
        }
    }

    /// Tokens of a whole buffer from the default state, `<end>` excluded
    pub fn tokens<'s>(&self, source: &'s [u8]) -> Tokens<'a, 's> {
        Tokens {
            lexer: *self,
            source,
            offset: 0,
            state: LexState::DEFAULT,
        }
    }
}

/// Iterator over the tokens of a buffer
pub struct Tokens<'a, 's> {
    lexer: Lexer<'a>,
    source: &'s [u8],
    offset: u32,
    state: LexState,
}

impl Iterator for Tokens<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lexer.lex(self.source, self.offset, self.state);
        if token.is_end() {
            return None;
        }
        self.offset = token.end;
        self.state = token.lex_state_after;
        Some(token)
    }
}

/// Tokenize an entire buffer into a Vec
pub fn tokenize(language: &Language, source: &[u8]) -> Vec<Token> {
    Lexer::new(language).tokens(source).collect()
}
