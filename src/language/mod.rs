//! Grammar artifacts
//!
//! A [`Language`] is the static, versioned description of one grammar that the
//! engine interprets:
//!
//! ```text
//! symbols   : <end>, ERROR, terminals..., nonterminals...
//! actions   : [state x terminal]    -> Shift(state) | Reduce(rule) | Accept
//! gotos     : [state x nonterminal] -> state
//! rules     : rule -> (lhs, rhs length)
//! lex table : lexical state -> DFA start, DFA states with byte transitions
//! ```
//!
//! Artifacts are produced by [`crate::generate`] (or loaded from JSON) and
//! are never mutated afterwards. Share them as `Arc<Language>`.

mod artifact;
mod error;


use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

pub use error::LanguageError;

/// ABI version of the artifact format understood by this engine.
pub const LANGUAGE_VERSION: u32 = 2;

/// Automaton state index.
pub type StateId = u16;

/// Index into the rule table.
pub type RuleId = u16;

/// A grammar symbol (terminal or nonterminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u16);

impl SymbolId {
    /// End-of-input sentinel
    pub const END: SymbolId = SymbolId(0);
    /// Error nodes and unmatched input
    pub const ERROR: SymbolId = SymbolId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A lexical state of the tokenizer (e.g. "inside string").
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LexState(pub u16);

impl LexState {
    pub const DEFAULT: LexState = LexState(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Parse table action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Shift(StateId),
    Reduce(RuleId),
    Accept,
}

/// Metadata for one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: SmolStr,
    pub terminal: bool,
    /// Named nodes (`identifier`) as opposed to anonymous literals (`"="`)
    pub named: bool,
    /// Hidden nonterminals are inlined into their parent when navigating
    pub hidden: bool,
    /// May appear between any two tokens (whitespace, comments)
    pub extra: bool,
    /// Keyword the parser may re-read as the grammar's word token
    #[serde(default)]
    pub contextual: bool,
}

/// Left-hand side and right-hand-side length of a grammar rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub lhs: SymbolId,
    pub len: u16,
}

/// Tokenizer tables
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LexTable {
    /// One entry per lexical state, indexed by [`LexState`]
    pub states: Vec<LexStateInfo>,
    pub dfa: Vec<DfaState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexStateInfo {
    pub name: SmolStr,
    /// Start state in [`LexTable::dfa`]
    pub start: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DfaState {
    pub accept: Option<DfaAccept>,
    /// Sorted, non-overlapping byte ranges
    pub transitions: Vec<ByteTransition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfaAccept {
    pub symbol: SymbolId,
    /// Lexical state entered after this token, if it switches
    pub next_state: Option<LexState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteTransition {
    pub min: u8,
    pub max: u8,
    pub target: u32,
}

impl DfaState {
    /// Follow the transition for `byte`, if any
    pub fn next(&self, byte: u8) -> Option<u32> {
        let idx = self
            .transitions
            .partition_point(|transition| transition.max < byte);
        self.transitions
            .get(idx)
            .filter(|transition| transition.min <= byte)
            .map(|transition| transition.target)
    }
}

/// Which bracket pair a [`Delimiter`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelimiterKind {
    Brace,
    Paren,
    Bracket,
    Quote,
}

/// Tokens that open and close a balanced region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiter {
    pub kind: DelimiterKind,
    pub open: SymbolId,
    pub close: SymbolId,
}

/// A comment token whose text ends with `close` once it starts with `open`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockComment {
    pub token: SymbolId,
    pub open: SmolStr,
    pub close: SmolStr,
}

/// A compiled grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub(crate) version: u32,
    pub(crate) name: SmolStr,
    pub(crate) symbols: Vec<SymbolInfo>,
    pub(crate) terminal_count: u16,
    pub(crate) state_count: u16,
    pub(crate) actions: Vec<Option<Action>>,
    pub(crate) gotos: Vec<Option<StateId>>,
    pub(crate) rules: Vec<RuleInfo>,
    pub(crate) lex: LexTable,
    pub(crate) start_state: StateId,
    pub(crate) sync_tokens: Vec<SymbolId>,
    /// Token standing for identifiers, which keywords fall back to
    pub(crate) word: Option<SymbolId>,
    pub(crate) terminators: Vec<SymbolId>,
    pub(crate) delimiters: Vec<Delimiter>,
    pub(crate) block_comments: Vec<BlockComment>,
}

impl Language {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Terminals occupy ids `0..terminal_count`, nonterminals the rest.
    pub fn terminal_count(&self) -> usize {
        self.terminal_count as usize
    }

    pub fn state_count(&self) -> usize {
        self.state_count as usize
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn start_state(&self) -> StateId {
        self.start_state
    }

    pub fn symbol(&self, symbol: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(symbol.index())
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &SymbolInfo)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(idx, info)| (SymbolId(idx as u16), info))
    }

    /// Name of a symbol; empty for ids outside the table
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        self.symbol(symbol).map_or("", |info| info.name.as_str())
    }

    /// Look up a grammar symbol by name and namedness, the first declared
    /// wins. The end-of-input sentinel is never returned.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        self.symbols()
            .skip(1)
            .find(|(_, info)| info.name == name && info.named == named)
            .map(|(id, _)| id)
    }

    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        symbol.index() < self.terminal_count()
    }

    pub fn is_named(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).is_some_and(|info| info.named)
    }

    pub fn is_hidden(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).is_some_and(|info| info.hidden)
    }

    pub fn is_extra(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).is_some_and(|info| info.extra)
    }

    /// Action for a terminal lookahead in `state`
    pub fn action(&self, state: StateId, terminal: SymbolId) -> Option<Action> {
        if !self.is_terminal(terminal) {
            return None;
        }
        let idx = state as usize * self.terminal_count() + terminal.index();
        self.actions.get(idx).copied().flatten()
    }

    /// Successor state after reducing to `nonterminal` on top of `state`
    pub fn goto(&self, state: StateId, nonterminal: SymbolId) -> Option<StateId> {
        let column = nonterminal.index().checked_sub(self.terminal_count())?;
        let idx = state as usize * self.nonterminal_count() + column;
        self.gotos.get(idx).copied().flatten()
    }

    /// Terminals with any action in `state`, in id order
    pub fn expected_terminals(&self, state: StateId) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.terminal_count as u16)
            .map(SymbolId)
            .filter(move |terminal| self.action(state, *terminal).is_some())
    }

    pub fn rule(&self, rule: RuleId) -> Option<&RuleInfo> {
        self.rules.get(rule as usize)
    }

    pub fn lex_table(&self) -> &LexTable {
        &self.lex
    }

    pub fn lex_state_count(&self) -> usize {
        self.lex.states.len()
    }

    /// Tokens that end an error region during panic-mode recovery
    pub fn sync_tokens(&self) -> &[SymbolId] {
        &self.sync_tokens
    }

    pub fn is_sync_token(&self, symbol: SymbolId) -> bool {
        self.sync_tokens.contains(&symbol)
    }

    /// Token a contextual keyword is re-read as when only it fits
    pub fn word_token(&self) -> Option<SymbolId> {
        self.word
    }

    pub fn is_contextual_keyword(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).is_some_and(|info| info.contextual)
    }

    // =========================================================================
    // Diagnostic metadata
    // =========================================================================

    /// Tokens that end a statement, e.g. `;`
    pub fn terminators(&self) -> &[SymbolId] {
        &self.terminators
    }

    pub fn is_terminator(&self, symbol: SymbolId) -> bool {
        self.terminators.contains(&symbol)
    }

    pub fn delimiters(&self) -> &[Delimiter] {
        &self.delimiters
    }

    /// The delimiter pair `symbol` closes
    pub fn delimiter_closed_by(&self, symbol: SymbolId) -> Option<&Delimiter> {
        self.delimiters.iter().find(|pair| pair.close == symbol)
    }

    pub fn block_comments(&self) -> &[BlockComment] {
        &self.block_comments
    }

    pub fn block_comment(&self, symbol: SymbolId) -> Option<&BlockComment> {
        self.block_comments.iter().find(|comment| comment.token == symbol)
    }

    fn nonterminal_count(&self) -> usize {
        self.symbols.len() - self.terminal_count()
    }
}
