//! Incremental LR parser
//!
//! ```text
//! source ──Lexer──────────┐
//! old tree ──ReuseCursor──┤ lookahead: fresh token or reused subtree
//!                         ▼
//!               action(state, symbol)
//!     Shift  ──▶ push leaf / reused subtree
//!     Reduce ──▶ pop children, push node at the goto state
//!     Accept ──▶ root (leading and trailing extras folded in)
//!     none   ──▶ recovery::plan ──▶ delete / pop + missing / panic
//! ```
//!
//! A parse is single-threaded and synchronous. Cancellation and the
//! operation budget are polled every [`ParseOptions::check_interval`]
//! operations; stopping early yields a partial tree rather than an error.

mod recovery;
mod reuse;
mod stack;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::language::{
    Action, LANGUAGE_VERSION, Language, LanguageError, LexState, RuleId, StateId, SymbolId,
};
use crate::lexer::{Lexer, Token};
use crate::tree::{GreenNode, InputEdit, NodeInfo, SyntaxTree};
pub use recovery::{RecoveryConfig, RecoveryPlan};
use recovery::RecoveryInput;
use reuse::{Candidate, ReuseCursor};
use stack::{Entry, Stack};

/// Hard failures of a parse call. Malformed input is never one of these;
/// it is recovered and encoded in the tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    InvalidLanguage(#[from] LanguageError),

    #[error("Old tree was parsed with grammar `{found}`, parser uses `{expected}`")]
    LanguageMismatch { expected: SmolStr, found: SmolStr },

    #[error("Stack underflow reducing rule {rule}")]
    StackUnderflow { rule: RuleId },

    #[error("No goto for `{symbol}` from state {state}")]
    MissingGoto { state: StateId, symbol: SmolStr },

    #[error("State {0} is outside the parse table")]
    InvalidState(StateId),

    #[error("Source of {0} bytes exceeds the addressable size")]
    SourceTooLarge(usize),
}

/// Parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub recovery: RecoveryConfig,
    /// Stop with a partial tree after this many operations
    pub max_operations: Option<u64>,
    /// Operations between cancellation and budget checks
    pub check_interval: u64,
    #[serde(skip)]
    pub cancellation: Option<CancellationToken>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            recovery: RecoveryConfig::default(),
            max_operations: None,
            check_interval: 128,
            cancellation: None,
        }
    }
}

impl ParseOptions {
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_max_operations(mut self, max: u64) -> Self {
        self.max_operations = Some(max);
        self
    }
}

/// Parser bound to one language.
#[derive(Debug, Clone)]
pub struct Parser {
    language: Arc<Language>,
    options: ParseOptions,
}

impl Parser {
    pub fn new(language: Arc<Language>) -> Result<Self, ParseError> {
        if language.version() != LANGUAGE_VERSION {
            return Err(LanguageError::VersionMismatch {
                expected: LANGUAGE_VERSION,
                found: language.version(),
            }
            .into());
        }
        Ok(Self {
            language,
            options: ParseOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    /// Parse `source`, reusing unchanged parts of `old_tree` (which must
    /// already carry the edits that turned its text into `source`).
    pub fn parse(
        &self,
        source: &[u8],
        old_tree: Option<&SyntaxTree>,
    ) -> Result<SyntaxTree, ParseError> {
        self.parse_with_edits(source, old_tree, &[])
    }

    /// Like [`Parser::parse`], applying `edits` to `old_tree` first.
    pub fn parse_with_edits(
        &self,
        source: &[u8],
        old_tree: Option<&SyntaxTree>,
        edits: &[InputEdit],
    ) -> Result<SyntaxTree, ParseError> {
        if source.len() >= u32::MAX as usize {
            return Err(ParseError::SourceTooLarge(source.len()));
        }

        let reuse = match old_tree {
            Some(old) => {
                let same = Arc::ptr_eq(old.language(), &self.language)
                    || **old.language() == *self.language;
                if !same {
                    return Err(ParseError::LanguageMismatch {
                        expected: self.language.name().into(),
                        found: old.language().name().into(),
                    });
                }
                let mut all = old.edits().to_vec();
                all.extend_from_slice(edits);
                Some(ReuseCursor::new(old.green().clone(), all))
            }
            None => None,
        };

        let mut run = Run::new(&self.language, source, &self.options, reuse);
        let (root, partial) = run.parse()?;
        tracing::debug!(
            language = self.language.name(),
            bytes = source.len(),
            operations = run.operations,
            reused = run.reused,
            recoveries = run.recoveries,
            partial,
            "parsed"
        );
        Ok(SyntaxTree::new(root, self.language.clone(), partial))
    }
}

/// Next input for the automaton
enum Lookahead {
    Token(Token),
    /// An old subtree; decisions use its first token
    Reused {
        node: GreenNode,
        start: u32,
        symbol: SymbolId,
        lookahead_end: u32,
    },
}

impl Lookahead {
    fn reused(candidate: Candidate) -> Option<Self> {
        let first = candidate.node.first_token()?;
        let symbol = first.kind();
        let lookahead_end = candidate.start + first.text_len() + first.lookahead_bytes();
        Some(Lookahead::Reused {
            node: candidate.node,
            start: candidate.start,
            symbol,
            lookahead_end,
        })
    }

    fn symbol(&self) -> SymbolId {
        match self {
            Lookahead::Token(token) => token.kind,
            Lookahead::Reused { symbol, .. } => *symbol,
        }
    }

    fn start(&self) -> u32 {
        match self {
            Lookahead::Token(token) => token.start,
            Lookahead::Reused { start, .. } => *start,
        }
    }

    /// One past the furthest byte examined to know [`Lookahead::symbol`]
    fn lookahead_end(&self) -> u32 {
        match self {
            Lookahead::Token(token) => token.lookahead_end,
            Lookahead::Reused { lookahead_end, .. } => *lookahead_end,
        }
    }
}

/// State of one parse call
struct Run<'a> {
    language: &'a Language,
    lexer: Lexer<'a>,
    source: &'a [u8],
    options: &'a ParseOptions,
    stack: Stack,
    reuse: Option<ReuseCursor>,
    lookahead: Option<Lookahead>,
    position: u32,
    lex_state: LexState,
    /// End of the furthest input examined by recovery; no reuse before it
    horizon: u32,
    operations: u64,
    until_check: u64,
    reused: usize,
    recoveries: usize,
}

impl<'a> Run<'a> {
    fn new(
        language: &'a Language,
        source: &'a [u8],
        options: &'a ParseOptions,
        reuse: Option<ReuseCursor>,
    ) -> Self {
        Self {
            language,
            lexer: Lexer::new(language),
            source,
            options,
            stack: Stack::new(language.start_state()),
            reuse,
            lookahead: None,
            position: 0,
            lex_state: LexState::DEFAULT,
            horizon: 0,
            operations: 0,
            until_check: 0,
            reused: 0,
            recoveries: 0,
        }
    }

    /// Drive the automaton to the root; the flag marks an early stop
    fn parse(&mut self) -> Result<(GreenNode, bool), ParseError> {
        loop {
            self.operations += 1;
            if self.should_stop() {
                return Ok((self.abort(), true));
            }

            let lookahead = match self.lookahead.take() {
                Some(lookahead) => lookahead,
                None => self.next_lookahead(),
            };
            if self.is_extra(&lookahead) {
                self.push_extra(lookahead);
                continue;
            }

            let state = self.stack.state();
            let lookahead = self.as_word(state, lookahead);
            match self.language.action(state, lookahead.symbol()) {
                Some(Action::Shift(next)) => self.shift(state, next, lookahead)?,
                Some(Action::Reduce(rule)) => {
                    self.reduce(rule, lookahead.start(), lookahead.lookahead_end())?;
                    self.lookahead = Some(lookahead);
                }
                Some(Action::Accept) => return Ok((self.accept(&lookahead), false)),
                None => match lookahead {
                    Lookahead::Reused { .. } => {
                        // Recovery works on single tokens.
                        let token = self.lex();
                        self.lookahead = Some(Lookahead::Token(token));
                    }
                    Lookahead::Token(token) => {
                        if let Some(root) = self.recover(token)? {
                            return Ok((root, false));
                        }
                    }
                },
            }
        }
    }

    fn should_stop(&mut self) -> bool {
        if self.until_check > 0 {
            self.until_check -= 1;
            return false;
        }
        self.until_check = self.options.check_interval.saturating_sub(1);

        if let Some(max) = self.options.max_operations {
            if self.operations > max {
                tracing::debug!(operations = self.operations, max, "operation budget exhausted");
                return true;
            }
        }
        if let Some(token) = &self.options.cancellation {
            if token.is_cancelled() {
                tracing::debug!(position = self.position, "parse cancelled");
                return true;
            }
        }
        false
    }

    // =========================================================================
    // Input
    // =========================================================================

    fn lex(&self) -> Token {
        self.lexer.lex(self.source, self.position, self.lex_state)
    }

    fn next_lookahead(&mut self) -> Lookahead {
        if self.position >= self.horizon {
            if let Some(reuse) = self.reuse.as_mut() {
                while let Some(candidate) = reuse.candidate(self.position) {
                    match candidate.rejection(self.lex_state) {
                        None => {
                            if let Some(lookahead) = Lookahead::reused(candidate) {
                                return lookahead;
                            }
                            reuse.descend();
                        }
                        Some(reason) => {
                            tracing::trace!(
                                kind = self.language.symbol_name(candidate.node.kind()),
                                at = candidate.start,
                                reason,
                                "not reusing"
                            );
                            reuse.descend();
                        }
                    }
                }
            }
        }
        Lookahead::Token(self.lex())
    }

    /// First token at or after `offset` that is not an extra or invalid
    fn next_significant(&self, mut offset: u32, mut state: LexState) -> Token {
        loop {
            let token = self.lexer.lex(self.source, offset, state);
            if token.is_end() || !(token.is_error() || self.language.is_extra(token.kind)) {
                return token;
            }
            offset = token.end;
            state = token.lex_state_after;
        }
    }

    /// A contextual keyword the state cannot take is read as the word
    /// token when that fits.
    fn as_word(&self, state: StateId, lookahead: Lookahead) -> Lookahead {
        let mut token = match lookahead {
            Lookahead::Token(token) => token,
            reused => return reused,
        };
        let Some(word) = self.language.word_token() else {
            return Lookahead::Token(token);
        };
        if self.language.is_contextual_keyword(token.kind)
            && self.language.action(state, token.kind).is_none()
            && self.language.action(state, word).is_some()
        {
            tracing::trace!(
                keyword = self.language.symbol_name(token.kind),
                at = token.start,
                "keyword read as word"
            );
            token.kind = word;
            token.contextual = true;
        }
        Lookahead::Token(token)
    }

    fn is_extra(&self, lookahead: &Lookahead) -> bool {
        match lookahead {
            Lookahead::Token(token) => token.is_error() || self.language.is_extra(token.kind),
            Lookahead::Reused { node, .. } => node.is_extra(),
        }
    }

    fn consume_reused(&mut self, node: &GreenNode, start: u32) {
        self.position = start + node.text_len();
        self.lex_state = node.lex_end();
        self.reused += 1;
        if let Some(reuse) = self.reuse.as_mut() {
            reuse.advance();
        }
    }

    fn breakdown(&mut self, node: &GreenNode) {
        tracing::trace!(
            kind = self.language.symbol_name(node.kind()),
            at = self.position,
            "breaking down reused node"
        );
        if let Some(reuse) = self.reuse.as_mut() {
            reuse.descend();
        }
        self.lookahead = None;
    }

    // =========================================================================
    // Automaton steps
    // =========================================================================

    fn push_extra(&mut self, lookahead: Lookahead) {
        match lookahead {
            Lookahead::Token(token) => {
                if token.is_error() {
                    tracing::trace!(at = token.start, "skipping invalid byte");
                }
                let leaf = GreenNode::token(&token, self.stack.state(), true);
                self.stack.push_extra(leaf, token.start);
                self.position = token.end;
                self.lex_state = token.lex_state_after;
            }
            Lookahead::Reused { node, start, .. } => {
                self.stack.push_extra(node.clone(), start);
                self.consume_reused(&node, start);
            }
        }
    }

    fn shift(&mut self, state: StateId, next: StateId, lookahead: Lookahead) -> Result<(), ParseError> {
        self.check_state(next)?;
        match lookahead {
            Lookahead::Token(token) => {
                let leaf = GreenNode::token(&token, state, false);
                self.stack.push(leaf, next, token.start);
                self.position = token.end;
                self.lex_state = token.lex_state_after;
            }
            Lookahead::Reused { node, start, .. } => {
                if node.is_token() {
                    self.stack.push(node.clone(), next, start);
                    self.consume_reused(&node, start);
                    return Ok(());
                }
                let goto = if node.parse_state() == state {
                    self.language.goto(state, node.kind())
                } else {
                    None
                };
                match goto {
                    Some(goto) => {
                        self.check_state(goto)?;
                        tracing::trace!(
                            kind = self.language.symbol_name(node.kind()),
                            at = start,
                            len = node.text_len(),
                            "reusing node"
                        );
                        self.stack.push(node.clone(), goto, start);
                        self.consume_reused(&node, start);
                    }
                    None => self.breakdown(&node),
                }
            }
        }
        Ok(())
    }

    fn reduce(
        &mut self,
        rule: RuleId,
        lookahead_start: u32,
        lookahead_end: u32,
    ) -> Result<(), ParseError> {
        let info = *self
            .language
            .rule(rule)
            .ok_or_else(|| LanguageError::malformed(format!("rule {rule} is out of range")))?;
        let stack_end = self.stack.end();
        let popped = self
            .stack
            .pop_children(info.len as usize)
            .ok_or(ParseError::StackUnderflow { rule })?;

        let parse_state = self.stack.state();
        let goto =
            self.language
                .goto(parse_state, info.lhs)
                .ok_or_else(|| ParseError::MissingGoto {
                    state: parse_state,
                    symbol: self.language.symbol_name(info.lhs).into(),
                })?;
        self.check_state(goto)?;

        let start = popped
            .children
            .first()
            .or(popped.trailing.first())
            .map_or(stack_end, |entry| entry.start);
        let fragile = lookahead_start < self.horizon;
        let node = GreenNode::node(
            info.lhs,
            popped.children.into_iter().map(|entry| entry.node).collect(),
            NodeInfo {
                parse_state,
                lex_state: self.lex_state,
                lookahead_end: if fragile {
                    lookahead_end.max(self.horizon)
                } else {
                    lookahead_end
                },
                start,
                extra: false,
                fragile,
            },
        );
        self.stack.push(node, goto, start);
        self.stack.push_extras(popped.trailing);
        Ok(())
    }

    /// Build the root from the start symbol's node and the extras around it
    fn accept(&mut self, lookahead: &Lookahead) -> GreenNode {
        let entries = self.stack.take_all();
        let Some(main) = entries.iter().position(|entry| !entry.is_extra()) else {
            return self.error_root(entries, lookahead.lookahead_end());
        };
        let kind = entries[main].node.kind();
        let parse_state = entries[main].node.parse_state();

        let mut children = Vec::new();
        for (idx, entry) in entries.into_iter().enumerate() {
            if idx == main {
                children.extend(entry.node.children().iter().cloned());
            } else {
                children.push(entry.node);
            }
        }
        GreenNode::node(
            kind,
            children,
            NodeInfo {
                parse_state,
                lex_state: self.lex_state,
                lookahead_end: lookahead.lookahead_end(),
                start: 0,
                extra: false,
                fragile: lookahead.start() < self.horizon,
            },
        )
    }

    fn abort(&mut self) -> GreenNode {
        let entries = self.stack.take_all();
        self.error_root(entries, self.position)
    }

    fn error_root(&self, entries: Vec<Entry>, lookahead_end: u32) -> GreenNode {
        GreenNode::node(
            SymbolId::ERROR,
            entries.into_iter().map(|entry| entry.node).collect(),
            NodeInfo {
                parse_state: self.language.start_state(),
                lex_state: self.lex_state,
                lookahead_end,
                start: 0,
                extra: false,
                fragile: true,
            },
        )
    }

    fn check_state(&self, state: StateId) -> Result<(), ParseError> {
        if state as usize >= self.language.state_count() {
            return Err(ParseError::InvalidState(state));
        }
        Ok(())
    }

    // =========================================================================
    // Error recovery
    // =========================================================================

    /// Resume after `token` had no action. Returns the root when the input
    /// ended and nothing could be salvaged.
    fn recover(&mut self, token: Token) -> Result<Option<GreenNode>, ParseError> {
        self.recoveries += 1;
        let next = self.next_significant(token.end, token.lex_state_after);
        self.extend_horizon(token.lookahead_end.max(next.lookahead_end));

        let config = &self.options.recovery;
        let states = self.stack.states();
        let popped_bytes = self.stack.popped_bytes(config.max_pop_depth);
        let plan = recovery::plan(
            self.language,
            config,
            &RecoveryInput {
                states: &states,
                popped_bytes: &popped_bytes,
                token: token.kind,
                token_len: token.len(),
                next: next.kind,
            },
        );
        tracing::debug!(
            at = token.start,
            token = self.language.symbol_name(token.kind),
            ?plan,
            "recovering from syntax error"
        );

        match plan {
            RecoveryPlan::Delete => {
                let leaf = GreenNode::token(&token, self.stack.state(), false);
                let error = self.error_extra(vec![leaf], token.start);
                self.stack.push_extra(error, token.start);
                self.position = token.end;
                self.lex_state = token.lex_state_after;
            }
            RecoveryPlan::Pop { depth, missing } => {
                if depth > 0 {
                    let frames = self.stack.pop_frames(depth);
                    self.push_error(frames, Vec::new(), token.start);
                }
                if let Some(missing) = missing {
                    self.shift_missing(missing, &token)?;
                }
                self.lookahead = Some(Lookahead::Token(token));
            }
            RecoveryPlan::Panic if token.is_end() => {
                let entries = self.stack.take_all();
                return Ok(Some(self.error_root(entries, token.lookahead_end)));
            }
            RecoveryPlan::Panic => self.panic(token),
        }
        Ok(None)
    }

    /// Perform the reductions `symbol` triggers, then shift it as a
    /// zero-width missing token in front of `before`.
    fn shift_missing(&mut self, symbol: SymbolId, before: &Token) -> Result<(), ParseError> {
        for _ in 0..self.options.recovery.max_simulation_steps {
            let state = self.stack.state();
            match self.language.action(state, symbol) {
                Some(Action::Reduce(rule)) => {
                    self.reduce(rule, before.start, before.lookahead_end)?;
                }
                Some(Action::Shift(next)) => {
                    self.check_state(next)?;
                    let leaf = GreenNode::missing(symbol, state, self.lex_state);
                    self.stack.push(leaf, next, before.start);
                    return Ok(());
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Swallow tokens through the next sync token, then pop frames until
    /// the token after the region can be shifted.
    fn panic(&mut self, token: Token) {
        let start = token.start;
        let mut region = Vec::new();
        let mut current = token;
        loop {
            let extra = current.is_error() || self.language.is_extra(current.kind);
            region.push(GreenNode::token(&current, self.stack.state(), extra));
            self.position = current.end;
            self.lex_state = current.lex_state_after;
            self.extend_horizon(current.lookahead_end);
            if !extra && self.language.is_sync_token(current.kind) {
                break;
            }
            let following = self.lex();
            if following.is_end() {
                break;
            }
            current = following;
        }

        let next = self.next_significant(self.position, self.lex_state);
        self.extend_horizon(next.lookahead_end);
        let states = self.stack.states();
        let depth = recovery::first_viable_depth(
            self.language,
            &self.options.recovery,
            &states,
            next.kind,
        )
        .unwrap_or(states.len().saturating_sub(1));
        let frames = if depth > 0 {
            self.stack.pop_frames(depth)
        } else {
            Vec::new()
        };
        tracing::debug!(
            from = start,
            to = self.position,
            popped = depth,
            "skipped error region"
        );
        self.push_error(frames, region, start);
    }

    /// Push popped frames followed by skipped tokens as one ERROR extra
    fn push_error(&mut self, frames: Vec<Entry>, region: Vec<GreenNode>, region_start: u32) {
        let start = frames.first().map_or(region_start, |entry| entry.start);
        let mut children: Vec<GreenNode> = frames.into_iter().map(|entry| entry.node).collect();
        children.extend(region);
        if children.is_empty() {
            return;
        }
        let error = self.error_extra(children, start);
        self.stack.push_extra(error, start);
    }

    fn error_extra(&self, children: Vec<GreenNode>, start: u32) -> GreenNode {
        GreenNode::node(
            SymbolId::ERROR,
            children,
            NodeInfo {
                parse_state: self.stack.state(),
                lex_state: self.lex_state,
                lookahead_end: self.horizon,
                start,
                extra: true,
                fragile: true,
            },
        )
    }

    fn extend_horizon(&mut self, end: u32) {
        self.horizon = self.horizon.max(end);
    }
}
