//! Grammar compiler
//!
//! Turns a declarative grammar into a [`Language`] artifact:
//!
//! ```text
//! GrammarBuilder
//!     │ tokens (regex / literal / keyword, lexical states)
//!     ▼
//! regex ──▶ NFA ──▶ DFA per lexical state ──▶ LexTable
//!     │ productions (optional elements, %prec)
//!     ▼
//! LALR(1) item sets ──▶ action/goto tables (conflicts resolved by precedence)
//!     ▼
//! Language (validated, serializable)
//! ```
//!
//! ## Example
//!
//! ```
//! use treeloom::generate::GrammarBuilder;
//!
//! let mut g = GrammarBuilder::new("sum");
//! let number = g.token("number", r"\d+");
//! let plus = g.literal("+");
//! let ws = g.anonymous_token("whitespace", r"\s+");
//! g.extra(ws);
//! let expr = g.nonterminal("expr");
//! g.rule(expr, &[expr, plus, expr]);
//! g.rule(expr, &[number]);
//! g.left(1, &[plus]);
//! g.start(expr);
//! let language = g.build().unwrap();
//! assert_eq!(language.name(), "sum");
//! ```

mod automaton;
mod lalr;
mod regex;


use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use crate::language::{
    BlockComment, Delimiter, DelimiterKind, LANGUAGE_VERSION, Language, LanguageError, LexState,
    RuleInfo, StateId, SymbolId, SymbolInfo,
};
use automaton::LexPattern;
pub use lalr::ConflictKind;
use lalr::{Production, TableInput};

/// Errors reported while compiling a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("Grammar has no start symbol")]
    MissingStart,

    #[error("Start symbol `{0}` is a token")]
    TerminalStart(SmolStr),

    #[error("Nonterminal `{0}` has no rules")]
    EmptyNonterminal(SmolStr),

    #[error("Token `{0}` has no pattern")]
    TokenWithoutPattern(SmolStr),

    #[error("Extra token `{0}` cannot appear in a rule")]
    ExtraInRule(SmolStr),

    #[error("Invalid pattern for token `{token}`: {message}")]
    Regex { token: SmolStr, message: String },

    #[error("Token `{0}` matches the empty string")]
    EmptyToken(SmolStr),

    #[error("Grammar has {0} symbols, more than the tables can address")]
    TooManySymbols(usize),

    #[error("Grammar produces {0} states, more than the tables can address")]
    TooManyStates(usize),

    #[error(transparent)]
    Language(#[from] LanguageError),
}

/// Operator associativity for precedence declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// Builder-local symbol handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sym {
    Terminal(u16),
    Nonterminal(u16),
}

/// One element on the right-hand side of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Required(Sym),
    Optional(Sym),
}

impl From<Sym> for Element {
    fn from(sym: Sym) -> Self {
        Element::Required(sym)
    }
}

/// Mark an element optional; the rule is expanded with and without it.
pub fn opt(sym: Sym) -> Element {
    Element::Optional(sym)
}

/// A conflict resolved by default rather than by precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub kind: ConflictKind,
    pub lookahead: SmolStr,
    /// Rendered productions involved, e.g. `expr -> expr "+" expr`
    pub rules: Vec<String>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} conflict in state {} on `{}`: {}",
            self.kind,
            self.state,
            self.lookahead,
            self.rules.join(" | ")
        )
    }
}

struct TerminalDef {
    name: SmolStr,
    named: bool,
    extra: bool,
    patterns: Vec<PatternDef>,
    priority: i32,
    states: Vec<LexState>,
    next_state: Option<LexState>,
    prec: Option<(i32, Assoc)>,
    contextual: bool,
}

enum PatternDef {
    Regex(String),
    Literal { text: String, case_insensitive: bool },
}

struct NonterminalDef {
    name: SmolStr,
    hidden: bool,
}

struct RuleDef {
    lhs: Sym,
    rhs: Vec<Element>,
    prec: Option<i32>,
}

/// Declarative grammar description.
pub struct GrammarBuilder {
    name: SmolStr,
    terminals: Vec<TerminalDef>,
    nonterminals: Vec<NonterminalDef>,
    rules: Vec<RuleDef>,
    lex_states: Vec<SmolStr>,
    start: Option<Sym>,
    sync: Vec<Sym>,
    word: Option<Sym>,
    terminators: Vec<Sym>,
    delimiters: Vec<(DelimiterKind, Sym, Sym)>,
    block_comments: Vec<(Sym, SmolStr, SmolStr)>,
}

/// Handle to the productions added by one [`GrammarBuilder::rule`] call.
pub struct RuleRef<'a> {
    builder: &'a mut GrammarBuilder,
    index: usize,
}

impl RuleRef<'_> {
    /// Give the rule an explicit precedence level (yacc `%prec`).
    pub fn prec(self, level: i32) {
        self.builder.rules[self.index].prec = Some(level);
    }
}

/// Priority of literal tokens over regex tokens of the same length
const LITERAL_PRIORITY: i32 = 1;

impl GrammarBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            terminals: Vec::new(),
            nonterminals: Vec::new(),
            rules: Vec::new(),
            lex_states: vec!["default".into()],
            start: None,
            sync: Vec::new(),
            word: None,
            terminators: Vec::new(),
            delimiters: Vec::new(),
            block_comments: Vec::new(),
        }
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Named token matched by a regex in the default lexical state
    pub fn token(&mut self, name: &str, pattern: &str) -> Sym {
        self.add_terminal(name, true, PatternDef::Regex(pattern.to_string()), 0)
    }

    /// Anonymous token matched by a regex
    pub fn anonymous_token(&mut self, name: &str, pattern: &str) -> Sym {
        self.add_terminal(name, false, PatternDef::Regex(pattern.to_string()), 0)
    }

    /// Anonymous literal token; declaring the same literal twice returns
    /// the first handle.
    pub fn literal(&mut self, text: &str) -> Sym {
        if let Some(idx) = self.terminals.iter().position(|terminal| {
            !terminal.named
                && terminal.name == text
                && matches!(
                    terminal.patterns.as_slice(),
                    [PatternDef::Literal {
                        case_insensitive: false,
                        ..
                    }]
                )
        }) {
            return Sym::Terminal(idx as u16);
        }
        let pattern = PatternDef::Literal {
            text: text.to_string(),
            case_insensitive: false,
        };
        self.add_terminal(text, false, pattern, LITERAL_PRIORITY)
    }

    /// Case-insensitive keyword, preferred over identifiers of equal length
    pub fn keyword(&mut self, text: &str) -> Sym {
        let pattern = PatternDef::Literal {
            text: text.to_string(),
            case_insensitive: true,
        };
        self.add_terminal(&text.to_ascii_lowercase(), false, pattern, LITERAL_PRIORITY)
    }

    /// Keyword that may stand for the word token where only that fits,
    /// e.g. `verb` used as a variable name
    pub fn contextual_keyword(&mut self, text: &str) -> Sym {
        let keyword = self.keyword(text);
        if let Some(terminal) = self.terminal_mut(keyword) {
            terminal.contextual = true;
        }
        keyword
    }

    /// Token contextual keywords fall back to
    pub fn word(&mut self, token: Sym) -> &mut Self {
        self.word = Some(token);
        self
    }

    /// Add an alternative regex to an existing token
    pub fn pattern(&mut self, token: Sym, pattern: &str) -> &mut Self {
        if let Some(terminal) = self.terminal_mut(token) {
            terminal.patterns.push(PatternDef::Regex(pattern.to_string()));
        }
        self
    }

    /// Allow the token anywhere between other tokens
    pub fn extra(&mut self, token: Sym) -> &mut Self {
        if let Some(terminal) = self.terminal_mut(token) {
            terminal.extra = true;
        }
        self
    }

    /// Lexical tie-break priority (higher wins among equal-length matches)
    pub fn priority(&mut self, token: Sym, priority: i32) -> &mut Self {
        if let Some(terminal) = self.terminal_mut(token) {
            terminal.priority = priority;
        }
        self
    }

    /// Declare a lexical state other than the default one
    pub fn lexical_state(&mut self, name: &str) -> LexState {
        self.lex_states.push(name.into());
        LexState((self.lex_states.len() - 1) as u16)
    }

    /// Restrict a token to the given lexical states
    pub fn in_states(&mut self, token: Sym, states: &[LexState]) -> &mut Self {
        if let Some(terminal) = self.terminal_mut(token) {
            terminal.states = states.to_vec();
        }
        self
    }

    /// Switch the lexer to `state` after this token
    pub fn enters(&mut self, token: Sym, state: LexState) -> &mut Self {
        if let Some(terminal) = self.terminal_mut(token) {
            terminal.next_state = Some(state);
        }
        self
    }

    // =========================================================================
    // Precedence
    // =========================================================================

    pub fn left(&mut self, level: i32, tokens: &[Sym]) -> &mut Self {
        self.precedence(level, Assoc::Left, tokens)
    }

    pub fn right(&mut self, level: i32, tokens: &[Sym]) -> &mut Self {
        self.precedence(level, Assoc::Right, tokens)
    }

    pub fn nonassoc(&mut self, level: i32, tokens: &[Sym]) -> &mut Self {
        self.precedence(level, Assoc::NonAssoc, tokens)
    }

    fn precedence(&mut self, level: i32, assoc: Assoc, tokens: &[Sym]) -> &mut Self {
        for token in tokens {
            if let Some(terminal) = self.terminal_mut(*token) {
                terminal.prec = Some((level, assoc));
            }
        }
        self
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Nonterminal; names starting with `_` are hidden in the tree view
    pub fn nonterminal(&mut self, name: &str) -> Sym {
        self.nonterminals.push(NonterminalDef {
            name: name.into(),
            hidden: name.starts_with('_'),
        });
        Sym::Nonterminal((self.nonterminals.len() - 1) as u16)
    }

    pub fn rule(&mut self, lhs: Sym, rhs: &[Sym]) -> RuleRef<'_> {
        let rhs = rhs.iter().copied().map(Element::from).collect();
        self.push_rule(lhs, rhs)
    }

    /// Rule with optional elements
    pub fn rule_with(&mut self, lhs: Sym, rhs: &[Element]) -> RuleRef<'_> {
        self.push_rule(lhs, rhs.to_vec())
    }

    /// `name -> name item | item`
    pub fn repeat1(&mut self, name: &str, item: Sym) -> Sym {
        let list = self.nonterminal(name);
        self.rule(list, &[list, item]);
        self.rule(list, &[item]);
        list
    }

    /// `name -> name separator item | item`
    pub fn separated1(&mut self, name: &str, item: Sym, separator: Sym) -> Sym {
        let list = self.nonterminal(name);
        self.rule(list, &[list, separator, item]);
        self.rule(list, &[item]);
        list
    }

    pub fn start(&mut self, symbol: Sym) -> &mut Self {
        self.start = Some(symbol);
        self
    }

    /// Tokens that end an error region in panic-mode recovery
    pub fn sync(&mut self, tokens: &[Sym]) -> &mut Self {
        self.sync.extend_from_slice(tokens);
        self
    }

    // =========================================================================
    // Diagnostic metadata
    // =========================================================================

    /// Tokens that end a statement; a missing one is reported as such
    pub fn terminator(&mut self, tokens: &[Sym]) -> &mut Self {
        self.terminators.extend_from_slice(tokens);
        self
    }

    /// A balanced pair; a missing `close` points back at its `open`
    pub fn delimiter(&mut self, kind: DelimiterKind, open: Sym, close: Sym) -> &mut Self {
        self.delimiters.push((kind, open, close));
        self
    }

    /// Comment token whose text starting with `open` must end with `close`
    pub fn block_comment(&mut self, token: Sym, open: &str, close: &str) -> &mut Self {
        self.block_comments.push((token, open.into(), close.into()));
        self
    }

    /// Final id of a builder symbol once every terminal is declared
    pub fn symbol_id(&self, symbol: Sym) -> SymbolId {
        match symbol {
            Sym::Terminal(idx) => SymbolId(idx + 2),
            Sym::Nonterminal(idx) => SymbolId(idx + 2 + self.terminals.len() as u16),
        }
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    pub fn build(&self) -> Result<Language, GrammarError> {
        let (language, conflicts) = self.build_with_conflicts()?;
        for conflict in &conflicts {
            tracing::warn!(grammar = %self.name, "{conflict}");
        }
        Ok(language)
    }

    /// Compile and return conflicts that fell back to the default resolution
    pub fn build_with_conflicts(&self) -> Result<(Language, Vec<Conflict>), GrammarError> {
        let start = self.start.ok_or(GrammarError::MissingStart)?;
        let Sym::Nonterminal(_) = start else {
            return Err(GrammarError::TerminalStart(self.sym_name(start)));
        };

        // end, ERROR, terminals, nonterminals, augmented start
        let terminal_count = self.terminals.len() + 2;
        let symbol_count = terminal_count + self.nonterminals.len() + 1;
        if symbol_count > u16::MAX as usize {
            return Err(GrammarError::TooManySymbols(symbol_count));
        }
        let accept_symbol = symbol_count - 1;

        for (idx, nonterminal) in self.nonterminals.iter().enumerate() {
            let sym = Sym::Nonterminal(idx as u16);
            if !self.rules.iter().any(|rule| rule.lhs == sym) {
                return Err(GrammarError::EmptyNonterminal(nonterminal.name.clone()));
            }
        }
        for rule in &self.rules {
            for element in &rule.rhs {
                let (Element::Required(sym) | Element::Optional(sym)) = element;
                let is_extra = match sym {
                    Sym::Terminal(idx) => self.terminals[*idx as usize].extra,
                    Sym::Nonterminal(_) => false,
                };
                if is_extra {
                    return Err(GrammarError::ExtraInRule(self.sym_name(*sym)));
                }
            }
        }

        let symbols = self.symbol_table();
        let patterns = self.lex_patterns()?;
        let lex = automaton::build_lex_table(&self.lex_states, &patterns);

        let mut productions = vec![Production {
            lhs: accept_symbol,
            rhs: vec![self.index_of(start)],
            prec: None,
            explicit: false,
        }];
        for rule in &self.rules {
            for rhs in expand_optionals(&rule.rhs) {
                let rhs: Vec<usize> = rhs.into_iter().map(|sym| self.index_of(sym)).collect();
                let prec = rule.prec.or_else(|| {
                    rhs.iter()
                        .rev()
                        .filter(|symbol| **symbol < terminal_count)
                        .find_map(|symbol| self.token_prec_at(*symbol))
                        .map(|(level, _)| level)
                });
                productions.push(Production {
                    lhs: self.index_of(rule.lhs),
                    rhs,
                    prec,
                    explicit: rule.prec.is_some(),
                });
            }
        }

        let token_prec: Vec<Option<(i32, Assoc)>> = (0..terminal_count)
            .map(|symbol| self.token_prec_at(symbol))
            .collect();
        let tables = lalr::build_tables(&TableInput {
            terminal_count,
            symbol_count,
            productions: &productions,
            token_prec: &token_prec,
            end: SymbolId::END.index(),
        });
        if tables.state_count > StateId::MAX as usize {
            return Err(GrammarError::TooManyStates(tables.state_count));
        }

        let conflicts = tables
            .conflicts
            .iter()
            .map(|raw| Conflict {
                state: raw.state as StateId,
                kind: raw.kind,
                lookahead: symbols[raw.lookahead].name.clone(),
                rules: raw
                    .productions
                    .iter()
                    .map(|production| render_production(&symbols, &productions[*production]))
                    .collect(),
            })
            .collect();

        let language = Language {
            version: LANGUAGE_VERSION,
            name: self.name.clone(),
            symbols,
            terminal_count: terminal_count as u16,
            state_count: tables.state_count as u16,
            actions: tables.actions,
            gotos: tables.gotos,
            rules: productions
                .iter()
                .map(|production| RuleInfo {
                    lhs: SymbolId(production.lhs as u16),
                    len: production.rhs.len() as u16,
                })
                .collect(),
            lex,
            start_state: 0,
            sync_tokens: self.ids(&self.sync),
            word: self.word.map(|sym| self.symbol_id(sym)),
            terminators: self.ids(&self.terminators),
            delimiters: self
                .delimiters
                .iter()
                .map(|(kind, open, close)| Delimiter {
                    kind: *kind,
                    open: self.symbol_id(*open),
                    close: self.symbol_id(*close),
                })
                .collect(),
            block_comments: self
                .block_comments
                .iter()
                .map(|(token, open, close)| BlockComment {
                    token: self.symbol_id(*token),
                    open: open.clone(),
                    close: close.clone(),
                })
                .collect(),
        };
        language.validate()?;
        tracing::debug!(
            grammar = %self.name,
            states = language.state_count,
            rules = language.rules.len(),
            "compiled grammar"
        );
        Ok((language, conflicts))
    }

    fn add_terminal(&mut self, name: &str, named: bool, pattern: PatternDef, priority: i32) -> Sym {
        self.terminals.push(TerminalDef {
            name: name.into(),
            named,
            extra: false,
            patterns: vec![pattern],
            priority,
            states: vec![LexState::DEFAULT],
            next_state: None,
            prec: None,
            contextual: false,
        });
        Sym::Terminal((self.terminals.len() - 1) as u16)
    }

    fn terminal_mut(&mut self, token: Sym) -> Option<&mut TerminalDef> {
        match token {
            Sym::Terminal(idx) => self.terminals.get_mut(idx as usize),
            Sym::Nonterminal(_) => None,
        }
    }

    fn sym_name(&self, sym: Sym) -> SmolStr {
        match sym {
            Sym::Terminal(idx) => self.terminals[idx as usize].name.clone(),
            Sym::Nonterminal(idx) => self.nonterminals[idx as usize].name.clone(),
        }
    }

    fn index_of(&self, sym: Sym) -> usize {
        self.symbol_id(sym).index()
    }

    fn ids(&self, syms: &[Sym]) -> Vec<SymbolId> {
        syms.iter().map(|sym| self.symbol_id(*sym)).collect()
    }

    fn token_prec_at(&self, symbol: usize) -> Option<(i32, Assoc)> {
        symbol
            .checked_sub(2)
            .and_then(|idx| self.terminals.get(idx))
            .and_then(|terminal| terminal.prec)
    }

    fn push_rule(&mut self, lhs: Sym, rhs: Vec<Element>) -> RuleRef<'_> {
        self.rules.push(RuleDef {
            lhs,
            rhs,
            prec: None,
        });
        let index = self.rules.len() - 1;
        RuleRef {
            builder: self,
            index,
        }
    }

    fn symbol_table(&self) -> Vec<SymbolInfo> {
        let mut symbols = vec![
            SymbolInfo {
                name: "<end>".into(),
                terminal: true,
                named: false,
                hidden: false,
                extra: false,
                contextual: false,
            },
            SymbolInfo {
                name: "ERROR".into(),
                terminal: true,
                named: true,
                hidden: false,
                extra: false,
                contextual: false,
            },
        ];
        symbols.extend(self.terminals.iter().map(|terminal| SymbolInfo {
            name: terminal.name.clone(),
            terminal: true,
            named: terminal.named,
            hidden: false,
            extra: terminal.extra,
            contextual: terminal.contextual,
        }));
        symbols.extend(self.nonterminals.iter().map(|nonterminal| SymbolInfo {
            name: nonterminal.name.clone(),
            terminal: false,
            named: !nonterminal.hidden,
            hidden: nonterminal.hidden,
            extra: false,
            contextual: false,
        }));
        symbols.push(SymbolInfo {
            name: "_accept".into(),
            terminal: false,
            named: false,
            hidden: true,
            extra: false,
            contextual: false,
        });
        symbols
    }

    fn lex_patterns(&self) -> Result<Vec<LexPattern>, GrammarError> {
        let mut patterns = Vec::new();
        for (idx, terminal) in self.terminals.iter().enumerate() {
            if terminal.patterns.is_empty() {
                return Err(GrammarError::TokenWithoutPattern(terminal.name.clone()));
            }
            for pattern in &terminal.patterns {
                let regex = match pattern {
                    PatternDef::Regex(source) => {
                        regex::parse(source).map_err(|message| GrammarError::Regex {
                            token: terminal.name.clone(),
                            message,
                        })?
                    }
                    PatternDef::Literal {
                        text,
                        case_insensitive,
                    } => regex::literal(text, *case_insensitive),
                };
                if regex.matches_empty() {
                    return Err(GrammarError::EmptyToken(terminal.name.clone()));
                }
                patterns.push(LexPattern {
                    regex,
                    symbol: SymbolId(idx as u16 + 2),
                    priority: terminal.priority,
                    states: terminal.states.clone(),
                    next_state: terminal.next_state,
                });
            }
        }
        Ok(patterns)
    }
}

/// Every combination of present/absent optional elements, in a stable order
fn expand_optionals(rhs: &[Element]) -> Vec<Vec<Sym>> {
    let mut variants: Vec<Vec<Sym>> = vec![Vec::new()];
    for element in rhs {
        match element {
            Element::Required(sym) => {
                for variant in &mut variants {
                    variant.push(*sym);
                }
            }
            Element::Optional(sym) => {
                let mut with: Vec<Vec<Sym>> = variants.clone();
                for variant in &mut with {
                    variant.push(*sym);
                }
                variants.extend(with);
            }
        }
    }
    variants
}

fn render_production(symbols: &[SymbolInfo], production: &Production) -> String {
    let mut text = format!("{} ->", symbols[production.lhs].name);
    for symbol in &production.rhs {
        let info = &symbols[*symbol];
        if info.named || !info.terminal {
            text.push_str(&format!(" {}", info.name));
        } else {
            text.push_str(&format!(" \"{}\"", info.name));
        }
    }
    text
}
