//! JSON encoding and validation of grammar artifacts.

use std::path::Path;

use serde::Deserialize;

use super::{Action, LANGUAGE_VERSION, Language, LanguageError, SymbolId};

/// The part of an artifact read before anything else.
#[derive(Deserialize)]
struct ArtifactHeader {
    version: u32,
}

impl Language {
    /// Decode an artifact, refusing incompatible versions before decoding
    /// the tables.
    pub fn from_json(text: &str) -> Result<Self, LanguageError> {
        let header: ArtifactHeader = serde_json::from_str(text)?;
        if header.version != LANGUAGE_VERSION {
            return Err(LanguageError::VersionMismatch {
                expected: LANGUAGE_VERSION,
                found: header.version,
            });
        }
        let language: Language = serde_json::from_str(text)?;
        language.validate()?;
        tracing::debug!(
            name = %language.name,
            states = language.state_count,
            symbols = language.symbols.len(),
            "loaded language artifact"
        );
        Ok(language)
    }

    pub fn to_json(&self) -> Result<String, LanguageError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LanguageError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LanguageError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check that every table index is in range.
    pub fn validate(&self) -> Result<(), LanguageError> {
        if self.version != LANGUAGE_VERSION {
            return Err(LanguageError::VersionMismatch {
                expected: LANGUAGE_VERSION,
                found: self.version,
            });
        }

        let symbol_count = self.symbols.len();
        let terminals = self.terminal_count();
        let states = self.state_count();
        if symbol_count > u16::MAX as usize {
            return Err(LanguageError::malformed("too many symbols"));
        }
        if terminals < 2 || terminals > symbol_count {
            return Err(LanguageError::malformed(format!(
                "terminal count {terminals} out of range for {symbol_count} symbols"
            )));
        }
        if !self.symbols[SymbolId::END.index()].terminal
            || !self.symbols[SymbolId::ERROR.index()].terminal
        {
            return Err(LanguageError::malformed(
                "builtin end and ERROR symbols must be terminals",
            ));
        }
        for (idx, info) in self.symbols.iter().enumerate() {
            if info.terminal != (idx < terminals) {
                return Err(LanguageError::malformed(format!(
                    "symbol {idx} ({}) is on the wrong side of the terminal boundary",
                    info.name
                )));
            }
        }

        if states == 0 || self.start_state as usize >= states {
            return Err(LanguageError::malformed(format!(
                "start state {} out of range for {states} states",
                self.start_state
            )));
        }
        if self.actions.len() != states * terminals {
            return Err(LanguageError::malformed(format!(
                "action table has {} entries, expected {}",
                self.actions.len(),
                states * terminals
            )));
        }
        if self.gotos.len() != states * (symbol_count - terminals) {
            return Err(LanguageError::malformed(format!(
                "goto table has {} entries, expected {}",
                self.gotos.len(),
                states * (symbol_count - terminals)
            )));
        }

        for (idx, action) in self.actions.iter().enumerate() {
            match action {
                Some(Action::Shift(target)) if *target as usize >= states => {
                    return Err(LanguageError::malformed(format!(
                        "action {idx} shifts to missing state {target}"
                    )));
                }
                Some(Action::Reduce(rule)) if *rule as usize >= self.rules.len() => {
                    return Err(LanguageError::malformed(format!(
                        "action {idx} reduces missing rule {rule}"
                    )));
                }
                _ => {}
            }
        }
        if let Some(target) = self
            .gotos
            .iter()
            .flatten()
            .find(|target| **target as usize >= states)
        {
            return Err(LanguageError::malformed(format!(
                "goto to missing state {target}"
            )));
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.lhs.index() < terminals || rule.lhs.index() >= symbol_count {
                return Err(LanguageError::malformed(format!(
                    "rule {idx} has non-nonterminal lhs {}",
                    rule.lhs.0
                )));
            }
        }

        if let Some(token) = self
            .sync_tokens
            .iter()
            .find(|token| token.index() >= terminals)
        {
            return Err(LanguageError::malformed(format!(
                "sync token {} is not a terminal",
                token.0
            )));
        }

        let metadata = self
            .terminators
            .iter()
            .chain(&self.word)
            .chain(self.delimiters.iter().flat_map(|pair| [&pair.open, &pair.close]))
            .chain(self.block_comments.iter().map(|comment| &comment.token));
        for token in metadata {
            if token.index() >= terminals {
                return Err(LanguageError::malformed(format!(
                    "diagnostic token {} is not a terminal",
                    token.0
                )));
            }
        }

        self.validate_lex_table()
    }

    fn validate_lex_table(&self) -> Result<(), LanguageError> {
        let dfa_len = self.lex.dfa.len();
        let lex_states = self.lex.states.len();
        if lex_states == 0 {
            return Err(LanguageError::malformed("lexer has no lexical states"));
        }
        if let Some(state) = self
            .lex
            .states
            .iter()
            .find(|state| state.start as usize >= dfa_len)
        {
            return Err(LanguageError::malformed(format!(
                "lexical state {} starts at missing DFA state {}",
                state.name, state.start
            )));
        }
        for (idx, state) in self.lex.dfa.iter().enumerate() {
            let mut previous_max: Option<u8> = None;
            for transition in &state.transitions {
                if transition.min > transition.max
                    || previous_max.is_some_and(|max| transition.min <= max)
                {
                    return Err(LanguageError::malformed(format!(
                        "DFA state {idx} has unsorted or overlapping transitions"
                    )));
                }
                if transition.target as usize >= dfa_len {
                    return Err(LanguageError::malformed(format!(
                        "DFA state {idx} targets missing state {}",
                        transition.target
                    )));
                }
                previous_max = Some(transition.max);
            }
            if let Some(accept) = state.accept {
                if !self.is_terminal(accept.symbol) {
                    return Err(LanguageError::malformed(format!(
                        "DFA state {idx} accepts non-terminal {}",
                        accept.symbol.0
                    )));
                }
                if accept
                    .next_state
                    .is_some_and(|next| next.index() >= lex_states)
                {
                    return Err(LanguageError::malformed(format!(
                        "DFA state {idx} switches to missing lexical state"
                    )));
                }
            }
        }
        Ok(())
    }
}
