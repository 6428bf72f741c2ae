//! Token automata
//!
//! ```text
//! patterns ──Thompson──▶ NFA (one, shared by every lexical state)
//!                         │
//!                         ▼ subset construction per lexical state
//!                        DFA states with byte-range transitions
//! ```
//!
//! Each DFA state accepts the highest-priority pattern among its NFA states;
//! equal priorities go to the pattern declared first.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::regex::Regex;
use crate::language::{ByteTransition, DfaAccept, DfaState, LexState, LexStateInfo, LexTable, SymbolId};

/// One compiled token pattern
pub(crate) struct LexPattern {
    pub regex: Regex,
    pub symbol: SymbolId,
    pub priority: i32,
    pub states: Vec<LexState>,
    pub next_state: Option<LexState>,
}

#[derive(Default)]
struct NfaState {
    ranges: Vec<(u8, u8, usize)>,
    epsilon: Vec<usize>,
    /// Index of the pattern this state completes
    accept: Option<usize>,
}

#[derive(Default)]
struct Nfa {
    states: Vec<NfaState>,
}

impl Nfa {
    fn add_state(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon.push(to);
    }

    /// Thompson construction; returns (entry, exit)
    fn compile(&mut self, regex: &Regex) -> (usize, usize) {
        match regex {
            Regex::Empty => {
                let start = self.add_state();
                let end = self.add_state();
                self.epsilon(start, end);
                (start, end)
            }
            Regex::Class(ranges) => {
                let start = self.add_state();
                let end = self.add_state();
                for &(min, max) in ranges {
                    self.states[start].ranges.push((min, max, end));
                }
                (start, end)
            }
            Regex::Concat(items) => {
                let start = self.add_state();
                let mut current = start;
                for item in items {
                    let (entry, exit) = self.compile(item);
                    self.epsilon(current, entry);
                    current = exit;
                }
                (start, current)
            }
            Regex::Alt(items) => {
                let start = self.add_state();
                let end = self.add_state();
                for item in items {
                    let (entry, exit) = self.compile(item);
                    self.epsilon(start, entry);
                    self.epsilon(exit, end);
                }
                (start, end)
            }
            Regex::Star(inner) => {
                let start = self.add_state();
                let end = self.add_state();
                let (entry, exit) = self.compile(inner);
                self.epsilon(start, entry);
                self.epsilon(start, end);
                self.epsilon(exit, entry);
                self.epsilon(exit, end);
                (start, end)
            }
            Regex::Plus(inner) => {
                let start = self.add_state();
                let end = self.add_state();
                let (entry, exit) = self.compile(inner);
                self.epsilon(start, entry);
                self.epsilon(exit, entry);
                self.epsilon(exit, end);
                (start, end)
            }
            Regex::Optional(inner) => {
                let start = self.add_state();
                let end = self.add_state();
                let (entry, exit) = self.compile(inner);
                self.epsilon(start, entry);
                self.epsilon(start, end);
                self.epsilon(exit, end);
                (start, end)
            }
        }
    }

    /// Sorted epsilon closure
    fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut seen = vec![false; self.states.len()];
        let mut stack: Vec<usize> = Vec::new();
        for seed in seeds {
            if !seen[seed] {
                seen[seed] = true;
                stack.push(seed);
            }
        }
        let mut result = Vec::new();
        while let Some(state) = stack.pop() {
            result.push(state);
            for &next in &self.states[state].epsilon {
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        result.sort_unstable();
        result
    }

    /// Byte classes: maximal intervals no transition boundary splits
    fn byte_classes(&self) -> Vec<(u8, u8)> {
        let mut cuts = vec![false; 257];
        cuts[0] = true;
        cuts[256] = true;
        for state in &self.states {
            for &(min, max, _) in &state.ranges {
                cuts[min as usize] = true;
                cuts[max as usize + 1] = true;
            }
        }
        let mut classes = Vec::new();
        let mut start = 0usize;
        for boundary in 1..=256 {
            if cuts[boundary] {
                classes.push((start as u8, (boundary - 1) as u8));
                start = boundary;
            }
        }
        classes
    }
}

/// Compile token patterns into the lexer table.
pub(crate) fn build_lex_table(lex_states: &[SmolStr], patterns: &[LexPattern]) -> LexTable {
    let mut nfa = Nfa::default();
    let mut entries: Vec<usize> = Vec::with_capacity(patterns.len());
    for (idx, pattern) in patterns.iter().enumerate() {
        let (entry, exit) = nfa.compile(&pattern.regex);
        nfa.states[exit].accept = Some(idx);
        entries.push(entry);
    }
    let classes = nfa.byte_classes();

    let mut dfa: Vec<DfaState> = Vec::new();
    let mut sets: Vec<Vec<usize>> = Vec::new();
    let mut index: FxHashMap<Vec<usize>, u32> = FxHashMap::default();
    let mut states = Vec::with_capacity(lex_states.len());

    for (lex_idx, name) in lex_states.iter().enumerate() {
        let lex_state = LexState(lex_idx as u16);
        let seeds = patterns
            .iter()
            .enumerate()
            .filter(|(_, pattern)| pattern.states.contains(&lex_state))
            .map(|(idx, _)| entries[idx]);
        let start_set = nfa.closure(seeds);
        let start = intern_set(start_set, &mut index, &mut sets, &mut dfa);
        states.push(LexStateInfo {
            name: name.clone(),
            start,
        });
    }

    // `sets` grows while it is walked, each new set is expanded once.
    let mut next = 0;
    while next < sets.len() {
        let set = sets[next].clone();
        dfa[next].accept = best_accept(&nfa, &set, patterns);

        let mut transitions: Vec<ByteTransition> = Vec::new();
        for &(min, max) in &classes {
            let targets = set.iter().flat_map(|&state| {
                nfa.states[state]
                    .ranges
                    .iter()
                    .filter(move |(lo, hi, _)| *lo <= min && max <= *hi)
                    .map(|(_, _, target)| *target)
            });
            let target_set = nfa.closure(targets);
            if target_set.is_empty() {
                continue;
            }
            let target = intern_set(target_set, &mut index, &mut sets, &mut dfa);
            match transitions.last_mut() {
                Some(last) if last.target == target && last.max as u16 + 1 == min as u16 => {
                    last.max = max;
                }
                _ => transitions.push(ByteTransition { min, max, target }),
            }
        }
        dfa[next].transitions = transitions;
        next += 1;
    }

    tracing::debug!(
        lex_states = states.len(),
        dfa_states = dfa.len(),
        nfa_states = nfa.states.len(),
        "compiled lexer tables"
    );
    LexTable { states, dfa }
}

fn intern_set(
    set: Vec<usize>,
    index: &mut FxHashMap<Vec<usize>, u32>,
    sets: &mut Vec<Vec<usize>>,
    dfa: &mut Vec<DfaState>,
) -> u32 {
    if let Some(&id) = index.get(&set) {
        return id;
    }
    let id = sets.len() as u32;
    index.insert(set.clone(), id);
    sets.push(set);
    dfa.push(DfaState::default());
    id
}

fn best_accept(nfa: &Nfa, set: &[usize], patterns: &[LexPattern]) -> Option<DfaAccept> {
    set.iter()
        .filter_map(|&state| nfa.states[state].accept)
        .min_by_key(|&idx| (std::cmp::Reverse(patterns[idx].priority), idx))
        .map(|idx| DfaAccept {
            symbol: patterns[idx].symbol,
            next_state: patterns[idx].next_state,
        })
}
