//! LALR(1) table construction
//!
//! LR(1) item sets are built with lookahead sets attached to each item; sets
//! whose LR(0) cores coincide are merged, and a state is revisited whenever
//! its kernel lookaheads grow. The fixpoint is the LALR(1) automaton.
//!
//! Conflicts are resolved yacc-style: precedence and associativity first,
//! then shift over reduce and the earliest rule among reduces. Every default
//! resolution is reported back as a [`Conflict`]. A rule given an explicit
//! level also outranks or yields to tokens without one, which count as
//! level 0.

use std::collections::VecDeque;
use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::Assoc;
use crate::language::{Action, StateId};

/// A production in symbol-index space; production 0 is the augmented start.
pub(crate) struct Production {
    pub lhs: usize,
    pub rhs: Vec<usize>,
    pub prec: Option<i32>,
    /// `prec` was declared on the rule rather than taken from a token
    pub explicit: bool,
}

pub(crate) struct TableInput<'a> {
    pub terminal_count: usize,
    pub symbol_count: usize,
    pub productions: &'a [Production],
    pub token_prec: &'a [Option<(i32, Assoc)>],
    /// Terminal used as the end-of-input lookahead
    pub end: usize,
}

pub(crate) struct Tables {
    pub state_count: usize,
    pub actions: Vec<Option<Action>>,
    pub gotos: Vec<Option<StateId>>,
    pub conflicts: Vec<RawConflict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => write!(f, "shift/reduce"),
            Self::ReduceReduce => write!(f, "reduce/reduce"),
        }
    }
}

pub(crate) struct RawConflict {
    pub state: usize,
    pub lookahead: usize,
    pub kind: ConflictKind,
    pub productions: Vec<usize>,
}

/// Bitset over terminals
#[derive(Debug, Clone, PartialEq, Eq)]
struct TermSet(Vec<u64>);

impl TermSet {
    fn new(terminals: usize) -> Self {
        Self(vec![0; terminals.div_ceil(64)])
    }

    fn insert(&mut self, terminal: usize) -> bool {
        let (word, bit) = (terminal / 64, 1u64 << (terminal % 64));
        let changed = self.0[word] & bit == 0;
        self.0[word] |= bit;
        changed
    }

    fn union_with(&mut self, other: &TermSet) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.0.iter_mut().zip(&other.0) {
            let merged = *mine | *theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(word_idx, word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| word_idx * 64 + bit)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Item {
    production: u32,
    dot: u32,
}

struct Builder<'a> {
    input: &'a TableInput<'a>,
    by_lhs: Vec<Vec<usize>>,
    nullable: Vec<bool>,
    first: Vec<TermSet>,
}

impl<'a> Builder<'a> {
    fn new(input: &'a TableInput<'a>) -> Self {
        let mut by_lhs = vec![Vec::new(); input.symbol_count];
        for (idx, production) in input.productions.iter().enumerate() {
            by_lhs[production.lhs].push(idx);
        }

        let terminals = input.terminal_count;
        let mut nullable = vec![false; input.symbol_count];
        let mut first: Vec<TermSet> = (0..input.symbol_count)
            .map(|symbol| {
                let mut set = TermSet::new(terminals);
                if symbol < terminals {
                    set.insert(symbol);
                }
                set
            })
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for production in input.productions {
                let mut all_nullable = true;
                for &symbol in &production.rhs {
                    if symbol != production.lhs {
                        let addition = first[symbol].clone();
                        changed |= first[production.lhs].union_with(&addition);
                    }
                    if !nullable[symbol] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[production.lhs] {
                    nullable[production.lhs] = true;
                    changed = true;
                }
            }
        }

        Self {
            input,
            by_lhs,
            nullable,
            first,
        }
    }

    fn is_terminal(&self, symbol: usize) -> bool {
        symbol < self.input.terminal_count
    }

    fn next_symbol(&self, item: Item) -> Option<usize> {
        self.input.productions[item.production as usize]
            .rhs
            .get(item.dot as usize)
            .copied()
    }

    /// FIRST of `symbols`, followed by `tail` when all of them are nullable
    fn first_of(&self, symbols: &[usize], tail: &TermSet) -> TermSet {
        let mut set = TermSet::new(self.input.terminal_count);
        for &symbol in symbols {
            set.union_with(&self.first[symbol]);
            if !self.nullable[symbol] {
                return set;
            }
        }
        set.union_with(tail);
        set
    }

    fn closure(&self, kernel: &[(Item, TermSet)]) -> IndexMap<Item, TermSet> {
        let mut items: IndexMap<Item, TermSet> = kernel.iter().cloned().collect();
        let mut work: Vec<usize> = (0..items.len()).collect();
        while let Some(idx) = work.pop() {
            let (item, lookahead) = match items.get_index(idx) {
                Some((item, lookahead)) => (*item, lookahead.clone()),
                None => continue,
            };
            let Some(next) = self.next_symbol(item) else {
                continue;
            };
            if self.is_terminal(next) {
                continue;
            }
            let rhs = &self.input.productions[item.production as usize].rhs;
            let follow = self.first_of(&rhs[item.dot as usize + 1..], &lookahead);
            for &production in &self.by_lhs[next] {
                let fresh = Item {
                    production: production as u32,
                    dot: 0,
                };
                match items.get_index_of(&fresh) {
                    Some(existing) => {
                        if items[existing].union_with(&follow) {
                            work.push(existing);
                        }
                    }
                    None => {
                        items.insert(fresh, follow.clone());
                        work.push(items.len() - 1);
                    }
                }
            }
        }
        items
    }
}

pub(crate) fn build_tables(input: &TableInput<'_>) -> Tables {
    let builder = Builder::new(input);
    let terminals = input.terminal_count;

    let mut start_lookahead = TermSet::new(terminals);
    start_lookahead.insert(input.end);
    let mut kernels: Vec<Vec<(Item, TermSet)>> = vec![vec![(
        Item {
            production: 0,
            dot: 0,
        },
        start_lookahead,
    )]];
    let mut by_core: FxHashMap<Vec<Item>, usize> = FxHashMap::default();
    by_core.insert(vec![kernels[0][0].0], 0);
    let mut transitions: Vec<IndexMap<usize, usize>> = vec![IndexMap::new()];

    let mut queue: VecDeque<usize> = VecDeque::from([0]);
    let mut queued = vec![true];
    let mut visits = 0usize;
    while let Some(state) = queue.pop_front() {
        queued[state] = false;
        visits += 1;
        let closure = builder.closure(&kernels[state]);

        let mut successors: IndexMap<usize, Vec<(Item, TermSet)>> = IndexMap::new();
        for (item, lookahead) in &closure {
            if let Some(symbol) = builder.next_symbol(*item) {
                let advanced = Item {
                    production: item.production,
                    dot: item.dot + 1,
                };
                successors
                    .entry(symbol)
                    .or_default()
                    .push((advanced, lookahead.clone()));
            }
        }

        for (symbol, mut kernel) in successors {
            kernel.sort_by_key(|(item, _)| *item);
            let core: Vec<Item> = kernel.iter().map(|(item, _)| *item).collect();
            let target = match by_core.get(&core) {
                Some(&existing) => {
                    let mut grew = false;
                    for ((_, mine), (_, theirs)) in kernels[existing].iter_mut().zip(&kernel) {
                        grew |= mine.union_with(theirs);
                    }
                    if grew && !queued[existing] {
                        queued[existing] = true;
                        queue.push_back(existing);
                    }
                    existing
                }
                None => {
                    let id = kernels.len();
                    kernels.push(kernel);
                    by_core.insert(core, id);
                    transitions.push(IndexMap::new());
                    queued.push(true);
                    queue.push_back(id);
                    id
                }
            };
            transitions[state].insert(symbol, target);
        }
    }

    let state_count = kernels.len();
    tracing::debug!(states = state_count, visits, "built LALR(1) automaton");

    let nonterminals = input.symbol_count - terminals;
    let mut actions: Vec<Option<Action>> = vec![None; state_count * terminals];
    let mut gotos: Vec<Option<StateId>> = vec![None; state_count * nonterminals];
    let mut conflicts = Vec::new();

    for state in 0..state_count {
        let closure = builder.closure(&kernels[state]);
        let mut cells: IndexMap<usize, Vec<Action>> = IndexMap::new();

        for (symbol, target) in &transitions[state] {
            if *symbol < terminals {
                cells
                    .entry(*symbol)
                    .or_default()
                    .push(Action::Shift(*target as StateId));
            } else {
                gotos[state * nonterminals + (symbol - terminals)] = Some(*target as StateId);
            }
        }
        for (item, lookahead) in &closure {
            if builder.next_symbol(*item).is_some() {
                continue;
            }
            for terminal in lookahead.iter() {
                let action = if item.production == 0 {
                    if terminal != input.end {
                        continue;
                    }
                    Action::Accept
                } else {
                    Action::Reduce(item.production as u16)
                };
                let cell = cells.entry(terminal).or_default();
                if !cell.contains(&action) {
                    cell.push(action);
                }
            }
        }

        for (terminal, candidates) in cells {
            actions[state * terminals + terminal] =
                resolve(input, state, terminal, candidates, &mut conflicts);
        }
    }

    Tables {
        state_count,
        actions,
        gotos,
        conflicts,
    }
}

fn resolve(
    input: &TableInput<'_>,
    state: usize,
    terminal: usize,
    candidates: Vec<Action>,
    conflicts: &mut Vec<RawConflict>,
) -> Option<Action> {
    if candidates.len() == 1 {
        return candidates.into_iter().next();
    }
    if candidates.contains(&Action::Accept) {
        return Some(Action::Accept);
    }

    let shift = candidates
        .iter()
        .find(|action| matches!(action, Action::Shift(_)))
        .copied();
    let mut reduces: Vec<usize> = candidates
        .iter()
        .filter_map(|action| match action {
            Action::Reduce(production) => Some(*production as usize),
            _ => None,
        })
        .collect();
    reduces.sort_unstable();

    if reduces.len() > 1 {
        conflicts.push(RawConflict {
            state,
            lookahead: terminal,
            kind: ConflictKind::ReduceReduce,
            productions: reduces.clone(),
        });
    }
    let reduce = reduces.first().copied()?;
    let Some(shift) = shift else {
        return Some(Action::Reduce(reduce as u16));
    };

    let production = &input.productions[reduce];
    match (production.prec, input.token_prec[terminal]) {
        (Some(rule_level), None) if production.explicit && rule_level != 0 => {
            if rule_level > 0 {
                Some(Action::Reduce(reduce as u16))
            } else {
                Some(shift)
            }
        }
        (Some(rule_level), Some((token_level, assoc))) => {
            if rule_level > token_level {
                Some(Action::Reduce(reduce as u16))
            } else if rule_level < token_level {
                Some(shift)
            } else {
                match assoc {
                    Assoc::Left => Some(Action::Reduce(reduce as u16)),
                    Assoc::Right => Some(shift),
                    Assoc::NonAssoc => None,
                }
            }
        }
        _ => {
            conflicts.push(RawConflict {
                state,
                lookahead: terminal,
                kind: ConflictKind::ShiftReduce,
                productions: vec![reduce],
            });
            Some(shift)
        }
    }
}
