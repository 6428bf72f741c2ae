//! Error recovery planning
//!
//! Invoked when the automaton has no action for the lookahead. Planning is a
//! pure function of the state stack, the offending token, the token after it
//! and the configuration, so identical inputs always recover identically.
//!
//! ```text
//! (a) delete      skip the token when the next one fits
//! (b) pop d       discard d frames (0..=max_pop_depth), then resume
//!                 directly or after inserting one missing terminal
//! (c) panic       no candidate: the parser swallows tokens through the
//!                 next sync token into an ERROR node
//! ```
//!
//! Candidates (a) and (b) are priced with [`RecoveryConfig`]; the cheapest
//! wins and ties go to the candidate listed first.

use serde::{Deserialize, Serialize};

use crate::language::{Action, Language, StateId, SymbolId};

/// Tunable recovery costs and limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Cost of each discarded stack frame or deleted token
    pub skipped_tree_cost: u32,
    /// Cost of each discarded byte
    pub skipped_byte_cost: u32,
    /// Cost of inserting a missing token
    pub missing_cost: u32,
    /// Deepest stack pop considered before panic mode
    pub max_pop_depth: usize,
    /// Viability checks allowed per recovery
    pub max_attempts: usize,
    /// Reductions simulated per viability check
    pub max_simulation_steps: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            skipped_tree_cost: 100,
            skipped_byte_cost: 1,
            missing_cost: 50,
            max_pop_depth: 4,
            max_attempts: 512,
            max_simulation_steps: 256,
        }
    }
}

/// What the parser should do to resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPlan {
    /// Wrap the offending token in an ERROR node and skip it
    Delete,
    /// Pop `depth` frames into an ERROR node, then optionally shift a
    /// zero-width `missing` token before retrying the lookahead
    Pop {
        depth: usize,
        missing: Option<SymbolId>,
    },
    /// Consume an error region through the next sync token
    Panic,
}

/// Inputs to [`plan`]
pub struct RecoveryInput<'a> {
    /// Automaton states from the base up, one per non-extra entry
    pub states: &'a [StateId],
    /// `popped_bytes[d]`: bytes discarded by popping `d` frames
    pub popped_bytes: &'a [u32],
    pub token: SymbolId,
    pub token_len: u32,
    /// First significant token after `token`
    pub next: SymbolId,
}

/// Choose the cheapest way to resume after `input.token` has no action.
pub fn plan(language: &Language, config: &RecoveryConfig, input: &RecoveryInput<'_>) -> RecoveryPlan {
    let mut sim = Simulator {
        language,
        steps: config.max_simulation_steps,
        attempts: 0,
        max_attempts: config.max_attempts,
    };
    let mut best: Option<(u64, RecoveryPlan)> = None;
    let mut consider = |cost: u64, candidate: RecoveryPlan| {
        if best.is_none_or(|(best_cost, _)| cost < best_cost) {
            best = Some((cost, candidate));
        }
    };

    if input.token != SymbolId::END && sim.viable(input.states, input.next) {
        let cost = config.skipped_tree_cost as u64
            + input.token_len as u64 * config.skipped_byte_cost as u64;
        consider(cost, RecoveryPlan::Delete);
    }

    let max_depth = config
        .max_pop_depth
        .min(input.states.len().saturating_sub(1))
        .min(input.popped_bytes.len().saturating_sub(1));
    for depth in 0..=max_depth {
        if sim.exhausted() {
            break;
        }
        let states = &input.states[..input.states.len() - depth];
        let popped_cost = depth as u64 * config.skipped_tree_cost as u64
            + input.popped_bytes[depth] as u64 * config.skipped_byte_cost as u64;

        if depth > 0 && sim.viable(states, input.token) {
            consider(popped_cost, RecoveryPlan::Pop { depth, missing: None });
            continue;
        }
        if let Some(missing) = sim.missing_terminal(states, input.token, input.next) {
            let cost = popped_cost + config.missing_cost as u64;
            consider(
                cost,
                RecoveryPlan::Pop {
                    depth,
                    missing: Some(missing),
                },
            );
        }
    }

    let chosen = best.map_or(RecoveryPlan::Panic, |(_, candidate)| candidate);
    tracing::trace!(
        token = language.symbol_name(input.token),
        attempts = sim.attempts,
        plan = ?chosen,
        "planned recovery"
    );
    chosen
}

/// Smallest number of frames to pop so that `symbol` can be shifted, if any
pub fn first_viable_depth(
    language: &Language,
    config: &RecoveryConfig,
    states: &[StateId],
    symbol: SymbolId,
) -> Option<usize> {
    let mut sim = Simulator {
        language,
        steps: config.max_simulation_steps,
        attempts: 0,
        max_attempts: usize::MAX,
    };
    (0..states.len()).find(|depth| sim.viable(&states[..states.len() - depth], symbol))
}

/// Replays table actions on a copy of the state stack
struct Simulator<'a> {
    language: &'a Language,
    steps: usize,
    attempts: usize,
    max_attempts: usize,
}

impl Simulator<'_> {
    fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    fn viable(&mut self, states: &[StateId], symbol: SymbolId) -> bool {
        if self.exhausted() {
            return false;
        }
        self.attempts += 1;
        let mut states = states.to_vec();
        self.shift(&mut states, symbol)
    }

    /// Perform the reductions `symbol` triggers and shift it. Accepting
    /// counts as shifting the end of input.
    fn shift(&self, states: &mut Vec<StateId>, symbol: SymbolId) -> bool {
        for _ in 0..self.steps {
            let Some(&top) = states.last() else {
                return false;
            };
            match self.language.action(top, symbol) {
                Some(Action::Shift(next)) => {
                    states.push(next);
                    return true;
                }
                Some(Action::Accept) => return true,
                Some(Action::Reduce(rule)) => {
                    let Some(info) = self.language.rule(rule) else {
                        return false;
                    };
                    let len = info.len as usize;
                    if len >= states.len() {
                        return false;
                    }
                    states.truncate(states.len() - len);
                    let Some(&below) = states.last() else {
                        return false;
                    };
                    match self.language.goto(below, info.lhs) {
                        Some(next) => states.push(next),
                        None => return false,
                    }
                }
                None => return false,
            }
        }
        false
    }

    /// Lowest terminal whose insertion lets `token` be shifted, preferring
    /// one after which `next` fits as well
    fn missing_terminal(
        &mut self,
        states: &[StateId],
        token: SymbolId,
        next: SymbolId,
    ) -> Option<SymbolId> {
        let top = *states.last()?;
        let candidates: Vec<SymbolId> = self
            .language
            .expected_terminals(top)
            .filter(|symbol| {
                *symbol != SymbolId::END
                    && *symbol != SymbolId::ERROR
                    && !self.language.is_extra(*symbol)
            })
            .collect();

        let mut fallback = None;
        for missing in candidates {
            if self.exhausted() {
                break;
            }
            self.attempts += 1;
            let mut simulated = states.to_vec();
            if !self.shift(&mut simulated, missing) || !self.shift(&mut simulated, token) {
                continue;
            }
            if token == SymbolId::END || self.shift(&mut simulated, next) {
                return Some(missing);
            }
            fallback.get_or_insert(missing);
        }
        fallback
    }
}
