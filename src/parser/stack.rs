//! Parse stack
//!
//! ```text
//! bottom                                              top
//! [ entry | entry (extra) | entry | ... | entry (extra) ]
//!     │                        │
//!     └ state after the entry  └ extras keep the state below them
//! ```
//!
//! Extras never change the automaton state. A reduction pops the trailing
//! extras aside, then the rule's children together with the extras between
//! them, and pushes the trailing extras back above the new node.

use crate::language::StateId;
use crate::tree::GreenNode;

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub node: GreenNode,
    /// Automaton state once this entry is on the stack
    pub state: StateId,
    pub start: u32,
}

impl Entry {
    pub fn end(&self) -> u32 {
        self.start + self.node.text_len()
    }

    pub fn is_extra(&self) -> bool {
        self.node.is_extra()
    }
}

/// Entries removed by [`Stack::pop_children`]
pub(crate) struct Popped {
    /// The rule's children in order, with their interior extras
    pub children: Vec<Entry>,
    /// Extras that sat above the children, in order
    pub trailing: Vec<Entry>,
}

pub(crate) struct Stack {
    base: StateId,
    entries: Vec<Entry>,
}

impl Stack {
    pub fn new(base: StateId) -> Self {
        Self {
            base,
            entries: Vec::new(),
        }
    }

    pub fn state(&self) -> StateId {
        self.entries.last().map_or(self.base, |entry| entry.state)
    }

    /// Offset just past the top entry
    pub fn end(&self) -> u32 {
        self.entries.last().map_or(0, Entry::end)
    }

    pub fn push(&mut self, node: GreenNode, state: StateId, start: u32) {
        self.entries.push(Entry { node, state, start });
    }

    pub fn push_extra(&mut self, node: GreenNode, start: u32) {
        let state = self.state();
        self.entries.push(Entry { node, state, start });
    }

    /// Re-push entries that were set aside, recomputing their states
    pub fn push_extras(&mut self, extras: Vec<Entry>) {
        for entry in extras {
            self.push_extra(entry.node, entry.start);
        }
    }

    /// Pop `count` non-extra entries and everything above them. Returns
    /// `None` (and leaves the stack untouched) when there are too few.
    pub fn pop_children(&mut self, count: usize) -> Option<Popped> {
        let split = self.split_point(count)?;
        let mut children = self.entries.split_off(split);
        let trailing_start = children
            .iter()
            .rposition(|entry| !entry.is_extra())
            .map_or(0, |idx| idx + 1);
        let trailing = children.split_off(trailing_start);
        Some(Popped { children, trailing })
    }

    /// Pop `count` non-extra entries and everything above them, as one run
    pub fn pop_frames(&mut self, count: usize) -> Vec<Entry> {
        match self.split_point(count) {
            Some(split) => self.entries.split_off(split),
            None => std::mem::take(&mut self.entries),
        }
    }

    pub fn take_all(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    /// Index of the lowest entry removed when popping `count` non-extras
    fn split_point(&self, count: usize) -> Option<usize> {
        if count == 0 {
            return Some(
                self.entries
                    .iter()
                    .rposition(|entry| !entry.is_extra())
                    .map_or(0, |idx| idx + 1),
            );
        }
        let mut remaining = count;
        for (idx, entry) in self.entries.iter().enumerate().rev() {
            if !entry.is_extra() {
                remaining -= 1;
                if remaining == 0 {
                    return Some(idx);
                }
            }
        }
        None
    }

    /// Automaton states from the base up, one per non-extra entry
    pub fn states(&self) -> Vec<StateId> {
        std::iter::once(self.base)
            .chain(
                self.entries
                    .iter()
                    .filter(|entry| !entry.is_extra())
                    .map(|entry| entry.state),
            )
            .collect()
    }

    /// Bytes that popping `depth` non-extra entries would discard, for
    /// every depth up to `max_depth`
    pub fn popped_bytes(&self, max_depth: usize) -> Vec<u32> {
        let mut bytes = vec![0];
        let mut total = 0;
        let mut depth = 0;
        for entry in self.entries.iter().rev() {
            if depth >= max_depth {
                break;
            }
            total += entry.node.text_len();
            if !entry.is_extra() {
                depth += 1;
                bytes.push(total);
            }
        }
        bytes
    }
}
