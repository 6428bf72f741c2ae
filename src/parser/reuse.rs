//! Incremental reuse of an old tree
//!
//! The cursor walks the old green tree in document order while the parser
//! advances. Old positions are mapped through the edits; at each parse
//! position the cursor offers the largest old node starting exactly there:
//!
//! ```text
//! mapped end   <= position  → skip the node
//! mapped start <  position  → descend (leaves are skipped)
//! mapped start >  position  → nothing to offer yet
//! mapped start == position  → candidate
//! ```
//!
//! The parser decides whether a candidate is usable and asks the cursor to
//! [`descend`](ReuseCursor::descend) into it when it is not.

use crate::language::LexState;
use crate::tree::{GreenNode, InputEdit, map_span};

/// An old node positioned in the new text
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub node: GreenNode,
    pub start: u32,
    pub end: u32,
    pub changed: bool,
}

impl Candidate {
    /// Why this candidate cannot be taken as a lookahead, if anything
    pub fn rejection(&self, lex_state: LexState) -> Option<&'static str> {
        let node = &self.node;
        if self.changed {
            return Some("changed");
        }
        if self.end <= self.start || node.text_len() == 0 {
            return Some("empty");
        }
        if node.has_error() {
            return Some("contains errors");
        }
        if node.is_fragile() {
            return Some("fragile");
        }
        if node.lex_start() != lex_state {
            return Some("lexical state differs");
        }
        if !node.is_token() && node.first_token().is_none_or(GreenNode::is_extra) {
            return Some("starts with an extra");
        }
        if node.first_token().is_some_and(GreenNode::is_contextual) {
            return Some("starts with a contextual keyword");
        }
        None
    }
}

struct Frame {
    node: GreenNode,
    /// Start offset in the old text
    start: u32,
    /// Index in the parent's children
    index: usize,
}

pub(crate) struct ReuseCursor {
    edits: Vec<InputEdit>,
    path: Vec<Frame>,
}

impl ReuseCursor {
    pub fn new(root: GreenNode, edits: Vec<InputEdit>) -> Self {
        Self {
            edits,
            path: vec![Frame {
                node: root,
                start: 0,
                index: 0,
            }],
        }
    }

    fn current(&self) -> Option<Candidate> {
        let frame = self.path.last()?;
        let end = frame.start + frame.node.text_len();
        let span = map_span(
            &self.edits,
            frame.start,
            end,
            end + frame.node.lookahead_bytes(),
        );
        Some(Candidate {
            node: frame.node.clone(),
            start: span.start,
            end: span.end.max(span.start),
            changed: span.changed,
        })
    }

    /// The old node starting at `position`, moving forward as needed
    pub fn candidate(&mut self, position: u32) -> Option<Candidate> {
        loop {
            let candidate = self.current()?;
            if candidate.end <= position {
                self.advance();
            } else if candidate.start < position {
                self.descend();
            } else if candidate.start > position {
                return None;
            } else {
                return Some(candidate);
            }
        }
    }

    /// Move past the current node
    pub fn advance(&mut self) {
        while let Some(frame) = self.path.pop() {
            let Some(parent) = self.path.last() else {
                return;
            };
            let index = frame.index + 1;
            if let Some(next) = parent.node.children().get(index) {
                let next = Frame {
                    node: next.clone(),
                    start: frame.start + frame.node.text_len(),
                    index,
                };
                self.path.push(next);
                return;
            }
        }
    }

    /// Move to the current node's first child, or past it when it is a leaf
    pub fn descend(&mut self) {
        let first = self
            .path
            .last()
            .and_then(|frame| Some((frame.node.children().first()?.clone(), frame.start)));
        match first {
            Some((node, start)) => self.path.push(Frame {
                node,
                start,
                index: 0,
            }),
            None => self.advance(),
        }
    }
}
