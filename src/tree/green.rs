//! Immutable green nodes
//!
//! Green nodes know their kind, byte length and children but not their
//! position, so an unchanged subtree can be shared by every tree version
//! that contains it. They also remember what the parser needs to decide
//! whether a subtree can be reused: the automaton state it started in,
//! the lexical states at both ends and how far past its end the lexer and
//! parser looked while building it.

use std::fmt;
use std::sync::Arc;

use crate::language::{LexState, StateId, SymbolId};
use crate::lexer::Token;

const TOKEN: u8 = 1 << 0;
const ERROR: u8 = 1 << 1;
const MISSING: u8 = 1 << 2;
const HAS_ERROR: u8 = 1 << 3;
const EXTRA: u8 = 1 << 4;
const FRAGILE: u8 = 1 << 5;
const CONTEXTUAL: u8 = 1 << 6;

/// Flags compared by structural equality
const STRUCTURAL: u8 = TOKEN | ERROR | MISSING | EXTRA;

#[derive(Clone)]
pub struct GreenNode(Arc<GreenNodeData>);

struct GreenNodeData {
    kind: SymbolId,
    len: u32,
    flags: u8,
    parse_state: StateId,
    lex_start: LexState,
    lex_end: LexState,
    lookahead_bytes: u32,
    children: Box<[GreenNode]>,
}

/// Parser-side facts recorded on an interior node
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeInfo {
    pub parse_state: StateId,
    /// Lexical state of a childless node
    pub lex_state: LexState,
    /// Absolute offset one past the furthest byte the decision looked at
    pub lookahead_end: u32,
    pub start: u32,
    pub extra: bool,
    pub fragile: bool,
}

impl GreenNode {
    /// Leaf for a lexed token
    pub(crate) fn token(token: &Token, parse_state: StateId, extra: bool) -> Self {
        let mut flags = TOKEN;
        if token.kind == SymbolId::ERROR {
            flags |= ERROR | HAS_ERROR;
        }
        if extra {
            flags |= EXTRA;
        }
        if token.contextual {
            flags |= CONTEXTUAL;
        }
        Self(Arc::new(GreenNodeData {
            kind: token.kind,
            len: token.len(),
            flags,
            parse_state,
            lex_start: token.lex_state_before,
            lex_end: token.lex_state_after,
            lookahead_bytes: token.lookahead_end.saturating_sub(token.end),
            children: Box::new([]),
        }))
    }

    /// Zero-width placeholder for a token the parser had to assume
    pub(crate) fn missing(kind: SymbolId, parse_state: StateId, lex_state: LexState) -> Self {
        Self(Arc::new(GreenNodeData {
            kind,
            len: 0,
            flags: TOKEN | MISSING | HAS_ERROR,
            parse_state,
            lex_start: lex_state,
            lex_end: lex_state,
            lookahead_bytes: 0,
            children: Box::new([]),
        }))
    }

    /// Interior node over `children`
    pub(crate) fn node(kind: SymbolId, children: Vec<GreenNode>, info: NodeInfo) -> Self {
        let len: u32 = children.iter().map(GreenNode::text_len).sum();
        let end = info.start + len;

        let mut flags = 0;
        if kind == SymbolId::ERROR {
            flags |= ERROR | HAS_ERROR;
        }
        if children.iter().any(GreenNode::has_error) {
            flags |= HAS_ERROR;
        }
        if info.extra {
            flags |= EXTRA;
        }
        if info.fragile {
            flags |= FRAGILE;
        }

        let mut extent = info.lookahead_end.max(end);
        let mut child_start = info.start;
        for child in &children {
            extent = extent.max(child_start + child.text_len() + child.lookahead_bytes());
            child_start += child.text_len();
        }

        let lex_start = children.first().map_or(info.lex_state, GreenNode::lex_start);
        let lex_end = children.last().map_or(info.lex_state, GreenNode::lex_end);
        Self(Arc::new(GreenNodeData {
            kind,
            len,
            flags,
            parse_state: info.parse_state,
            lex_start,
            lex_end,
            lookahead_bytes: extent - end,
            children: children.into_boxed_slice(),
        }))
    }

    pub fn kind(&self) -> SymbolId {
        self.0.kind
    }

    pub fn text_len(&self) -> u32 {
        self.0.len
    }

    pub fn children(&self) -> &[GreenNode] {
        &self.0.children
    }

    /// Token leaves, including missing placeholders
    pub fn is_token(&self) -> bool {
        self.0.flags & TOKEN != 0
    }

    /// An `ERROR` node or lexer-error token
    pub fn is_error(&self) -> bool {
        self.0.flags & ERROR != 0
    }

    pub fn is_missing(&self) -> bool {
        self.0.flags & MISSING != 0
    }

    /// Error or missing node anywhere in this subtree, itself included
    pub fn has_error(&self) -> bool {
        self.0.flags & HAS_ERROR != 0
    }

    pub fn is_extra(&self) -> bool {
        self.0.flags & EXTRA != 0
    }

    /// Built while error recovery was looking ahead; never reused
    pub fn is_fragile(&self) -> bool {
        self.0.flags & FRAGILE != 0
    }

    /// A keyword the parser accepted as the grammar's word token
    pub fn is_contextual(&self) -> bool {
        self.0.flags & CONTEXTUAL != 0
    }

    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    pub fn lex_start(&self) -> LexState {
        self.0.lex_start
    }

    pub fn lex_end(&self) -> LexState {
        self.0.lex_end
    }

    /// Bytes after the node's end that influenced how it was built
    pub fn lookahead_bytes(&self) -> u32 {
        self.0.lookahead_bytes
    }

    /// Same allocation, i.e. shared rather than rebuilt
    pub fn ptr_eq(&self, other: &GreenNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// First token leaf, skipping nothing
    pub(crate) fn first_token(&self) -> Option<&GreenNode> {
        let mut node = self;
        while !node.is_token() {
            node = node.children().first()?;
        }
        Some(node)
    }
}

/// Structural equality: kinds, lengths, error/missing/extra marks and
/// children. Parser bookkeeping is ignored.
impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.ptr_eq(right) {
                continue;
            }
            let same = left.kind() == right.kind()
                && left.text_len() == right.text_len()
                && left.0.flags & STRUCTURAL == right.0.flags & STRUCTURAL
                && left.children().len() == right.children().len();
            if !same {
                return false;
            }
            pending.extend(left.children().iter().zip(right.children()).rev());
        }
        true
    }
}

impl Eq for GreenNode {}

/// Unshared subtrees are released from a worklist so deep trees cannot
/// exhaust the call stack.
impl Drop for GreenNodeData {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut pending: Vec<GreenNode> = std::mem::take(&mut self.children).into_vec();
        while let Some(node) = pending.pop() {
            if let Ok(mut data) = Arc::try_unwrap(node.0) {
                pending.extend(std::mem::take(&mut data.children).into_vec());
            }
        }
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind().0)
            .field("len", &self.text_len())
            .field("children", &self.children().len())
            .finish()
    }
}
