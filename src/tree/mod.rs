//! Concrete syntax trees
//!
//! ```text
//! SyntaxTree ── root: GreenNode (immutable, Arc-shared between versions)
//!     │         edits: recorded InputEdits (positions mapped on read)
//!     ▼
//! SyntaxNode (red) ── created lazily while navigating
//!     │
//!     ▼
//! TreeCursor / Preorder / ErrorNodes
//! ```
//!
//! Every byte of the source belongs to exactly one token leaf: whitespace
//! and comments are kept as `extra` leaves, unmatched bytes as `ERROR`
//! leaves. A tree is never mutated; [`SyntaxTree::edit`] returns a new
//! version that shares the whole green tree with the old one.

mod cursor;
mod diagnostics;
mod edit;
mod green;
mod node;


use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::language::Language;
use crate::errors::SyntaxError;

pub use cursor::{Preorder, TreeCursor};
pub use edit::InputEdit;
pub(crate) use edit::map_span;
pub use green::GreenNode;
pub(crate) use green::NodeInfo;
pub use node::{Children, SyntaxNode};
pub(crate) use node::TreeContext;

/// One parse result
#[derive(Clone)]
pub struct SyntaxTree {
    root: GreenNode,
    ctx: Arc<TreeContext>,
    partial: bool,
}

impl SyntaxTree {
    pub(crate) fn new(root: GreenNode, language: Arc<Language>, partial: bool) -> Self {
        Self {
            root,
            ctx: Arc::new(TreeContext {
                language,
                edits: Vec::new(),
            }),
            partial,
        }
    }

    pub fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.root.clone(), self.ctx.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.root
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.ctx.language
    }

    /// Stopped early by cancellation or the operation budget
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Edits recorded since the tree was parsed, oldest first
    pub fn edits(&self) -> &[InputEdit] {
        &self.ctx.edits
    }

    /// New tree version with `edit` recorded. Nothing is copied: positions
    /// of nodes after the edit shift and nodes it touches report
    /// [`SyntaxNode::has_changes`].
    pub fn edit(&self, edit: &InputEdit) -> SyntaxTree {
        let mut edits = self.ctx.edits.clone();
        edits.push(*edit);
        SyntaxTree {
            root: self.root.clone(),
            ctx: Arc::new(TreeContext {
                language: self.ctx.language.clone(),
                edits,
            }),
            partial: self.partial,
        }
    }

    pub fn walk(&self) -> TreeCursor {
        TreeCursor::new(self.root())
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    /// Outermost `ERROR` and missing nodes, in document order
    pub fn errors(&self) -> ErrorNodes {
        ErrorNodes {
            inner: self.root().descendants(),
        }
    }

    /// Errors rendered as diagnostics against `source`
    pub fn diagnostics(&self, source: &[u8]) -> Vec<SyntaxError> {
        diagnostics::collect(self, source)
    }

    pub fn to_sexp(&self) -> String {
        self.root().to_sexp()
    }

    /// How many visible nodes of this tree were taken over from `previous`
    /// rather than rebuilt
    pub fn reuse_stats(&self, previous: &SyntaxTree) -> ReuseStats {
        let mut old: FxHashSet<usize> = FxHashSet::default();
        let mut stack = vec![&previous.root];
        while let Some(green) = stack.pop() {
            if old.insert(green.addr()) {
                stack.extend(green.children());
            }
        }

        let mut stats = ReuseStats::default();
        for node in self.root().descendants() {
            stats.total += 1;
            if old.contains(&node.green().addr()) {
                stats.reused += 1;
            }
        }
        stats
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root().dump())
    }
}

/// Node counts comparing two tree versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReuseStats {
    pub total: usize,
    pub reused: usize,
}

impl ReuseStats {
    /// Nodes built by the last parse
    pub fn fresh(&self) -> usize {
        self.total - self.reused
    }
}

/// Lazy walk over the error regions of a tree, pruning clean subtrees
#[derive(Clone)]
pub struct ErrorNodes {
    inner: Preorder,
}

impl Iterator for ErrorNodes {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        loop {
            let node = self.inner.next()?;
            if node.is_error_node() || node.is_missing() {
                self.inner.skip_subtree();
                return Some(node);
            }
            if !node.is_error() {
                self.inner.skip_subtree();
            }
        }
    }
}
