//! Red nodes: positioned, parent-aware views over green nodes
//!
//! A [`SyntaxNode`] is created on demand while navigating and is cheap to
//! clone. Hidden nonterminals (names starting with `_`) are never returned;
//! their children are inlined into the nearest visible ancestor.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use text_size::{TextRange, TextSize};

use super::cursor::Preorder;
use super::edit::{InputEdit, MappedSpan, map_span};
use super::green::GreenNode;
use crate::language::{Language, SymbolId};

/// State shared by every node of one tree version
pub(crate) struct TreeContext {
    pub language: Arc<Language>,
    pub edits: Vec<InputEdit>,
}

#[derive(Clone)]
pub struct SyntaxNode(Arc<NodeData>);

struct NodeData {
    green: GreenNode,
    /// Raw parent, possibly hidden
    parent: Option<SyntaxNode>,
    index: u32,
    /// Start offset before any recorded edit
    offset: u32,
    ctx: Arc<TreeContext>,
}

impl SyntaxNode {
    pub(crate) fn new_root(green: GreenNode, ctx: Arc<TreeContext>) -> Self {
        Self(Arc::new(NodeData {
            green,
            parent: None,
            index: 0,
            offset: 0,
            ctx,
        }))
    }

    fn new_child(&self, green: GreenNode, index: usize, offset: u32) -> Self {
        Self(Arc::new(NodeData {
            green,
            parent: Some(self.clone()),
            index: index as u32,
            offset,
            ctx: self.0.ctx.clone(),
        }))
    }

    pub fn green(&self) -> &GreenNode {
        &self.0.green
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.0.ctx.language
    }

    // =========================================================================
    // Node properties
    // =========================================================================

    pub fn kind(&self) -> SymbolId {
        self.0.green.kind()
    }

    pub fn kind_name(&self) -> &str {
        self.language().symbol_name(self.kind())
    }

    pub fn is_named(&self) -> bool {
        self.language().is_named(self.kind())
    }

    pub fn is_extra(&self) -> bool {
        self.0.green.is_extra()
    }

    /// Damaged: an `ERROR` node, a missing token, or a node containing one
    pub fn is_error(&self) -> bool {
        self.0.green.has_error()
    }

    /// An `ERROR` node or unmatched input itself
    pub fn is_error_node(&self) -> bool {
        self.0.green.is_error()
    }

    pub fn is_missing(&self) -> bool {
        self.0.green.is_missing()
    }

    pub fn is_token(&self) -> bool {
        self.0.green.is_token()
    }

    /// Touched by an edit recorded on the tree since it was parsed
    pub fn has_changes(&self) -> bool {
        self.mapped().changed
    }

    // =========================================================================
    // Positions
    // =========================================================================

    fn mapped(&self) -> MappedSpan {
        let start = self.0.offset;
        let end = start + self.0.green.text_len();
        let extent_end = end + self.0.green.lookahead_bytes();
        map_span(&self.0.ctx.edits, start, end, extent_end)
    }

    pub fn start_byte(&self) -> u32 {
        self.mapped().start
    }

    pub fn end_byte(&self) -> u32 {
        let span = self.mapped();
        span.end.max(span.start)
    }

    pub fn byte_range(&self) -> Range<usize> {
        let span = self.mapped();
        span.start as usize..span.end.max(span.start) as usize
    }

    pub fn text_range(&self) -> TextRange {
        let span = self.mapped();
        TextRange::new(TextSize::new(span.start), TextSize::new(span.end.max(span.start)))
    }

    /// Bytes of the node in `source`, clamped to its length
    pub fn text<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        let range = self.byte_range();
        let end = range.end.min(source.len());
        &source[range.start.min(end)..end]
    }

    pub fn utf8_text<'s>(&self, source: &'s [u8]) -> Result<&'s str, std::str::Utf8Error> {
        std::str::from_utf8(self.text(source))
    }

    // =========================================================================
    // Raw navigation (hidden nodes included)
    // =========================================================================

    fn is_visible(&self) -> bool {
        self.0.parent.is_none() || !self.language().is_hidden(self.kind())
    }

    fn raw_parent(&self) -> Option<SyntaxNode> {
        self.0.parent.clone()
    }

    fn raw_first_child(&self) -> Option<SyntaxNode> {
        let green = self.0.green.children().first()?.clone();
        Some(self.new_child(green, 0, self.0.offset))
    }

    fn raw_last_child(&self) -> Option<SyntaxNode> {
        let children = self.0.green.children();
        let green = children.last()?.clone();
        let offset = self.0.offset + self.0.green.text_len() - green.text_len();
        Some(self.new_child(green, children.len() - 1, offset))
    }

    fn raw_next_sibling(&self) -> Option<SyntaxNode> {
        let parent = self.0.parent.as_ref()?;
        let index = self.0.index as usize + 1;
        let green = parent.0.green.children().get(index)?.clone();
        let offset = self.0.offset + self.0.green.text_len();
        Some(parent.new_child(green, index, offset))
    }

    fn raw_prev_sibling(&self) -> Option<SyntaxNode> {
        let parent = self.0.parent.as_ref()?;
        let index = (self.0.index as usize).checked_sub(1)?;
        let green = parent.0.green.children().get(index)?.clone();
        let offset = self.0.offset - green.text_len();
        Some(parent.new_child(green, index, offset))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn parent(&self) -> Option<SyntaxNode> {
        let mut node = self.raw_parent()?;
        while !node.is_visible() {
            node = node.raw_parent()?;
        }
        Some(node)
    }

    pub fn first_child(&self) -> Option<SyntaxNode> {
        forward(self.raw_first_child(), self.clone())
    }

    pub fn last_child(&self) -> Option<SyntaxNode> {
        backward(self.raw_last_child(), self.clone())
    }

    pub fn next_sibling(&self) -> Option<SyntaxNode> {
        if self.0.parent.is_none() {
            return None;
        }
        let parent = self.raw_parent()?;
        forward(self.raw_next_sibling(), parent)
    }

    pub fn prev_sibling(&self) -> Option<SyntaxNode> {
        if self.0.parent.is_none() {
            return None;
        }
        let parent = self.raw_parent()?;
        backward(self.raw_prev_sibling(), parent)
    }

    pub fn children(&self) -> Children {
        Children {
            next: self.first_child(),
        }
    }

    pub fn named_children(&self) -> impl Iterator<Item = SyntaxNode> {
        self.children().filter(SyntaxNode::is_named)
    }

    pub fn child_count(&self) -> usize {
        self.children().count()
    }

    pub fn child(&self, index: usize) -> Option<SyntaxNode> {
        self.children().nth(index)
    }

    /// First child with the given kind name
    pub fn child_by_kind(&self, name: &str) -> Option<SyntaxNode> {
        self.children().find(|child| child.kind_name() == name)
    }

    /// This node and all visible descendants in document order
    pub fn descendants(&self) -> Preorder {
        Preorder::new(self.clone())
    }

    /// Smallest node covering `start..end`, preferring named nodes
    pub fn descendant_for_byte_range(&self, start: u32, end: u32) -> Option<SyntaxNode> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = self.clone();
        'descend: loop {
            for child in node.children() {
                let covers = child.start_byte() <= start && end <= child.end_byte();
                let nonempty = child.start_byte() < child.end_byte() || start == end;
                if covers && nonempty && child.is_named() {
                    node = child;
                    continue 'descend;
                }
            }
            return Some(node);
        }
    }

    /// S-expression of the named structure, e.g. `(program (statement ...))`
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        enum Step {
            Open(SyntaxNode),
            Close,
        }

        let mut steps = vec![Step::Open(self.clone())];
        while let Some(step) = steps.pop() {
            let node = match step {
                Step::Open(node) => node,
                Step::Close => {
                    out.push(')');
                    continue;
                }
            };
            if !out.is_empty() {
                out.push(' ');
            }
            if node.is_missing() {
                out.push_str("(MISSING ");
                if node.is_named() {
                    out.push_str(node.kind_name());
                } else {
                    out.push_str(&format!("\"{}\"", node.kind_name()));
                }
                out.push(')');
                continue;
            }
            out.push('(');
            out.push_str(node.kind_name());
            steps.push(Step::Close);
            let shown: Vec<SyntaxNode> = node
                .children()
                .filter(|child| child.is_named() || child.is_missing())
                .collect();
            steps.extend(shown.into_iter().rev().map(Step::Open));
        }
    }

    /// Indented dump of every visible node with its range and marks
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for node in self.descendants() {
            let depth = node.depth_below(self);
            out.push_str(&"  ".repeat(depth));
            if node.is_named() {
                out.push_str(node.kind_name());
            } else {
                out.push_str(&format!("\"{}\"", node.kind_name()));
            }
            out.push_str(&format!("@{}..{}", node.start_byte(), node.end_byte()));
            if node.is_missing() {
                out.push_str(" MISSING");
            }
            if node.is_extra() {
                out.push_str(" extra");
            }
            if node.is_error() {
                out.push_str(" error");
            }
            out.push('\n');
        }
        out
    }

    fn depth_below(&self, ancestor: &SyntaxNode) -> usize {
        let mut depth = 0;
        let mut node = self.clone();
        while node != *ancestor {
            match node.parent() {
                Some(parent) => {
                    node = parent;
                    depth += 1;
                }
                None => break,
            }
        }
        depth
    }
}

/// First visible node at or after raw `node`, descending into hidden
/// nodes and climbing out of exhausted hidden parents, never past a
/// visible `parent`.
fn forward(mut node: Option<SyntaxNode>, mut parent: SyntaxNode) -> Option<SyntaxNode> {
    loop {
        match node {
            Some(current) => {
                if current.is_visible() {
                    return Some(current);
                }
                match current.raw_first_child() {
                    Some(child) => {
                        node = Some(child);
                        parent = current;
                    }
                    None => node = current.raw_next_sibling(),
                }
            }
            None => {
                if parent.is_visible() {
                    return None;
                }
                node = parent.raw_next_sibling();
                parent = parent.raw_parent()?;
            }
        }
    }
}

/// Mirror of [`forward`] walking right to left
fn backward(mut node: Option<SyntaxNode>, mut parent: SyntaxNode) -> Option<SyntaxNode> {
    loop {
        match node {
            Some(current) => {
                if current.is_visible() {
                    return Some(current);
                }
                match current.raw_last_child() {
                    Some(child) => {
                        node = Some(child);
                        parent = current;
                    }
                    None => node = current.raw_prev_sibling(),
                }
            }
            None => {
                if parent.is_visible() {
                    return None;
                }
                node = parent.raw_prev_sibling();
                parent = parent.raw_parent()?;
            }
        }
    }
}

/// Releases a chain of uniquely held ancestors one at a time.
impl Drop for NodeData {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            parent = match Arc::try_unwrap(node.0) {
                Ok(mut data) => data.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// Identity: same green node at the same place in the same tree version
impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        self.0.green.ptr_eq(&other.0.green)
            && self.0.offset == other.0.offset
            && Arc::ptr_eq(&self.0.ctx, &other.0.ctx)
    }
}

impl Eq for SyntaxNode {}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.kind_name(), self.start_byte(), self.end_byte())
    }
}

/// Visible children of a node, produced lazily
#[derive(Clone)]
pub struct Children {
    next: Option<SyntaxNode>,
}

impl Iterator for Children {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        let current = self.next.take()?;
        self.next = current.next_sibling();
        Some(current)
    }
}
