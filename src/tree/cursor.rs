//! Tree cursor and lazy preorder traversal

use super::node::SyntaxNode;

/// Stateful walker over the visible nodes below a root.
///
/// The cursor never moves above the node it was created on.
#[derive(Clone)]
pub struct TreeCursor {
    root: SyntaxNode,
    current: SyntaxNode,
    depth: usize,
}

impl TreeCursor {
    pub fn new(node: SyntaxNode) -> Self {
        Self {
            root: node.clone(),
            current: node,
            depth: 0,
        }
    }

    pub fn node(&self) -> SyntaxNode {
        self.current.clone()
    }

    /// Depth below the cursor's root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Restart at `node`, which becomes the new root.
    pub fn reset(&mut self, node: SyntaxNode) {
        self.root = node.clone();
        self.current = node;
        self.depth = 0;
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.current.first_child() {
            Some(child) => {
                self.current = child;
                self.depth += 1;
                true
            }
            None => false,
        }
    }

    pub fn goto_last_child(&mut self) -> bool {
        match self.current.last_child() {
            Some(child) => {
                self.current = child;
                self.depth += 1;
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        match self.current.next_sibling() {
            Some(sibling) => {
                self.current = sibling;
                true
            }
            None => false,
        }
    }

    pub fn goto_prev_sibling(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        match self.current.prev_sibling() {
            Some(sibling) => {
                self.current = sibling;
                true
            }
            None => false,
        }
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        match self.current.parent() {
            Some(parent) => {
                self.current = parent;
                self.depth -= 1;
                true
            }
            None => false,
        }
    }

    /// Move to the first child whose range extends past `byte`; returns
    /// its index among the visible children.
    pub fn goto_first_child_for_byte(&mut self, byte: u32) -> Option<usize> {
        let (index, child) = self
            .current
            .children()
            .enumerate()
            .find(|(_, child)| child.end_byte() > byte)?;
        self.current = child;
        self.depth += 1;
        Some(index)
    }

    /// Jump to the deepest node containing `byte`, starting over from the
    /// root. Returns false when `byte` lies outside the root.
    pub fn seek(&mut self, byte: u32) -> bool {
        self.current = self.root.clone();
        self.depth = 0;
        if byte < self.root.start_byte() || byte >= self.root.end_byte() {
            return false;
        }
        while let Some(child) = self
            .current
            .children()
            .find(|child| child.start_byte() <= byte && byte < child.end_byte())
        {
            self.current = child;
            self.depth += 1;
        }
        true
    }

    /// Remaining traversal from the current node, in document order
    pub fn preorder(&self) -> Preorder {
        Preorder::new(self.current.clone())
    }
}

/// Lazy preorder iterator; [`Preorder::restart`] rewinds it.
#[derive(Clone)]
pub struct Preorder {
    cursor: TreeCursor,
    started: bool,
    done: bool,
    /// The cursor already sits on the node to yield next
    pending: bool,
}

impl Preorder {
    pub fn new(root: SyntaxNode) -> Self {
        Self {
            cursor: TreeCursor::new(root),
            started: false,
            done: false,
            pending: false,
        }
    }

    pub fn restart(&mut self) {
        let root = self.cursor.root.clone();
        self.cursor.reset(root);
        self.started = false;
        self.done = false;
        self.pending = false;
    }

    /// Skip the children of the node returned last
    pub fn skip_subtree(&mut self) {
        if !self.started || self.done || self.pending {
            return;
        }
        self.pending = self.advance_past_current();
    }

    fn advance_past_current(&mut self) -> bool {
        loop {
            if self.cursor.goto_next_sibling() {
                return true;
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                return false;
            }
        }
    }
}

impl Iterator for Preorder {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.cursor.node());
        }
        if self.pending {
            self.pending = false;
            return Some(self.cursor.node());
        }
        if self.cursor.goto_first_child() || self.advance_past_current() {
            return Some(self.cursor.node());
        }
        None
    }
}
