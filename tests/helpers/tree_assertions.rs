//! Structural checks shared by several test groups

use treeloom::{SyntaxNode, SyntaxTree};

/// Children are contiguous, never overlap and exactly cover their parent;
/// the root covers the whole input.
pub fn assert_coverage(tree: &SyntaxTree, source: &[u8]) {
    let root = tree.root();
    assert_eq!(root.start_byte(), 0, "root starts at 0");
    if !tree.is_partial() {
        assert_eq!(root.end_byte() as usize, source.len(), "root covers input");
    }
    for node in root.descendants() {
        assert_children_cover(&node);
    }
}

fn assert_children_cover(node: &SyntaxNode) {
    let mut offset = node.start_byte();
    let mut any = false;
    for child in node.children() {
        assert_eq!(
            child.start_byte(),
            offset,
            "gap or overlap before {child:?} in {node:?}"
        );
        offset = child.end_byte();
        any = true;
    }
    if any {
        assert_eq!(offset, node.end_byte(), "children of {node:?} stop short");
    }
}

/// Kind names of the named children of `node`
pub fn named_kinds(node: &SyntaxNode) -> Vec<String> {
    node.named_children()
        .map(|child| child.kind_name().to_string())
        .collect()
}
