//! Tree queries over complete parses

use treeloom::SyntaxNode;

use crate::helpers::fixtures::{ASSIGNMENTS, NESTED_BLOCKS, line_start};
use crate::helpers::grammar::{parse, reparse};
use crate::helpers::tree_assertions::{assert_coverage, named_kinds};

#[test]
fn test_assignments_sexp() {
    let tree = parse(ASSIGNMENTS.as_bytes());
    assert!(!tree.has_error());
    assert_eq!(
        tree.to_sexp(),
        "(program \
         (stmt (identifier) (expr (number))) \
         (stmt (identifier) (expr (expr (identifier)) (expr (number)))) \
         (stmt (identifier) \
         (expr (expr (expr (expr (identifier)) (expr (identifier)))) (expr (string)))))"
    );
    assert_coverage(&tree, ASSIGNMENTS.as_bytes());
}

#[test]
fn test_nested_blocks_keep_comments() {
    let source = NESTED_BLOCKS.as_bytes();
    let tree = parse(source);
    assert!(!tree.has_error());
    assert_eq!(named_kinds(&tree.root()), vec!["stmt", "stmt", "comment", "stmt"]);

    let outer = tree
        .root()
        .named_children()
        .nth(1)
        .unwrap()
        .child_by_kind("block")
        .unwrap();
    assert_eq!(named_kinds(&outer), vec!["stmt", "comment", "stmt"]);
    assert_coverage(&tree, source);
}

#[test]
fn test_cursor_seek_then_restart_traversal() {
    let source = NESTED_BLOCKS;
    let tree = parse(source.as_bytes());
    let mut cursor = tree.walk();

    // `c` on the sixth line
    let offset = line_start(source, 5) + 8;
    assert!(cursor.seek(offset));
    let node = cursor.node();
    assert_eq!(node.kind_name(), "identifier");
    assert_eq!(node.utf8_text(source.as_bytes()).unwrap(), "c");
    let ancestors: Vec<String> = std::iter::successors(node.parent(), SyntaxNode::parent)
        .map(|ancestor| ancestor.kind_name().to_string())
        .collect();
    assert_eq!(ancestors, vec!["stmt", "block", "stmt", "block", "stmt", "program"]);

    let mut walk = cursor.preorder();
    let first: Vec<SyntaxNode> = walk.by_ref().collect();
    assert_eq!(first.len(), 1);
    walk.restart();
    assert_eq!(walk.collect::<Vec<_>>(), first);
}

#[test]
fn test_lazy_traversal_stops_early() {
    let tree = parse(ASSIGNMENTS.as_bytes());
    let first_number = tree
        .root()
        .descendants()
        .find(|node| node.kind_name() == "number")
        .unwrap();
    assert_eq!(first_number.start_byte(), 4);
}

#[test]
fn test_tree_shared_across_threads() {
    let tree = parse(ASSIGNMENTS.as_bytes());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tree = tree.clone();
            std::thread::spawn(move || tree.to_sexp())
        })
        .collect();
    let expected = tree.to_sexp();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_deeply_nested_parentheses() {
    let depth = 50_000;
    let mut source = b"a = ".to_vec();
    source.extend(std::iter::repeat_n(b'(', depth));
    source.push(b'x');
    source.extend(std::iter::repeat_n(b')', depth));
    source.push(b';');

    let tree = parse(&source);
    assert!(!tree.has_error());
    let sexp = tree.to_sexp();
    assert_eq!(sexp.matches("(expr").count(), depth + 1);
    assert!(sexp.ends_with(&format!("(identifier){}", ")".repeat(depth + 3))));

    let inner = 4 + depth as u32;
    let (text, incremental, fresh) = reparse(&tree, &source, inner, inner + 1, b"y");
    assert_eq!(text[inner as usize], b'y');
    assert_eq!(incremental.green(), fresh.green());
    drop(tree);
    drop(incremental);
    drop(fresh);
}
