//! Incremental reparsing: results must equal a fresh parse

use rstest::rstest;
use tokio_util::sync::CancellationToken;
use treeloom::{InputEdit, ParseOptions};

use crate::helpers::fixtures::{ASSIGNMENTS, NESTED_BLOCKS, line_start, statements};
use crate::helpers::grammar::{parse, parser, reparse};
use crate::helpers::tree_assertions::{assert_coverage, named_kinds};

#[test]
fn test_one_character_edit_in_large_tree_rebuilds_one_statement() {
    let source = statements(700);
    let old = parse(source.as_bytes());
    let nodes = old.root().descendants().count();
    assert!(nodes >= 10_000, "only {nodes} nodes");

    // `v350 = v350 + 350;` becomes `v350 = v350 + 3510;`
    let at = line_start(&source, 350) + 16;
    let (text, incremental, fresh) = reparse(&old, source.as_bytes(), at, at, b"1");
    assert_eq!(incremental.green(), fresh.green());
    assert!(!incremental.has_error());

    let stats = incremental.reuse_stats(&old);
    // The root, the edited statement and its nodes are new; nothing else.
    assert!(stats.fresh() < 32, "{stats:?}");
    let edited = incremental
        .root()
        .descendant_for_byte_range(at, at + 1)
        .unwrap();
    assert_eq!(edited.utf8_text(&text).unwrap(), "3510");
}

#[rstest]
#[case::insert_statement(0, 0, "w = 0;\n")]
#[case::delete_statement(0, 7, "")]
#[case::replace_operator(11, 12, "+ 5 +")]
#[case::open_comment(7, 7, "/*")]
#[case::open_string(11, 11, "\"")]
#[case::break_statement(4, 5, "")]
#[case::join_tokens(1, 4, "")]
#[case::no_op(5, 5, "")]
fn test_edit_matches_fresh_parse(#[case] start: u32, #[case] end: u32, #[case] text: &str) {
    let old = parse(ASSIGNMENTS.as_bytes());
    let (new_text, incremental, fresh) =
        reparse(&old, ASSIGNMENTS.as_bytes(), start, end, text.as_bytes());
    assert_eq!(incremental.to_sexp(), fresh.to_sexp());
    assert_eq!(incremental.green(), fresh.green());
    assert_coverage(&incremental, &new_text);
}

#[test]
fn test_closing_a_comment_again() {
    let source = NESTED_BLOCKS.as_bytes();
    let old = parse(source);

    // Open a comment at the start of the second line; it now runs up to
    // the `*/` of the existing comment.
    let at = line_start(NESTED_BLOCKS, 1);
    let (opened, incremental, fresh) = reparse(&old, source, at, at, b"/*");
    assert_eq!(incremental.green(), fresh.green());
    assert_eq!(named_kinds(&incremental.root()), vec!["comment", "stmt"]);
    assert!(incremental.diagnostics(&opened).is_empty());

    // Remove it again.
    let (closed, restored, fresh) = reparse(&incremental, &opened, at, at + 2, b"");
    assert_eq!(closed, source);
    assert_eq!(restored.green(), fresh.green());
    assert_eq!(restored.green(), old.green());
}

#[test]
fn test_unterminated_string_edit_sequence() {
    let mut text = b"a = \"x\";\nb = 2;\n".to_vec();
    let mut tree = parse(&text);
    // Delete the closing quote, then put it back.
    for (start, end, replacement) in [(6u32, 7u32, &b""[..]), (6, 6, &b"\""[..])] {
        let (next, incremental, fresh) = reparse(&tree, &text, start, end, replacement);
        assert_eq!(incremental.green(), fresh.green());
        text = next;
        tree = incremental;
    }
    assert!(!tree.has_error());
}

#[test]
fn test_multiple_edits_in_one_reparse() {
    let parser = parser();
    let source = ASSIGNMENTS.as_bytes();
    let old = parser.parse(source, None).unwrap();
    let (step, first) = InputEdit::splice(source, 4, 5, b"10");
    let (text, second) = InputEdit::splice(&step, 0, 1, b"xx");
    let tree = parser
        .parse_with_edits(&text, Some(&old), &[first, second])
        .unwrap();
    assert_eq!(tree.green(), parser.parse(&text, None).unwrap().green());
}

#[test]
fn test_partial_tree_can_seed_next_parse() {
    let source = statements(50);
    let token = CancellationToken::new();
    token.cancel();
    let cancelled = parser().with_options(ParseOptions::default().with_cancellation(token));
    let partial = cancelled.parse(source.as_bytes(), None).unwrap();
    assert!(partial.is_partial());

    let complete = parser().parse(source.as_bytes(), Some(&partial)).unwrap();
    assert!(!complete.is_partial());
    assert_eq!(complete.green(), parse(source.as_bytes()).green());
}

#[test]
fn test_budget_partial_tree_then_full_parse() {
    let source = statements(100);
    let limited = parser().with_options(ParseOptions {
        check_interval: 16,
        ..ParseOptions::default().with_max_operations(200)
    });
    let partial = limited.parse(source.as_bytes(), None).unwrap();
    assert!(partial.is_partial());
    assert_coverage(&partial, source.as_bytes());

    let complete = parser().parse(source.as_bytes(), Some(&partial)).unwrap();
    assert_eq!(complete.green(), parse(source.as_bytes()).green());
}
