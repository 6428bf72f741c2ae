//! Error recovery scenarios

use rstest::rstest;
use treeloom::ErrorCode;

use crate::helpers::fixtures::MISSING_OPERAND;
use crate::helpers::grammar::parse;
use crate::helpers::tree_assertions::assert_coverage;

#[test]
fn test_missing_operand_is_inserted() {
    let source = MISSING_OPERAND.as_bytes();
    let tree = parse(source);
    assert_eq!(
        tree.to_sexp(),
        "(program (stmt (identifier) (expr (expr (number)) (expr (MISSING identifier)))))"
    );

    let stmt = tree.root().child(0).unwrap();
    assert_eq!(stmt.kind_name(), "stmt");
    assert_eq!(stmt.byte_range(), 0..source.len());

    // `1 + ` is a damaged expression ending in the placeholder.
    let expr = stmt.child_by_kind("expr").unwrap();
    assert!(expr.is_error());
    assert_eq!(expr.utf8_text(source).unwrap(), "1 + ");
    let placeholder = expr.last_child().unwrap().first_child().unwrap();
    assert!(placeholder.is_missing());
    assert_eq!(placeholder.start_byte(), 8);

    // The semicolon is an ordinary leaf.
    let semi = stmt.last_child().unwrap();
    assert_eq!(semi.kind_name(), ";");
    assert!(!semi.is_error());
    assert!(!semi.is_missing());
}

#[rstest]
#[case("x = 1", ErrorCode::E0201)]
#[case("x = (1;", ErrorCode::E0203)]
#[case("{ x = 1;", ErrorCode::E0202)]
#[case("x = 1 ? 2;", ErrorCode::E0101)]
#[case("x = = 1;", ErrorCode::E0901)]
#[case("x = 1; }", ErrorCode::E0205)]
#[case("x = 1; /* open", ErrorCode::E0103)]
fn test_first_diagnostic_code(#[case] source: &str, #[case] code: ErrorCode) {
    let tree = parse(source.as_bytes());
    let diagnostics = tree.diagnostics(source.as_bytes());
    assert!(
        diagnostics.iter().any(|error| error.code == code),
        "{diagnostics:?}"
    );
    assert_coverage(&tree, source.as_bytes());
}

#[test]
fn test_recovery_keeps_later_statements() {
    let source = b"a = 1 + ;\nb = = 2;\nc = 3;";
    let tree = parse(source);
    let stmts: Vec<_> = tree
        .root()
        .named_children()
        .filter(|node| node.kind_name() == "stmt")
        .collect();
    assert_eq!(stmts.len(), 3);
    assert!(!stmts[2].is_error());
    assert_eq!(stmts[2].utf8_text(source).unwrap(), "c = 3;");
}

#[test]
fn test_panic_mode_skips_to_sync_token() {
    let source = b"a = 1;\n) ) ) ;\nb = 2;";
    let tree = parse(source);
    let errors: Vec<_> = tree.errors().collect();
    assert!(!errors.is_empty());
    let last = tree.root().last_child().unwrap();
    assert_eq!(last.utf8_text(source).unwrap(), "b = 2;");
    assert!(!last.is_error());
    assert_coverage(&tree, source);
}

#[test]
fn test_invalid_bytes_only() {
    let source = b"@#$`";
    let tree = parse(source);
    assert!(tree.has_error());
    assert!(!tree.is_partial());
    assert_coverage(&tree, source);
}

#[test]
fn test_empty_input_is_empty_program() {
    let tree = parse(b"");
    assert_eq!(tree.to_sexp(), "(program)");
    assert!(!tree.has_error());
}

#[test]
fn test_diagnostics_report_line_and_column() {
    let source = "a = 1;\nb = 2";
    let tree = parse(source.as_bytes());
    let index = treeloom::LineIndex::new(source.as_bytes());
    let error = &tree.diagnostics(source.as_bytes())[0];
    let span = error.span(&index);
    assert_eq!(span.start.line, 1);
    assert_eq!(span.start.column, 5);
}
