//! Property tests over generated inputs and edits

use proptest::prelude::*;
use treeloom::InputEdit;

use crate::helpers::grammar::{parse, parser};
use crate::helpers::tree_assertions::assert_coverage;

/// Text drawn mostly from the grammar's own alphabet
fn arb_source() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "([a-c] = [a-c0-9]( \\+ [a-c0-9])*;\n){0,6}",
        2 => "[a-c0-9=+;{}()\" /*\n]{0,48}",
    ]
}

/// A source and a replacement of one of its ranges
fn arb_edit() -> impl Strategy<Value = (String, u32, u32, String)> {
    arb_source().prop_flat_map(|source| {
        let len = source.len() as u32;
        (
            Just(source),
            0..=len,
            0..=len,
            "[a-c0-9=+;{}\" /*\n]{0,6}",
        )
            .prop_map(|(source, a, b, text)| (source, a.min(b), a.max(b), text))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Reparsing with the old tree gives the tree a fresh parse gives.
    #[test]
    fn prop_incremental_equals_fresh((source, start, end, text) in arb_edit()) {
        let parser = parser();
        let old = parser.parse(source.as_bytes(), None).unwrap();
        let (new_text, edit) = InputEdit::splice(source.as_bytes(), start, end, text.as_bytes());
        let incremental = parser.parse_with_edits(&new_text, Some(&old), &[edit]).unwrap();
        let fresh = parser.parse(&new_text, None).unwrap();
        prop_assert_eq!(incremental.to_sexp(), fresh.to_sexp());
        prop_assert_eq!(incremental.green(), fresh.green());
    }

    /// A no-op edit reproduces the original tree.
    #[test]
    fn prop_noop_edit_is_identity((source, start, _end, _text) in arb_edit()) {
        let parser = parser();
        let old = parser.parse(source.as_bytes(), None).unwrap();
        let edit = InputEdit::new(start, start, start);
        let again = parser.parse_with_edits(source.as_bytes(), Some(&old), &[edit]).unwrap();
        prop_assert_eq!(again.green(), old.green());
    }

    /// Child ranges tile their parent and the root covers the input.
    #[test]
    fn prop_children_cover_parent(source in arb_source()) {
        let tree = parse(source.as_bytes());
        assert_coverage(&tree, source.as_bytes());
    }

    /// Arbitrary bytes always produce a complete tree.
    #[test]
    fn prop_any_bytes_terminate(bytes in prop::collection::vec(any::<u8>(), 0..96)) {
        let tree = parse(&bytes);
        prop_assert!(!tree.is_partial());
        prop_assert_eq!(tree.root().end_byte() as usize, bytes.len());
    }
}
