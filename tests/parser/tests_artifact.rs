//! Loading compiled grammars from disk

use std::sync::Arc;

use treeloom::{LANGUAGE_VERSION, Language, LanguageError, ParseError, Parser};

use crate::helpers::fixtures::ASSIGNMENTS;
use crate::helpers::grammar::{build, parse};

#[test]
fn test_loaded_artifact_parses_like_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statements.json");
    build("statements").save(&path).unwrap();

    let loaded = Parser::new(Arc::new(Language::load(&path).unwrap())).unwrap();
    let tree = loaded.parse(ASSIGNMENTS.as_bytes(), None).unwrap();
    assert_eq!(tree.to_sexp(), parse(ASSIGNMENTS.as_bytes()).to_sexp());
}

#[test]
fn test_newer_artifact_is_refused_before_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.json");
    let mut json: serde_json::Value =
        serde_json::from_str(&build("statements").to_json().unwrap()).unwrap();
    json["version"] = serde_json::json!(LANGUAGE_VERSION + 1);
    std::fs::write(&path, json.to_string()).unwrap();

    match Language::load(&path) {
        Err(LanguageError::VersionMismatch { expected, found }) => {
            assert_eq!(expected, LANGUAGE_VERSION);
            assert_eq!(found, LANGUAGE_VERSION + 1);
        }
        other => panic!("expected version mismatch, got {other:?}"),
    }
}

#[test]
fn test_corrupt_artifact_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.json");
    let mut json: serde_json::Value =
        serde_json::from_str(&build("statements").to_json().unwrap()).unwrap();
    json["state_count"] = serde_json::json!(1);
    std::fs::write(&path, json.to_string()).unwrap();

    let err = Language::load(&path).unwrap_err();
    assert!(matches!(err, LanguageError::Malformed(_)), "{err}");
}

#[test]
fn test_old_tree_must_come_from_same_grammar() {
    let other = Parser::new(Arc::new(build("other"))).unwrap();
    let old = other.parse(b"x = 1;", None).unwrap();
    let result = crate::helpers::grammar::parser().parse(b"x = 1;", Some(&old));
    assert!(matches!(result, Err(ParseError::LanguageMismatch { .. })));
}
