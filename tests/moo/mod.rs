//! The bundled MOO grammar end to end

use rstest::rstest;
use treeloom::{InputEdit, Parser, moo};

use crate::helpers::tree_assertions::{assert_coverage, named_kinds};

const VERB: &str = r#"// Greet everyone in the room
count = 0;
for who in (this.location.contents)
  if (is_player(who) && who != player)
    who:tell("Hello from ", player.name, "!");
    count = count + 1;
  elseif (who == player)
    continue;
  endif
endfor
try
  result = $string_utils:english_list(names[1..$]);
except e (E_RANGE, E_TYPE)
  result = "nobody";
finally
  /* always runs */
  notify(player, tostr(count));
endtry
return count > 0 ? result | 0;
"#;

fn parser() -> Parser {
    Parser::new(moo::language().unwrap()).unwrap()
}

#[test]
fn test_verb_parses_cleanly() {
    let tree = parser().parse(VERB.as_bytes(), None).unwrap();
    assert!(!tree.has_error(), "{}", tree.root().dump());
    assert_eq!(
        named_kinds(&tree.root()),
        vec![
            "comment",
            "expression_statement",
            "for_statement",
            "try_statement",
            "return_statement"
        ]
    );
    assert_coverage(&tree, VERB.as_bytes());
}

#[rstest]
#[case::edit_string_content("Hello", "Howdy")]
#[case::open_string("count = 0;", "count = \"0;")]
#[case::break_keyword("endfor", "endfo")]
#[case::close_comment_early("always runs", "always */ runs")]
#[case::remove_semicolon("count + 1;", "count + 1")]
#[case::rename_identifier("result", "outcome")]
fn test_edits_match_fresh_parse(#[case] find: &str, #[case] replace: &str) {
    let parser = parser();
    let source = VERB.as_bytes();
    let old = parser.parse(source, None).unwrap();

    let start = VERB.find(find).unwrap() as u32;
    let end = start + find.len() as u32;
    let (text, edit) = InputEdit::splice(source, start, end, replace.as_bytes());
    let incremental = parser.parse(&text, Some(&old.edit(&edit))).unwrap();
    let fresh = parser.parse(&text, None).unwrap();
    assert_eq!(incremental.to_sexp(), fresh.to_sexp());
    assert_eq!(incremental.green(), fresh.green());
}

#[test]
fn test_string_edit_reuses_the_rest_of_the_verb() {
    let parser = parser();
    let source = VERB.as_bytes();
    let old = parser.parse(source, None).unwrap();
    let start = VERB.find("nobody").unwrap() as u32;
    let (text, edit) = InputEdit::splice(source, start, start + 6, b"no one");
    let new = parser.parse(&text, Some(&old.edit(&edit))).unwrap();
    let stats = new.reuse_stats(&old);
    assert!(stats.reused * 2 > stats.total, "{stats:?}");
    assert!(!new.has_error());
}

#[test]
fn test_artifact_roundtrip_of_bundled_grammar() {
    let language = moo::language().unwrap();
    let json = language.to_json().unwrap();
    let decoded = treeloom::Language::from_json(&json).unwrap();
    assert_eq!(&decoded, language.as_ref());
}

const OBJECT: &str = r#"object greeter
  name: "Greeter"
  property greeting (owner: #2) = "Hello";
  verb greet (this none this)
    owner: #2
    player:tell(this.greeting);
  endverb
endobject
"#;

#[test]
fn test_object_definition_parses_cleanly() {
    let tree = parser().parse(OBJECT.as_bytes(), None).unwrap();
    assert!(!tree.has_error(), "{}", tree.root().dump());
    assert_eq!(named_kinds(&tree.root()), vec!["object_definition"]);
    assert_coverage(&tree, OBJECT.as_bytes());
}

#[rstest]
#[case::rename_verb("greet (", "wave (")]
#[case::receiver_named_like_a_keyword("player:tell", "verb:tell")]
#[case::attribute_becomes_statement("owner: #2\n    player", "owner:tell();\n    player")]
#[case::drop_endverb("  endverb\n", "")]
#[case::property_becomes_assignment("property greeting", "greeting")]
fn test_object_edits_match_fresh_parse(#[case] find: &str, #[case] replace: &str) {
    let parser = parser();
    let source = OBJECT.as_bytes();
    let old = parser.parse(source, None).unwrap();

    let start = OBJECT.find(find).unwrap() as u32;
    let end = start + find.len() as u32;
    let (text, edit) = InputEdit::splice(source, start, end, replace.as_bytes());
    let incremental = parser.parse(&text, Some(&old.edit(&edit))).unwrap();
    let fresh = parser.parse(&text, None).unwrap();
    assert_eq!(incremental.to_sexp(), fresh.to_sexp());
    assert_eq!(incremental.green(), fresh.green());
}
