#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use rstest::rstest;
use text_size::{TextRange, TextSize};

use super::recovery::{RecoveryInput, first_viable_depth, plan};
use super::stack::Stack;
use super::*;
use crate::errors::{ErrorCode, Severity};
use crate::generate::GrammarBuilder;
use crate::language::DelimiterKind;

/// Assignments and `{ ... }` blocks
fn build(name: &str) -> Language {
    let mut g = GrammarBuilder::new(name);
    let ident = g.token("identifier", r"[a-z]+");
    let number = g.token("number", r"\d+");
    let eq = g.literal("=");
    let plus = g.literal("+");
    let semi = g.literal(";");
    let open = g.literal("{");
    let close = g.literal("}");
    let ws = g.anonymous_token("whitespace", r"\s+");
    let comment = g.token("comment", r"#[^\n]*");
    g.extra(ws).extra(comment);
    g.sync(&[semi, close])
        .terminator(&[semi])
        .delimiter(DelimiterKind::Brace, open, close);

    let program = g.nonterminal("program");
    let statements = g.nonterminal("_statements");
    let statement = g.nonterminal("statement");
    let block = g.nonterminal("block");
    let expr = g.nonterminal("expr");
    g.rule(program, &[statements]);
    g.rule(statements, &[statement]);
    g.rule(statements, &[statements, statement]);
    g.rule(statement, &[ident, eq, expr, semi]);
    g.rule(statement, &[block]);
    g.rule(block, &[open, statements, close]);
    g.rule(expr, &[expr, plus, expr]);
    g.rule(expr, &[ident]);
    g.rule(expr, &[number]);
    g.left(1, &[plus]);
    g.start(program);
    g.build().unwrap()
}

fn language() -> Arc<Language> {
    Arc::new(build("blocks"))
}

fn parser() -> Parser {
    Parser::new(language()).unwrap()
}

fn symbol(language: &Language, name: &str) -> SymbolId {
    language
        .symbol_for_name(name, true)
        .or_else(|| language.symbol_for_name(name, false))
        .unwrap()
}

/// Automaton states after feeding `symbols` from the start state
fn drive(language: &Language, names: &[&str]) -> Vec<StateId> {
    let mut states = vec![language.start_state()];
    for name in names {
        let lookahead = symbol(language, name);
        loop {
            let top = *states.last().unwrap();
            match language.action(top, lookahead) {
                Some(Action::Shift(next)) => {
                    states.push(next);
                    break;
                }
                Some(Action::Reduce(rule)) => {
                    let info = language.rule(rule).unwrap();
                    states.truncate(states.len() - info.len as usize);
                    let below = *states.last().unwrap();
                    states.push(language.goto(below, info.lhs).unwrap());
                }
                other => panic!("`{name}` cannot follow: {other:?}"),
            }
        }
    }
    states
}

fn many_statements(count: usize) -> Vec<u8> {
    let mut source = Vec::new();
    for i in 0..count {
        source.extend_from_slice(format!("v = v + {i};\n").as_bytes());
    }
    source
}

// ============================================================================
// Stack
// ============================================================================

fn leaf(kind: u16, start: u32, end: u32) -> GreenNode {
    let token = Token {
        kind: SymbolId(kind),
        start,
        end,
        lex_state_before: LexState::DEFAULT,
        lex_state_after: LexState::DEFAULT,
        lookahead_end: end,
        contextual: false,
    };
    GreenNode::token(&token, 0, false)
}

fn extra(start: u32, end: u32) -> GreenNode {
    let token = Token {
        kind: SymbolId(9),
        start,
        end,
        lex_state_before: LexState::DEFAULT,
        lex_state_after: LexState::DEFAULT,
        lookahead_end: end,
        contextual: false,
    };
    GreenNode::token(&token, 0, true)
}

/// `a ws b ws` with states 1 and 2
fn sample_stack() -> Stack {
    let mut stack = Stack::new(0);
    stack.push(leaf(2, 0, 1), 1, 0);
    stack.push_extra(extra(1, 2), 1);
    stack.push(leaf(3, 2, 3), 2, 2);
    stack.push_extra(extra(3, 4), 3);
    stack
}

#[test]
fn test_stack_extras_keep_state() {
    let mut stack = sample_stack();
    assert_eq!(stack.state(), 2);
    assert_eq!(stack.states(), vec![0, 1, 2]);
    assert_eq!(stack.end(), 4);
    assert_eq!(stack.take_all().len(), 4);
}

#[test]
fn test_stack_popped_bytes_count_extras() {
    let stack = sample_stack();
    assert_eq!(stack.popped_bytes(4), vec![0, 2, 4]);
    assert_eq!(stack.popped_bytes(1), vec![0, 2]);
}

#[test]
fn test_stack_pop_children_sets_trailing_extras_aside() {
    let mut stack = sample_stack();
    let popped = stack.pop_children(2).unwrap();
    assert_eq!(popped.children.len(), 3);
    assert!(popped.children[1].is_extra());
    assert_eq!(popped.trailing.len(), 1);
    assert_eq!(popped.trailing[0].start, 3);
    assert_eq!(stack.state(), 0);
}

#[test]
fn test_stack_pop_children_zero_keeps_nodes() {
    let mut stack = sample_stack();
    let popped = stack.pop_children(0).unwrap();
    assert!(popped.children.is_empty());
    assert_eq!(popped.trailing.len(), 1);
    assert_eq!(stack.take_all().len(), 3);
}

#[test]
fn test_stack_underflow_leaves_stack_untouched() {
    let mut stack = sample_stack();
    assert!(stack.pop_children(3).is_none());
    assert_eq!(stack.pop_frames(5).len(), 4);
    assert_eq!(stack.state(), 0);
}

// ============================================================================
// Recovery planning
// ============================================================================

#[test]
fn test_plan_inserts_missing_operand() {
    let language = build("blocks");
    let states = drive(&language, &["identifier", "=", "number", "+"]);
    let ident = symbol(&language, "identifier");
    let input = RecoveryInput {
        states: &states,
        popped_bytes: &[0, 1, 3, 5, 7],
        token: symbol(&language, ";"),
        token_len: 1,
        next: ident,
    };
    let chosen = plan(&language, &RecoveryConfig::default(), &input);
    assert_eq!(
        chosen,
        RecoveryPlan::Pop {
            depth: 0,
            missing: Some(ident)
        }
    );
    // Same inputs, same plan.
    assert_eq!(plan(&language, &RecoveryConfig::default(), &input), chosen);
}

#[test]
fn test_plan_prefers_delete_on_tie() {
    let language = build("blocks");
    let states = drive(&language, &["identifier", "="]);
    let input = RecoveryInput {
        states: &states,
        popped_bytes: &[0, 1, 2],
        token: symbol(&language, "="),
        token_len: 1,
        next: symbol(&language, "number"),
    };
    assert_eq!(
        plan(&language, &RecoveryConfig::default(), &input),
        RecoveryPlan::Delete
    );
}

#[test]
fn test_plan_costs_are_configurable() {
    let language = build("blocks");
    let states = drive(&language, &["identifier", "=", "number", "+"]);
    let input = RecoveryInput {
        states: &states,
        popped_bytes: &[0, 2, 4, 6, 8],
        token: symbol(&language, ";"),
        token_len: 1,
        next: symbol(&language, "identifier"),
    };
    let config = RecoveryConfig {
        missing_cost: 1000,
        ..RecoveryConfig::default()
    };
    assert_eq!(plan(&language, &config, &input), RecoveryPlan::Delete);
}

#[test]
fn test_plan_panics_without_candidates() {
    let language = build("blocks");
    let states = vec![language.start_state()];
    let input = RecoveryInput {
        states: &states,
        popped_bytes: &[0],
        token: symbol(&language, ";"),
        token_len: 1,
        next: SymbolId::END,
    };
    assert_eq!(
        plan(&language, &RecoveryConfig::default(), &input),
        RecoveryPlan::Panic
    );
}

#[test]
fn test_plan_respects_attempt_budget() {
    let language = build("blocks");
    let states = drive(&language, &["identifier", "=", "number", "+"]);
    let input = RecoveryInput {
        states: &states,
        popped_bytes: &[0, 1, 3, 5, 7],
        token: symbol(&language, ";"),
        token_len: 1,
        next: symbol(&language, "identifier"),
    };
    let config = RecoveryConfig {
        max_attempts: 0,
        ..RecoveryConfig::default()
    };
    assert_eq!(plan(&language, &config, &input), RecoveryPlan::Panic);
}

#[test]
fn test_first_viable_depth() {
    let language = build("blocks");
    let config = RecoveryConfig::default();
    let states = drive(&language, &["identifier", "=", "number", "+"]);
    let semi = symbol(&language, ";");
    let ident = symbol(&language, "identifier");
    assert_eq!(first_viable_depth(&language, &config, &states, ident), Some(0));
    assert_eq!(first_viable_depth(&language, &config, &states, semi), Some(1));
}

// ============================================================================
// Parser
// ============================================================================

#[test]
fn test_new_rejects_version_mismatch() {
    let mut language = build("blocks");
    language.version = LANGUAGE_VERSION + 1;
    match Parser::new(Arc::new(language)) {
        Err(ParseError::InvalidLanguage(LanguageError::VersionMismatch { expected, found })) => {
            assert_eq!(expected, LANGUAGE_VERSION);
            assert_eq!(found, LANGUAGE_VERSION + 1);
        }
        other => panic!("expected version mismatch, got {other:?}"),
    }
}

#[test]
fn test_old_tree_from_other_grammar_is_rejected() {
    let other = Parser::new(Arc::new(build("other"))).unwrap();
    let old = other.parse(b"a = 1;", None).unwrap();
    let err = parser().parse(b"a = 1;", Some(&old)).unwrap_err();
    assert!(matches!(err, ParseError::LanguageMismatch { .. }));
    assert!(err.to_string().contains("`other`"));
}

#[test]
fn test_old_tree_from_equal_grammar_is_accepted() {
    let old = Parser::new(language()).unwrap().parse(b"a = 1;", None).unwrap();
    let tree = parser().parse(b"a = 1;", Some(&old)).unwrap();
    assert!(!tree.has_error());
}

#[test]
fn test_missing_semicolon_at_end() {
    let tree = parser().parse(b"a = 1", None).unwrap();
    assert_eq!(
        tree.to_sexp(),
        "(program (statement (identifier) (expr (number)) (MISSING \";\")))"
    );
    assert!(!tree.is_partial());
}

#[test]
fn test_deleted_token_becomes_error_node() {
    let tree = parser().parse(b"a = = 1;", None).unwrap();
    assert_eq!(
        tree.to_sexp(),
        "(program (statement (identifier) (ERROR) (expr (number))))"
    );
}

#[test]
fn test_recovery_is_deterministic() {
    let source = b"a = 1 + ;\n{ b = = 2;\n} } c = 3";
    let first = parser().parse(source, None).unwrap();
    let second = parser().parse(source, None).unwrap();
    assert_eq!(first.to_sexp(), second.to_sexp());
    assert_eq!(first.green(), second.green());
    assert_eq!(first.root().end_byte() as usize, source.len());
}

#[test]
fn test_options_roundtrip_through_json() {
    let options: ParseOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options.check_interval, 128);
    assert_eq!(options.recovery, RecoveryConfig::default());
    assert!(options.max_operations.is_none());

    let options: ParseOptions =
        serde_json::from_str(r#"{"recovery": {"missing_cost": 7}, "max_operations": 10}"#).unwrap();
    assert_eq!(options.recovery.missing_cost, 7);
    assert_eq!(options.recovery.skipped_tree_cost, 100);
    assert_eq!(options.max_operations, Some(10));
}

#[test]
fn test_options_are_replaceable() {
    let mut parser = parser().with_options(ParseOptions::default().with_max_operations(5));
    assert_eq!(parser.options().max_operations, Some(5));
    parser.set_options(ParseOptions::default());
    assert!(parser.options().max_operations.is_none());
    assert_eq!(parser.language().name(), "blocks");
}

// ============================================================================
// Cancellation and budget
// ============================================================================

#[test]
fn test_cancelled_parse_returns_partial_tree() {
    let token = CancellationToken::new();
    token.cancel();
    let parser = parser().with_options(ParseOptions::default().with_cancellation(token));
    let tree = parser.parse(b"a = 1;", None).unwrap();
    assert!(tree.is_partial());
    assert!(tree.root().is_error_node());
    let diagnostics = tree.diagnostics(b"a = 1;");
    let stopped = diagnostics.last().unwrap();
    assert_eq!(stopped.code, ErrorCode::E0999);
    assert_eq!(stopped.severity, Severity::Warning);
}

#[test]
fn test_operation_budget_stops_early() {
    let source = many_statements(200);
    let parser = parser().with_options(ParseOptions {
        check_interval: 1,
        ..ParseOptions::default().with_max_operations(50)
    });
    let tree = parser.parse(&source, None).unwrap();
    assert!(tree.is_partial());
    assert!(tree.has_error());
    assert!((tree.root().end_byte() as usize) < source.len());
}

#[test]
fn test_generous_budget_completes() {
    let source = many_statements(20);
    let limited = parser().with_options(ParseOptions::default().with_max_operations(1_000_000));
    let tree = limited.parse(&source, None).unwrap();
    assert!(!tree.is_partial());
    assert_eq!(tree.to_sexp(), parser().parse(&source, None).unwrap().to_sexp());
}

// ============================================================================
// Incremental parsing
// ============================================================================

#[test]
fn test_incremental_matches_fresh_parse() {
    let parser = parser();
    let source = many_statements(100);
    let old = parser.parse(&source, None).unwrap();

    let half = source.len() / 2;
    let at = source[..half].iter().rposition(|&b| b == b'\n').unwrap() as u32 + 1;
    let (edited, edit) = InputEdit::splice(&source, at, at, b"w = 5;\n");
    let new = parser.parse(&edited, Some(&old.edit(&edit))).unwrap();
    let fresh = parser.parse(&edited, None).unwrap();

    assert_eq!(new.green(), fresh.green());
    assert_eq!(new.to_sexp(), fresh.to_sexp());
    let stats = new.reuse_stats(&old);
    assert!(stats.reused > stats.total / 2, "{stats:?}");
}

#[test]
fn test_parse_with_edits_applies_them() {
    let parser = parser();
    let source = b"a = 1;\nb = 2;".to_vec();
    let old = parser.parse(&source, None).unwrap();
    let (edited, edit) = InputEdit::splice(&source, 11, 12, b"x + 3");
    let new = parser.parse_with_edits(&edited, Some(&old), &[edit]).unwrap();
    assert_eq!(new.green(), parser.parse(&edited, None).unwrap().green());
}

#[test]
fn test_fixing_an_error_incrementally() {
    let parser = parser();
    let source = b"a = 1 + ;\nb = 2;".to_vec();
    let old = parser.parse(&source, None).unwrap();
    assert!(old.has_error());

    let (edited, edit) = InputEdit::splice(&source, 8, 8, b"4");
    let new = parser.parse(&edited, Some(&old.edit(&edit))).unwrap();
    assert!(!new.has_error());
    assert_eq!(new.green(), parser.parse(&edited, None).unwrap().green());
}

#[test]
fn test_keyword_read_as_word_is_not_reused() {
    let token = Token {
        kind: SymbolId(2),
        start: 0,
        end: 4,
        lex_state_before: LexState::DEFAULT,
        lex_state_after: LexState::DEFAULT,
        lookahead_end: 4,
        contextual: true,
    };
    let candidate = |node: GreenNode| Candidate {
        node,
        start: 0,
        end: 4,
        changed: false,
    };
    let word = candidate(GreenNode::token(&token, 0, false));
    assert_eq!(
        word.rejection(LexState::DEFAULT),
        Some("starts with a contextual keyword")
    );
    assert_eq!(candidate(leaf(2, 0, 4)).rejection(LexState::DEFAULT), None);
}

#[test]
fn test_unchanged_reparse_reuses_everything_below_root() {
    let parser = parser();
    let source = many_statements(30);
    let old = parser.parse(&source, None).unwrap();
    let new = parser.parse(&source, Some(&old)).unwrap();
    assert_eq!(new.green(), old.green());
    let stats = new.reuse_stats(&old);
    assert!(stats.fresh() <= 2, "{stats:?}");
}

// ============================================================================
// Diagnostics
// ============================================================================

#[rstest]
#[case(b"a = 1".as_slice(), ErrorCode::E0201, "missing `;`", 5, 5)]
#[case(b"a = = 1;".as_slice(), ErrorCode::E0901, "unexpected `=`", 4, 5)]
#[case(b"a = 1; @".as_slice(), ErrorCode::E0101, "invalid character `@`", 7, 8)]
#[case(b"{ a = 1;".as_slice(), ErrorCode::E0202, "missing `}`", 8, 8)]
fn test_diagnostics(
    #[case] source: &[u8],
    #[case] code: ErrorCode,
    #[case] message: &str,
    #[case] start: u32,
    #[case] end: u32,
) {
    let tree = parser().parse(source, None).unwrap();
    let diagnostics = tree.diagnostics(source);
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    let error = &diagnostics[0];
    assert_eq!(error.code, code);
    assert_eq!(error.message, message);
    assert_eq!(error.range, TextRange::new(TextSize::new(start), TextSize::new(end)));
}

#[test]
fn test_unclosed_block_points_at_opener() {
    let source = b"{ a = 1;";
    let tree = parser().parse(source, None).unwrap();
    let error = &tree.diagnostics(source)[0];
    assert_eq!(error.related.len(), 1);
    assert_eq!(error.related[0].message, "`{` opened here");
    assert_eq!(error.related[0].range, TextRange::new(TextSize::new(0), TextSize::new(1)));
}

#[test]
fn test_clean_tree_has_no_diagnostics() {
    let source = b"{ a = 1; }\nb = a;";
    let tree = parser().parse(source, None).unwrap();
    assert!(tree.diagnostics(source).is_empty());
}
