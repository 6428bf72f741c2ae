//! Statement grammar used across the integration tests
//!
//! ```text
//! program := stmt*
//! stmt    := IDENT '=' expr ';' | '{' stmt+ '}'
//! expr    := expr '+' expr | '(' expr ')' | IDENT | NUMBER | STRING
//! ```

use std::sync::{Arc, LazyLock};

use treeloom::generate::opt;
use treeloom::language::DelimiterKind;
use treeloom::{GrammarBuilder, InputEdit, Language, Parser, SyntaxTree};

static LANGUAGE: LazyLock<Arc<Language>> = LazyLock::new(|| Arc::new(build("statements")));

pub fn build(name: &str) -> Language {
    let mut g = GrammarBuilder::new(name);
    let ident = g.token("identifier", r"[a-z_][a-z0-9_]*");
    let number = g.token("number", r"\d+");
    let string = g.token("string", r#""([^"\\\n]|\\.)*""#);
    let eq = g.literal("=");
    let plus = g.literal("+");
    let semi = g.literal(";");
    let open_brace = g.literal("{");
    let close_brace = g.literal("}");
    let open_paren = g.literal("(");
    let close_paren = g.literal(")");
    let ws = g.anonymous_token("whitespace", r"\s+");
    let comment = g.token("comment", r"//[^\n]*");
    g.pattern(comment, r"/\*([^*]|\*+[^*/])*\*+/")
        .pattern(comment, r"/\*([^*]|\*+[^*/])*\**");
    g.extra(ws).extra(comment);
    g.sync(&[semi, close_brace])
        .terminator(&[semi])
        .delimiter(DelimiterKind::Brace, open_brace, close_brace)
        .delimiter(DelimiterKind::Paren, open_paren, close_paren)
        .block_comment(comment, "/*", "*/");

    let program = g.nonterminal("program");
    let stmt = g.nonterminal("stmt");
    let block = g.nonterminal("block");
    let expr = g.nonterminal("expr");
    let statements = g.repeat1("_statements", stmt);

    g.rule_with(program, &[opt(statements)]);
    g.rule(stmt, &[ident, eq, expr, semi]);
    g.rule(stmt, &[block]);
    g.rule(block, &[open_brace, statements, close_brace]);
    g.rule(expr, &[expr, plus, expr]);
    g.rule(expr, &[open_paren, expr, close_paren]);
    g.rule(expr, &[ident]);
    g.rule(expr, &[number]);
    g.rule(expr, &[string]);
    g.left(1, &[plus]);
    g.start(program);
    g.build().unwrap()
}

pub fn language() -> Arc<Language> {
    LANGUAGE.clone()
}

pub fn parser() -> Parser {
    Parser::new(language()).unwrap()
}

pub fn parse(source: &[u8]) -> SyntaxTree {
    parser().parse(source, None).unwrap()
}

/// Apply `replacement` over `start..end`, reparse incrementally, and return
/// the new text with both the incremental and the fresh tree.
pub fn reparse(
    old: &SyntaxTree,
    source: &[u8],
    start: u32,
    end: u32,
    replacement: &[u8],
) -> (Vec<u8>, SyntaxTree, SyntaxTree) {
    let parser = parser();
    let (text, edit) = InputEdit::splice(source, start, end, replacement);
    let incremental = parser.parse(&text, Some(&old.edit(&edit))).unwrap();
    let fresh = parser.parse(&text, None).unwrap();
    (text, incremental, fresh)
}
