//! Bundled MOO grammar
//!
//! The LambdaMOO / ToastStunt programming language, compiled once on first
//! use:
//!
//! ```text
//! program
//!   _statements ─┬─ expression_statement   expr ;
//!   │            ├─ let / const / global
//!   │            ├─ if / while / for / fork / try / begin ... end
//!   │            ├─ function_statement     fn name(params) ... endfn
//!   │            └─ return / break / continue
//!   object_definition ─┬─ object_property      name: expr
//!                      ├─ property_definition  property name (attrs) = expr
//!                      └─ verb_definition      verb name (this none this)
//!                                              attrs... statements endverb
//! ```
//!
//! Keywords are case-insensitive. The words of object definitions, and the
//! keywords that double as verb argument specifiers (`any`, `in`, `for`),
//! are contextual: where the grammar only allows an identifier they are
//! read as one. Double-quoted strings are lexed in their own lexical state
//! so escapes and quotes never leak into the default token set;
//! single-quoted strings and `'symbols` share a prefix and are told apart
//! by the longest match.
//! Operator precedence follows the LambdaMOO yacc table, lowest first:
//! `=`, `? |`, `|| &&`, comparisons and `in`, `|. &. ^.`, `<< >>`, `+ -`,
//! `* / %`, `^`, unary `! -`, then `. : [`.


use std::sync::{Arc, LazyLock};

use crate::generate::{Element, GrammarBuilder, GrammarError, Sym, opt};
use crate::language::{DelimiterKind, Language, LexState};

/// Error codes recognised as `error_code` tokens
pub const ERROR_CODES: &[&str] = &[
    "E_NONE", "E_TYPE", "E_DIV", "E_PERM", "E_PROPNF", "E_VERBNF", "E_VARNF", "E_INVIND",
    "E_RECMOVE", "E_MAXREC", "E_RANGE", "E_ARGS", "E_NACC", "E_INVARG", "E_QUOTA", "E_FLOAT",
    "E_ASSERT",
];

static LANGUAGE: LazyLock<Result<Arc<Language>, GrammarError>> =
    LazyLock::new(|| grammar().build().map(Arc::new));

/// The compiled MOO language, shared by every caller
pub fn language() -> Result<Arc<Language>, &'static GrammarError> {
    LANGUAGE.as_ref().map(Arc::clone)
}

/// The MOO grammar description, uncompiled
pub fn grammar() -> GrammarBuilder {
    let mut g = GrammarBuilder::new("moo");
    let tokens = Tokens::declare(&mut g);
    Rules::declare(&mut g, &tokens);
    g
}

/// `E_TYPE` becomes `[eE]_[tT][yY][pP][eE]`
fn caseless(word: &str) -> String {
    word.chars()
        .map(|ch| {
            if ch.is_ascii_alphabetic() {
                format!("[{}{}]", ch.to_ascii_lowercase(), ch.to_ascii_uppercase())
            } else {
                ch.to_string()
            }
        })
        .collect()
}

// ============================================================================
// Tokens
// ============================================================================

struct Tokens {
    identifier: Sym,
    integer: Sym,
    float: Sym,
    error_code: Sym,
    object_id: Sym,
    system_property: Sym,
    symbol: Sym,
    quoted_string: Sym,
    string_open: Sym,
    string_close: Sym,
    string_content: Sym,
    escape_sequence: Sym,

    semicolon: Sym,
    comma: Sym,
    lparen: Sym,
    rparen: Sym,
    lbracket: Sym,
    rbracket: Sym,
    lbrace: Sym,
    rbrace: Sym,
    dot: Sym,
    dotdot: Sym,
    colon: Sym,
    assign: Sym,
    question: Sym,
    pipe: Sym,
    at: Sym,
    dollar: Sym,
    arrow: Sym,
    bang: Sym,
    minus: Sym,
    less: Sym,
    greater: Sym,
    binary: Vec<Sym>,

    kw_if: Sym,
    kw_elseif: Sym,
    kw_else: Sym,
    kw_endif: Sym,
    kw_while: Sym,
    kw_endwhile: Sym,
    kw_for: Sym,
    kw_in: Sym,
    kw_endfor: Sym,
    kw_fork: Sym,
    kw_endfork: Sym,
    kw_try: Sym,
    kw_except: Sym,
    kw_finally: Sym,
    kw_endtry: Sym,
    kw_any: Sym,
    kw_begin: Sym,
    kw_end: Sym,
    kw_fn: Sym,
    kw_endfn: Sym,
    kw_return: Sym,
    kw_break: Sym,
    kw_continue: Sym,
    kw_let: Sym,
    kw_const: Sym,
    kw_global: Sym,
    kw_true: Sym,
    kw_false: Sym,
    kw_object: Sym,
    kw_endobject: Sym,
    kw_property: Sym,
    kw_verb: Sym,
    kw_endverb: Sym,
}

impl Tokens {
    fn declare(g: &mut GrammarBuilder) -> Self {
        // Symbol ids order the candidates error recovery tries: a missing
        // operand becomes an identifier and a missing terminator a `;`
        // rather than some operator.
        let identifier = g.token("identifier", r"[A-Za-z_][A-Za-z0-9_]*");
        let integer = g.token("integer", r"\d+");
        let float = g.token("float", r"\d+[eE][+-]?\d+");
        g.pattern(float, r"\d+\.\d+(?:[eE][+-]?\d+)?")
            .pattern(float, r"\.\d+(?:[eE][+-]?\d+)?");

        let codes: Vec<String> = ERROR_CODES.iter().map(|code| caseless(code)).collect();
        let error_code = g.token("error_code", &codes.join("|"));
        g.priority(error_code, 1);
        let object_id = g.token("object_id", r"#-?\d+");
        g.pattern(object_id, r"#[A-Za-z_][A-Za-z0-9_]*");
        let system_property = g.token("system_property", r"\$[A-Za-z_]\w*");
        let symbol = g.token("symbol", r"'[A-Za-z_][A-Za-z0-9_]*");
        let quoted_string = g.anonymous_token("quoted_string", r"'([^'\\\n]|\\.)*'");
        let semicolon = g.literal(";");

        let whitespace = g.anonymous_token("whitespace", r"\s+");
        let comment = g.token("comment", r"//[^\n]*");
        g.pattern(comment, r"/\*([^*]|\*+[^*/])*\*+/")
            .pattern(comment, r"/\*([^*]|\*+[^*/])*\**");
        g.extra(whitespace).extra(comment);
        g.block_comment(comment, "/*", "*/");

        let string_state = g.lexical_state("string");
        let string_open = g.anonymous_token("\"", "\"");
        g.enters(string_open, string_state);
        let string_content = g.token("string_content", r#"[^"\\]+"#);
        let escape_sequence = g.token("escape_sequence", r"\\(.|\n)");
        let string_close = g.anonymous_token("\"", "\"");
        for token in [string_content, escape_sequence, string_close] {
            g.in_states(token, &[string_state]);
        }
        g.enters(string_close, LexState::DEFAULT);

        let kw_if = g.keyword("if");
        let kw_elseif = g.keyword("elseif");
        let kw_else = g.keyword("else");
        let kw_endif = g.keyword("endif");
        let kw_while = g.keyword("while");
        let kw_endwhile = g.keyword("endwhile");
        let kw_for = g.contextual_keyword("for");
        let kw_in = g.contextual_keyword("in");
        let kw_endfor = g.keyword("endfor");
        let kw_fork = g.keyword("fork");
        let kw_endfork = g.keyword("endfork");
        let kw_try = g.keyword("try");
        let kw_except = g.keyword("except");
        let kw_finally = g.keyword("finally");
        let kw_endtry = g.keyword("endtry");
        let kw_any = g.contextual_keyword("any");
        let kw_begin = g.keyword("begin");
        let kw_end = g.keyword("end");
        let kw_fn = g.keyword("fn");
        let kw_endfn = g.keyword("endfn");
        let kw_return = g.keyword("return");
        let kw_break = g.keyword("break");
        let kw_continue = g.keyword("continue");
        let kw_let = g.keyword("let");
        let kw_const = g.keyword("const");
        let kw_global = g.keyword("global");
        let kw_true = g.keyword("true");
        let kw_false = g.keyword("false");
        let kw_object = g.contextual_keyword("object");
        let kw_endobject = g.contextual_keyword("endobject");
        let kw_property = g.contextual_keyword("property");
        let kw_verb = g.contextual_keyword("verb");
        let kw_endverb = g.contextual_keyword("endverb");
        g.word(identifier);

        let comma = g.literal(",");
        let lparen = g.literal("(");
        let rparen = g.literal(")");
        let lbracket = g.literal("[");
        let rbracket = g.literal("]");
        let lbrace = g.literal("{");
        let rbrace = g.literal("}");
        let dot = g.literal(".");
        let dotdot = g.literal("..");
        let colon = g.literal(":");
        let assign = g.literal("=");
        let question = g.literal("?");
        let pipe = g.literal("|");
        let at = g.literal("@");
        let dollar = g.literal("$");
        let arrow = g.literal("->");
        let bang = g.literal("!");
        let minus = g.literal("-");

        let or = g.literal("||");
        let and = g.literal("&&");
        let comparisons = ["==", "!=", "<", "<=", ">", ">="].map(|op| g.literal(op));
        let [_, _, less, _, greater, _] = comparisons;
        let bitwise = ["|.", "&.", "^."].map(|op| g.literal(op));
        let shifts = ["<<", ">>"].map(|op| g.literal(op));
        let plus = g.literal("+");
        let products = ["*", "/", "%"].map(|op| g.literal(op));
        let power = g.literal("^");

        g.right(1, &[assign]);
        g.right(2, &[question, pipe]);
        g.left(3, &[or, and]);
        g.left(4, &comparisons).left(4, &[kw_in]);
        g.left(5, &bitwise);
        g.left(6, &shifts);
        g.left(7, &[plus, minus]);
        g.left(8, &products);
        g.right(9, &[power]);
        g.left(10, &[bang]);
        g.left(11, &[dot, colon, lbracket]);

        let mut binary = vec![or, and];
        binary.extend(comparisons);
        binary.push(kw_in);
        binary.extend(bitwise);
        binary.extend(shifts);
        binary.extend([plus, minus]);
        binary.extend(products);
        binary.push(power);

        g.sync(&[
            semicolon,
            kw_endif,
            kw_endwhile,
            kw_endfor,
            kw_endfork,
            kw_endtry,
            kw_end,
            kw_endfn,
            kw_endverb,
            kw_endobject,
        ]);
        g.terminator(&[semicolon])
            .delimiter(DelimiterKind::Brace, lbrace, rbrace)
            .delimiter(DelimiterKind::Paren, lparen, rparen)
            .delimiter(DelimiterKind::Bracket, lbracket, rbracket)
            .delimiter(DelimiterKind::Quote, string_open, string_close);

        Self {
            identifier,
            integer,
            float,
            error_code,
            object_id,
            system_property,
            symbol,
            quoted_string,
            string_open,
            string_close,
            string_content,
            escape_sequence,
            semicolon,
            comma,
            lparen,
            rparen,
            lbracket,
            rbracket,
            lbrace,
            rbrace,
            dot,
            dotdot,
            colon,
            assign,
            question,
            pipe,
            at,
            dollar,
            arrow,
            bang,
            minus,
            less,
            greater,
            binary,
            kw_if,
            kw_elseif,
            kw_else,
            kw_endif,
            kw_while,
            kw_endwhile,
            kw_for,
            kw_in,
            kw_endfor,
            kw_fork,
            kw_endfork,
            kw_try,
            kw_except,
            kw_finally,
            kw_endtry,
            kw_any,
            kw_begin,
            kw_end,
            kw_fn,
            kw_endfn,
            kw_return,
            kw_break,
            kw_continue,
            kw_let,
            kw_const,
            kw_global,
            kw_true,
            kw_false,
            kw_object,
            kw_endobject,
            kw_property,
            kw_verb,
            kw_endverb,
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

struct Rules {
    statement: Sym,
    statements: Sym,
    expression: Sym,
    parameters: Sym,
}

impl Rules {
    fn declare(g: &mut GrammarBuilder, t: &Tokens) -> Self {
        let program = g.nonterminal("program");
        let statement = g.nonterminal("_statement");
        let expression = g.nonterminal("_expression");
        let statements = g.repeat1("_statements", statement);
        let parameters = g.separated1("_parameters", t.identifier, t.comma);

        let rules = Self {
            statement,
            statements,
            expression,
            parameters,
        };
        g.rule_with(program, &[opt(statements)]);
        g.start(program);

        rules.simple_statements(g, t);
        rules.compound_statements(g, t);
        rules.operations(g, t);
        rules.accessors(g, t);
        let string = rules.literals(g, t);
        rules.object_definition(g, t, program, string);
        rules
    }

    fn statement_kind(&self, g: &mut GrammarBuilder, name: &str) -> Sym {
        let kind = g.nonterminal(name);
        g.rule(self.statement, &[kind]);
        kind
    }

    fn expression_kind(&self, g: &mut GrammarBuilder, name: &str) -> Sym {
        let kind = g.nonterminal(name);
        g.rule(self.expression, &[kind]);
        kind
    }

    fn simple_statements(&self, g: &mut GrammarBuilder, t: &Tokens) {
        let e = self.expression;

        let expression_statement = self.statement_kind(g, "expression_statement");
        g.rule(expression_statement, &[e, t.semicolon]);

        let let_statement = self.statement_kind(g, "let_statement");
        g.rule(let_statement, &[t.kw_let, t.identifier, t.assign, e, t.semicolon]);

        let const_statement = self.statement_kind(g, "const_statement");
        g.rule(const_statement, &[t.kw_const, t.identifier, t.assign, e, t.semicolon]);

        let global_statement = self.statement_kind(g, "global_statement");
        g.rule(global_statement, &[t.kw_global, t.identifier, t.semicolon]);
        g.rule(global_statement, &[t.kw_global, t.identifier, t.assign, e, t.semicolon]);

        let return_statement = self.statement_kind(g, "return_statement");
        g.rule_with(return_statement, &[t.kw_return.into(), opt(e), t.semicolon.into()]);

        let break_statement = self.statement_kind(g, "break_statement");
        g.rule_with(
            break_statement,
            &[t.kw_break.into(), opt(t.identifier), t.semicolon.into()],
        );

        let continue_statement = self.statement_kind(g, "continue_statement");
        g.rule_with(
            continue_statement,
            &[t.kw_continue.into(), opt(t.identifier), t.semicolon.into()],
        );
    }

    fn compound_statements(&self, g: &mut GrammarBuilder, t: &Tokens) {
        let e = self.expression;
        let body = opt(self.statements);

        let if_statement = self.statement_kind(g, "if_statement");
        let elseif_clause = g.nonterminal("elseif_clause");
        g.rule_with(
            elseif_clause,
            &[t.kw_elseif.into(), t.lparen.into(), e.into(), t.rparen.into(), body],
        );
        let elseif_clauses = g.repeat1("_elseif_clauses", elseif_clause);
        let else_clause = g.nonterminal("else_clause");
        g.rule_with(else_clause, &[t.kw_else.into(), body]);
        g.rule_with(
            if_statement,
            &[
                t.kw_if.into(),
                t.lparen.into(),
                e.into(),
                t.rparen.into(),
                body,
                opt(elseif_clauses),
                opt(else_clause),
                t.kw_endif.into(),
            ],
        );

        let while_statement = self.statement_kind(g, "while_statement");
        g.rule_with(
            while_statement,
            &[
                t.kw_while.into(),
                opt(t.identifier),
                t.lparen.into(),
                e.into(),
                t.rparen.into(),
                body,
                t.kw_endwhile.into(),
            ],
        );

        let for_statement = self.statement_kind(g, "for_statement");
        let range = g.nonterminal("range");
        g.rule(range, &[t.lbracket, e, t.dotdot, e, t.rbracket]);
        g.rule_with(
            for_statement,
            &[
                t.kw_for.into(),
                t.identifier.into(),
                t.kw_in.into(),
                t.lparen.into(),
                e.into(),
                t.rparen.into(),
                body,
                t.kw_endfor.into(),
            ],
        );
        g.rule_with(
            for_statement,
            &[
                t.kw_for.into(),
                t.identifier.into(),
                t.kw_in.into(),
                range.into(),
                body,
                t.kw_endfor.into(),
            ],
        );

        let fork_statement = self.statement_kind(g, "fork_statement");
        g.rule_with(
            fork_statement,
            &[
                t.kw_fork.into(),
                opt(t.identifier),
                t.lparen.into(),
                e.into(),
                t.rparen.into(),
                body,
                t.kw_endfork.into(),
            ],
        );

        let try_statement = self.statement_kind(g, "try_statement");
        let codes = g.nonterminal("codes");
        g.rule(codes, &[t.kw_any]);
        let error_codes = g.separated1("_error_codes", t.error_code, t.comma);
        g.rule(codes, &[error_codes]);
        let except_clause = g.nonterminal("except_clause");
        g.rule_with(
            except_clause,
            &[
                t.kw_except.into(),
                opt(t.identifier),
                t.lparen.into(),
                codes.into(),
                t.rparen.into(),
                body,
            ],
        );
        let except_clauses = g.repeat1("_except_clauses", except_clause);
        let finally_clause = g.nonterminal("finally_clause");
        g.rule_with(finally_clause, &[t.kw_finally.into(), body]);
        g.rule_with(
            try_statement,
            &[
                t.kw_try.into(),
                body,
                opt(except_clauses),
                opt(finally_clause),
                t.kw_endtry.into(),
            ],
        );

        let block_statement = self.statement_kind(g, "block_statement");
        g.rule_with(block_statement, &[t.kw_begin.into(), body, t.kw_end.into()]);

        let function_statement = self.statement_kind(g, "function_statement");
        g.rule_with(
            function_statement,
            &[
                t.kw_fn.into(),
                t.identifier.into(),
                t.lparen.into(),
                opt(self.parameters),
                t.rparen.into(),
                body,
                t.kw_endfn.into(),
            ],
        );
    }

    fn operations(&self, g: &mut GrammarBuilder, t: &Tokens) {
        let e = self.expression;

        let assignment = self.expression_kind(g, "assignment_operation");
        g.rule(assignment, &[e, t.assign, e]);

        let conditional = self.expression_kind(g, "conditional_operation");
        g.rule(conditional, &[e, t.question, e, t.pipe, e]);

        let binary = self.expression_kind(g, "binary_operation");
        for op in &t.binary {
            g.rule(binary, &[e, *op, e]);
        }

        let unary = self.expression_kind(g, "unary_operation");
        g.rule(unary, &[t.bang, e]).prec(10);
        g.rule(unary, &[t.minus, e]).prec(10);

        // `( expr )` groups without a node of its own
        g.rule(e, &[t.lparen, e, t.rparen]);
    }

    fn accessors(&self, g: &mut GrammarBuilder, t: &Tokens) {
        let e = self.expression;

        let splice = g.nonterminal("splice");
        g.rule(splice, &[t.at, e]).prec(0);
        let argument = g.nonterminal("_argument");
        g.rule(argument, &[e]);
        g.rule(argument, &[splice]);
        let arguments = g.separated1("_arguments", argument, t.comma);

        let property_access = self.expression_kind(g, "property_access");
        g.rule(property_access, &[e, t.dot, t.identifier]);
        g.rule(property_access, &[e, t.dot, t.lparen, e, t.rparen]);

        // A bare identifier receiver keeps `name :` unreduced, the prefix
        // method calls share with verb attributes.
        let method_call = self.expression_kind(g, "method_call");
        for receiver in [e, t.identifier] {
            for method in [&[t.identifier][..], &[t.lparen, e, t.rparen][..]] {
                let mut rhs: Vec<Element> = vec![receiver.into(), t.colon.into()];
                rhs.extend(method.iter().map(|sym| Element::from(*sym)));
                rhs.extend([t.lparen.into(), opt(arguments), t.rparen.into()]);
                g.rule_with(method_call, &rhs);
            }
        }

        let index_access = self.expression_kind(g, "index_access");
        g.rule(index_access, &[e, t.lbracket, e, t.rbracket]);

        let slice = self.expression_kind(g, "slice");
        g.rule(slice, &[e, t.lbracket, e, t.dotdot, e, t.rbracket]);

        let call = self.expression_kind(g, "call");
        g.rule_with(
            call,
            &[t.identifier.into(), t.lparen.into(), opt(arguments), t.rparen.into()],
        );

        let list = self.expression_kind(g, "list");
        g.rule_with(list, &[t.lbrace.into(), opt(arguments), t.rbrace.into()]);

        let map = self.expression_kind(g, "map");
        let map_entry = g.nonterminal("map_entry");
        g.rule(map_entry, &[e, t.arrow, e]);
        let map_entries = g.separated1("_map_entries", map_entry, t.comma);
        g.rule_with(map, &[t.lbracket.into(), opt(map_entries), t.rbracket.into()]);

        let flyweight = self.expression_kind(g, "flyweight");
        let properties = g.nonterminal("_flyweight_properties");
        g.rule(properties, &[t.comma, map]);
        let values = g.nonterminal("_flyweight_values");
        g.rule(values, &[t.comma, list]);
        g.rule_with(
            flyweight,
            &[
                t.less.into(),
                e.into(),
                opt(properties),
                opt(values),
                t.greater.into(),
            ],
        )
        .prec(15);

        let function_expression = self.expression_kind(g, "function_expression");
        g.rule_with(
            function_expression,
            &[
                t.kw_fn.into(),
                t.lparen.into(),
                opt(self.parameters),
                t.rparen.into(),
                opt(self.statements),
                t.kw_endfn.into(),
            ],
        );
    }

    fn literals(&self, g: &mut GrammarBuilder, t: &Tokens) -> Sym {
        let e = self.expression;
        g.rule(e, &[t.identifier]).prec(-1);
        for token in [
            t.integer,
            t.float,
            t.error_code,
            t.object_id,
            t.system_property,
            t.symbol,
        ] {
            g.rule(e, &[token]);
        }

        let range_end = self.expression_kind(g, "range_end");
        g.rule(range_end, &[t.dollar]);

        let boolean = self.expression_kind(g, "boolean");
        g.rule(boolean, &[t.kw_true]);
        g.rule(boolean, &[t.kw_false]);

        let string = self.expression_kind(g, "string");
        let part = g.nonterminal("_string_part");
        g.rule(part, &[t.string_content]);
        g.rule(part, &[t.escape_sequence]);
        let parts = g.repeat1("_string_parts", part);
        g.rule_with(
            string,
            &[t.string_open.into(), opt(parts), t.string_close.into()],
        );
        g.rule(string, &[t.quoted_string]);
        string
    }

    /// `object name ... endobject`, the textual dump of one object
    fn object_definition(
        &self,
        g: &mut GrammarBuilder,
        t: &Tokens,
        program: Sym,
        string: Sym,
    ) {
        let e = self.expression;

        let object_definition = g.nonterminal("object_definition");
        g.rule(program, &[object_definition]);
        let member = g.nonterminal("_object_member");
        let members = g.repeat1("_object_members", member);
        g.rule_with(
            object_definition,
            &[
                t.kw_object.into(),
                t.identifier.into(),
                opt(members),
                opt(t.kw_endobject),
            ],
        );

        let object_property = g.nonterminal("object_property");
        g.rule(object_property, &[t.identifier, t.colon, e]);
        g.rule(member, &[object_property]);

        let property_definition = g.nonterminal("property_definition");
        let property_attribute = g.nonterminal("property_attribute");
        g.rule(property_attribute, &[t.identifier, t.colon, e]);
        let attribute_list =
            g.separated1("_property_attribute_list", property_attribute, t.comma);
        let attributes = g.nonterminal("_property_attributes");
        g.rule(attributes, &[t.lparen, attribute_list, t.rparen]);
        g.rule_with(
            property_definition,
            &[
                t.kw_property.into(),
                t.identifier.into(),
                opt(attributes),
                t.assign.into(),
                e.into(),
                opt(t.semicolon),
            ],
        );
        g.rule(member, &[property_definition]);

        // Attribute values are literals so that `owner: #2` and a body
        // starting with `player:tell()` part at the token after the value.
        let verb_attribute = g.nonterminal("verb_attribute");
        let value = g.nonterminal("_attribute_value");
        g.rule(value, &[t.identifier]).prec(-1);
        for literal in [
            t.integer,
            t.float,
            t.error_code,
            t.object_id,
            t.system_property,
            t.symbol,
        ] {
            g.rule(value, &[literal]);
        }
        g.rule(value, &[string]);
        g.rule(verb_attribute, &[t.identifier, t.colon, value]);
        let verb_attributes = g.repeat1("_verb_attributes", verb_attribute);

        let verb_definition = g.nonterminal("verb_definition");
        for name in [t.identifier, string] {
            g.rule_with(
                verb_definition,
                &[
                    t.kw_verb.into(),
                    name.into(),
                    t.lparen.into(),
                    t.identifier.into(),
                    t.identifier.into(),
                    t.identifier.into(),
                    t.rparen.into(),
                    opt(verb_attributes),
                    opt(self.statements),
                    t.kw_endverb.into(),
                ],
            );
        }
        g.rule(member, &[verb_definition]);
    }
}
