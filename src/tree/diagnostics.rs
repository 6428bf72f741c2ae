//! Turning error and missing nodes into [`SyntaxError`]s
//!
//! Codes come from the grammar's declared terminators, delimiter pairs and
//! block comments, never from token spellings.

use text_size::{TextRange, TextSize};

use super::{SyntaxNode, SyntaxTree};
use crate::errors::{ErrorCode, RelatedInfo, Severity, SyntaxError};
use crate::language::{DelimiterKind, SymbolId};

/// Longest token text quoted in a message
const MAX_QUOTED: usize = 24;

pub(crate) fn collect(tree: &SyntaxTree, source: &[u8]) -> Vec<SyntaxError> {
    let mut errors: Vec<SyntaxError> = tree
        .errors()
        .map(|node| {
            if node.is_missing() {
                missing(&node)
            } else {
                unexpected(&node, source)
            }
        })
        .collect();

    errors.extend(
        tree.root()
            .descendants()
            .filter(|node| node.is_token() && node.is_extra())
            .filter_map(|node| unterminated_comment(&node, source)),
    );

    if tree.is_partial() {
        let end = TextSize::new(tree.root().end_byte());
        errors.push(
            SyntaxError::at_offset(
                "parsing stopped before the end of the input",
                end,
                ErrorCode::E0999,
            )
            .with_severity(Severity::Warning),
        );
    }

    errors.sort_by_key(|error| (error.range.start(), error.range.end()));
    errors
}

fn unclosed_code(kind: DelimiterKind) -> ErrorCode {
    match kind {
        DelimiterKind::Brace => ErrorCode::E0202,
        DelimiterKind::Paren => ErrorCode::E0203,
        DelimiterKind::Bracket => ErrorCode::E0204,
        DelimiterKind::Quote => ErrorCode::E0102,
    }
}

fn missing(node: &SyntaxNode) -> SyntaxError {
    let language = node.language();
    let kind = node.kind();
    let (code, opener) = if language.is_terminator(kind) {
        (ErrorCode::E0201, None)
    } else if let Some(pair) = language.delimiter_closed_by(kind) {
        (unclosed_code(pair.kind), Some(pair.open))
    } else {
        (ErrorCode::E0902, None)
    };

    let name = node.kind_name();
    let message = if node.is_named() {
        format!("missing {name}")
    } else {
        format!("missing `{name}`")
    };
    let mut error = SyntaxError::new(message, node.text_range(), code);
    if let Some(open) = opener.and_then(|open| matching_opener(node, open)) {
        error = error.with_related(RelatedInfo::new(
            format!("`{}` opened here", open.kind_name()),
            open.text_range(),
        ));
    }
    error
}

/// The nearest `opener` token before `node` among its siblings
fn matching_opener(node: &SyntaxNode, opener: SymbolId) -> Option<SyntaxNode> {
    let mut sibling = node.prev_sibling();
    while let Some(current) = sibling {
        if current.kind() == opener && !current.is_missing() {
            return Some(current);
        }
        sibling = current.prev_sibling();
    }
    None
}

fn unexpected(node: &SyntaxNode, source: &[u8]) -> SyntaxError {
    let Some(token) = first_significant_token(node) else {
        return SyntaxError::new("unexpected end of input", node.text_range(), ErrorCode::E0901);
    };
    if token.is_error_node() {
        let text = quote(node.text(source));
        return SyntaxError::new(
            format!("invalid character `{text}`"),
            node.text_range(),
            ErrorCode::E0101,
        );
    }

    let closes = node
        .language()
        .delimiter_closed_by(token.kind())
        .is_some_and(|pair| pair.kind != DelimiterKind::Quote);
    let code = if closes {
        ErrorCode::E0205
    } else {
        ErrorCode::E0901
    };
    let text = quote(token.text(source));
    SyntaxError::new(format!("unexpected `{text}`"), node.text_range(), code)
}

/// First token in `node` that is not whitespace or a comment
fn first_significant_token(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.descendants()
        .filter(|descendant| descendant.is_token() && !descendant.is_missing())
        .find(|token| !token.is_extra() || token.is_error_node())
}

/// A block comment that runs to the end of the input without closing
fn unterminated_comment(node: &SyntaxNode, source: &[u8]) -> Option<SyntaxError> {
    let comment = node.language().block_comment(node.kind())?;
    let text = node.text(source);
    let (open, close) = (comment.open.as_bytes(), comment.close.as_bytes());
    let closed = text.len() >= open.len() + close.len() && text.ends_with(close);
    if !text.starts_with(open) || closed {
        return None;
    }
    Some(
        SyntaxError::new(
            ErrorCode::E0103.default_message(),
            node.text_range(),
            ErrorCode::E0103,
        )
        .with_hint(format!("close the comment with `{}`", comment.close))
        .with_severity(Severity::Warning),
    )
}

fn quote(text: &[u8]) -> String {
    let text = String::from_utf8_lossy(text);
    let mut quoted: String = text.chars().take(MAX_QUOTED).collect();
    if text.chars().count() > MAX_QUOTED {
        quoted.push_str("...");
    }
    quoted.replace('\n', "\\n")
}
