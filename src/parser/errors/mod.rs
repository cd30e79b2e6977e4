//! Diagnostics read off a finished tree
//!
//! Parsing never fails; problems are recorded in the tree as ERROR nodes
//! and zero-width MISSING tokens. `collect` walks the tree and reports
//! one [`SyntaxError`] per outermost ERROR node and per MISSING token, with
//! the innermost named ancestor as context and, for unclosed delimiters,
//! the opener as related location.

mod codes;
mod context;
mod error;

pub use codes::{ErrorCode, ErrorFamily};
pub use context::ParseContext;
pub use error::{RelatedInfo, Severity, SyntaxError};

use crate::language::Language;
use crate::tree::{Node, SyntaxTree};

/// Diagnostics for every ERROR and MISSING node of `tree`, in document order.
pub(crate) fn collect(tree: &SyntaxTree) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    let root = tree.root_node();
    if root.has_error() {
        let mut ancestors = Vec::new();
        visit(tree, root, &mut ancestors, &mut errors);
    }
    errors
}

fn visit<'t>(
    tree: &'t SyntaxTree,
    node: Node<'t>,
    ancestors: &mut Vec<Node<'t>>,
    out: &mut Vec<SyntaxError>,
) {
    if node.is_missing() {
        out.push(missing_token(tree, node, ancestors));
        return;
    }
    if node.is_error() {
        out.push(error_node(tree.language(), node, ancestors));
        return;
    }
    if !node.has_error() {
        return;
    }
    ancestors.push(node);
    for child in node.children() {
        visit(tree, child, ancestors, out);
    }
    ancestors.pop();
}

fn describe(language: &Language, node: Node<'_>) -> String {
    if language.is_named(node.kind()) {
        node.kind_name().replace('_', " ")
    } else {
        format!("'{}'", node.kind_name())
    }
}

fn error_node(language: &Language, node: Node<'_>, ancestors: &[Node<'_>]) -> SyntaxError {
    let context = ParseContext::of(ancestors);
    // Extras other than unlexable text are not what went wrong.
    let parts: Vec<_> = node
        .children()
        .filter(|child| child.is_error() || !child.is_extra())
        .collect();

    if parts.iter().all(|part| part.is_error() && part.child_count() == 0) {
        let text = node.text().trim();
        let (code, message) = if text.starts_with(['"', '\'']) {
            (ErrorCode::E0102, "unterminated string literal".to_string())
        } else {
            (ErrorCode::E0101, format!("invalid character{} '{}'", plural(text), text))
        };
        return SyntaxError::new(code, node.range(), context, message).with_hint("remove it");
    }

    if parts.iter().any(|part| part.child_count() > 0) {
        let message = format!("discarded incomplete syntax {context}");
        return SyntaxError::new(ErrorCode::E0303, node.range(), context, message);
    }

    let found = parts
        .iter()
        .find(|part| !part.is_error())
        .map_or_else(|| "text".to_string(), |part| describe(language, *part));
    let hint = if parts.len() > 1 { "remove these tokens" } else { "remove this token" };
    let message = format!("unexpected {found} {context}");
    SyntaxError::new(ErrorCode::E0201, node.range(), context, message).with_hint(hint)
}

fn plural(text: &str) -> &'static str {
    if text.chars().count() > 1 { "s" } else { "" }
}

fn missing_token(tree: &SyntaxTree, node: Node<'_>, ancestors: &[Node<'_>]) -> SyntaxError {
    let language = tree.language();
    let context = ParseContext::of(ancestors);
    let expected = describe(language, node);
    let hint = format!("insert {expected}");

    if language.is_named(node.kind()) {
        let code = if language.lexical().word_symbol() == Some(node.kind()) {
            ErrorCode::E0301
        } else {
            ErrorCode::E0302
        };
        let message = format!("missing {expected} {context}");
        return SyntaxError::new(code, node.range(), context, message).with_hint(hint);
    }

    if let Some((code, open, noun)) = ErrorCode::for_closer(node.kind_name()) {
        let message = format!("unclosed {noun} {context}, expected {expected}");
        let error = SyntaxError::new(code, node.range(), context, message).with_hint(hint);
        let opened = ancestors.last().and_then(|parent| {
            parent
                .children()
                .filter(|sibling| {
                    sibling.end_byte() <= node.start_byte() && sibling.kind_name() == open
                })
                .last()
        });
        return match opened {
            Some(opened) => {
                let related = RelatedInfo::new(format!("'{open}' opened here"), opened.range());
                error.with_related(related)
            }
            None => error,
        };
    }

    let (code, message) = if node.start_byte() >= tree.len() {
        (ErrorCode::E0206, format!("unexpected end of input, expected {expected}"))
    } else {
        (ErrorCode::E0205, format!("missing {expected} {context}"))
    };
    SyntaxError::new(code, node.range(), context, message).with_hint(hint)
}
