//! Concrete syntax trees.
//!
//! - [`Subtree`] - immutable, shareable, position independent
//! - [`SyntaxTree`] - a root subtree plus the text it was parsed from
//! - [`Node`], [`TreeCursor`] - positioned read-only views
//! - [`Edit`], [`EditedTree`] - input to incremental reparsing
//!
//! Trees are lossless: whitespace and comments are extra leaves, so every
//! byte of the text belongs to exactly one leaf.

mod diff;
mod edit;
mod node;
mod subtree;

pub use diff::changed_ranges;
pub use edit::{Edit, EditLog, EditedTree};
pub use node::{Node, TreeCursor};
pub use subtree::Subtree;

pub(crate) use edit::apply as apply_edits;
pub(crate) use subtree::{LeafInit, NodeInit};

use std::sync::Arc;

use rowan::{GreenNode, GreenNodeBuilder};

use crate::base::LineIndex;
use crate::language::Language;
use crate::parser::ReparseError;
use crate::parser::errors::{self, SyntaxError};

/// The result of a parse: a root subtree and the text it covers.
#[derive(Clone)]
pub struct SyntaxTree {
    root: Subtree,
    text: Arc<str>,
    line_index: Arc<LineIndex>,
    language: &'static Language,
}

impl SyntaxTree {
    pub(crate) fn new(root: Subtree, text: Arc<str>, language: &'static Language) -> Self {
        let line_index = Arc::new(LineIndex::new(&text));
        Self {
            root,
            text,
            line_index,
            language,
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::new(self, &self.root, 0)
    }

    pub fn root(&self) -> &Subtree {
        &self.root
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn language(&self) -> &'static Language {
        self.language
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    /// Diagnostics for every ERROR and MISSING node, in document order.
    pub fn errors(&self) -> Vec<SyntaxError> {
        errors::collect(self)
    }

    /// Adjust this tree to `edits` so it can seed an incremental reparse.
    pub fn edit(&self, edits: &[Edit]) -> Result<EditedTree, ReparseError> {
        apply_edits(&self.root, &self.text, edits)
    }

    /// Lossless rowan tree with symbol ids as kinds.
    pub fn green(&self) -> GreenNode {
        let mut builder = GreenNodeBuilder::new();
        let mut stack = vec![(&self.root, 0usize, false)];
        while let Some((subtree, start, entered)) = stack.pop() {
            let kind = rowan::SyntaxKind(subtree.symbol().0);
            if subtree.is_leaf() {
                let text = self.text.get(start..start + subtree.len()).unwrap_or_default();
                builder.token(kind, text);
            } else if entered {
                builder.finish_node();
            } else {
                builder.start_node(kind);
                stack.push((subtree, start, true));
                let mut offsets = Vec::with_capacity(subtree.child_count());
                let mut offset = start;
                for child in subtree.children() {
                    offsets.push((child, offset, false));
                    offset += child.len();
                }
                stack.extend(offsets.into_iter().rev());
            }
        }
        builder.finish()
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language.name())
            .field("len", &self.len())
            .field("sexp", &self.to_sexp())
            .finish()
    }
}
