//! Positioned, read-only views of a [`SyntaxTree`].

use std::fmt::Write as _;

use text_size::{TextRange, TextSize};

use super::{Subtree, SyntaxTree};
use crate::base::{Position, Span};
use crate::language::Symbol;

/// A subtree together with its absolute offset in one tree.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    subtree: &'t Subtree,
    start: usize,
}

impl<'t> Node<'t> {
    pub(crate) fn new(tree: &'t SyntaxTree, subtree: &'t Subtree, start: usize) -> Self {
        Self {
            tree,
            subtree,
            start,
        }
    }

    pub fn kind(&self) -> Symbol {
        self.subtree.symbol()
    }

    pub fn kind_name(&self) -> &'static str {
        self.tree.language().symbol_name(self.kind())
    }

    pub fn start_byte(&self) -> usize {
        self.start
    }

    pub fn end_byte(&self) -> usize {
        self.start + self.subtree.len()
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(
            TextSize::new(self.start_byte() as u32),
            TextSize::new(self.end_byte() as u32),
        )
    }

    pub fn start_position(&self) -> Position {
        self.tree.line_index().position(self.range().start())
    }

    pub fn end_position(&self) -> Position {
        self.tree.line_index().position(self.range().end())
    }

    pub fn span(&self) -> Span {
        Span::from_range(self.range(), self.tree.line_index())
    }

    pub fn text(&self) -> &'t str {
        self.tree
            .text()
            .get(self.start_byte()..self.end_byte())
            .unwrap_or_default()
    }

    pub fn child_count(&self) -> usize {
        self.subtree.child_count()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.children().nth(index)
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        let tree = self.tree;
        let subtree = self.subtree;
        let mut start = self.start;
        subtree.children().iter().map(move |child| {
            let node = Node::new(tree, child, start);
            start += child.len();
            node
        })
    }

    /// Named children, including MISSING tokens and ERROR nodes.
    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        self.children().filter(|child| child.is_named())
    }

    pub fn is_named(&self) -> bool {
        self.tree.language().is_named(self.kind())
    }

    pub fn is_error(&self) -> bool {
        self.subtree.is_error()
    }

    pub fn is_missing(&self) -> bool {
        self.subtree.is_missing()
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    /// Whether this node is, or contains, an ERROR or MISSING node.
    pub fn has_error(&self) -> bool {
        self.subtree.has_error()
    }

    pub fn subtree(&self) -> &'t Subtree {
        self.subtree
    }

    pub fn walk(&self) -> TreeCursor<'t> {
        TreeCursor::new(*self)
    }

    /// The smallest node that contains `range`.
    pub fn descendant_for_range(&self, range: TextRange) -> Option<Node<'t>> {
        let contains = |node: &Node<'_>| node.range().contains_range(range);
        if !contains(self) {
            return None;
        }
        let mut current = *self;
        'descend: loop {
            for child in current.children() {
                // Zero-width children only match an empty range at their offset.
                if contains(&child) && (!child.subtree.is_empty() || range.is_empty()) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// S-expression of the named structure below this node.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        if self.is_missing() {
            if self.is_named() {
                let _ = write!(out, "(MISSING {})", self.kind_name());
            } else {
                let _ = write!(out, "(MISSING {:?})", self.kind_name());
            }
            return;
        }
        out.push('(');
        out.push_str(self.kind_name());
        for child in self.children().filter(|child| child.is_named() || child.is_missing()) {
            out.push(' ');
            child.write_sexp(out);
        }
        out.push(')');
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:?}", self.kind_name(), self.range())
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.subtree.ptr_eq(other.subtree)
            && self.start == other.start
    }
}

impl Eq for Node<'_> {}

/// Walks a tree without allocating a [`Node`] per step.
#[derive(Debug, Clone)]
pub struct TreeCursor<'t> {
    /// Ancestors with the index of the child the walk went into.
    ancestors: Vec<(Node<'t>, usize)>,
    current: Node<'t>,
}

impl<'t> TreeCursor<'t> {
    pub fn new(node: Node<'t>) -> Self {
        Self {
            ancestors: Vec::new(),
            current: node,
        }
    }

    pub fn node(&self) -> Node<'t> {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.current.child(0) {
            Some(child) => {
                self.ancestors.push((self.current, 0));
                self.current = child;
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        let Some((parent, index)) = self.ancestors.last_mut() else {
            return false;
        };
        let parent: &'t Subtree = parent.subtree;
        let Some(sibling) = parent.children().get(*index + 1) else {
            return false;
        };
        *index += 1;
        self.current = Node::new(self.current.tree, sibling, self.current.end_byte());
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        match self.ancestors.pop() {
            Some((parent, _)) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }

    /// Move to the first child that ends after `offset`.
    pub fn goto_first_child_for_byte(&mut self, offset: usize) -> bool {
        let found = self
            .current
            .children()
            .enumerate()
            .find(|(_, child)| child.end_byte() > offset);
        match found {
            Some((index, child)) => {
                self.ancestors.push((self.current, index));
                self.current = child;
                true
            }
            None => false,
        }
    }
}
