//! Where in the source structure an error happened
//!
//! The context is read off the finished tree: the innermost named ancestor
//! of the ERROR or MISSING node.

use std::fmt;

use crate::tree::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseContext {
    /// Directly under the root
    #[default]
    TopLevel,
    /// Inside a node of the given kind
    Within(&'static str),
}

impl ParseContext {
    /// Context from the ancestors of a node, root first. The root itself
    /// never counts, and neither do ERROR nodes.
    pub fn of(ancestors: &[Node<'_>]) -> Self {
        ancestors
            .iter()
            .skip(1)
            .rev()
            .find(|ancestor| ancestor.is_named() && !ancestor.is_error())
            .map_or(Self::TopLevel, |ancestor| Self::Within(ancestor.kind_name()))
    }

    pub fn is_top_level(&self) -> bool {
        matches!(self, Self::TopLevel)
    }

    /// The enclosing node kind, if any
    pub fn kind_name(&self) -> Option<&'static str> {
        match self {
            Self::TopLevel => None,
            Self::Within(kind) => Some(kind),
        }
    }
}

/// `at top level`, or `in macro body` for `macro_body`.
impl fmt::Display for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLevel => f.write_str("at top level"),
            Self::Within(kind) => {
                write!(f, "in {}", kind.trim_start_matches('_').replace('_', " "))
            }
        }
    }
}
