//! Error-tolerant incremental GLR parser
//!
//! The parser is table driven: a [`Language`] supplies the LALR table with
//! multi-action cells and the contextual lexer. Conflicting actions fork the
//! parse into versions that run in lockstep and are merged when they reach
//! the same state at the same position.
//!
//! ## Architecture
//!
//! ```text
//! Text (str or chunks)
//!     ↓
//! Lexer (contextual, external scanner first) → lookahead token
//!     ↓                      ↑ old leaves / subtrees (reuse cursor)
//! Driver → versions on persistent stacks (fork / merge / prune)
//!     ↓ no version can shift
//! Recovery → extra, delete, insert MISSING, synchronize
//!     ↓
//! SyntaxTree (immutable, shared subtrees)
//! ```
//!
//! ## Incremental Reparsing
//!
//! When text changes, we:
//! 1. Shift the old tree to the edits, marking every touched node as changed
//! 2. Walk the old tree alongside the new parse, offering unchanged subtrees
//! 3. Push an offered subtree whole when the stack agrees with the state it
//!    was built in; otherwise descend into it, down to single leaves
//!
//! A parse never fails. Syntax problems end up in the tree as ERROR nodes
//! and MISSING tokens; see [`errors`] for turning them into diagnostics.

mod driver;
mod options;
mod recovery;
mod reuse;
mod stack;

pub mod errors;

pub use options::ParseOptions;
pub use stack::ErrorCost;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::language::Language;
use crate::lexer::{ChunkedCursor, StrCursor};
use crate::tree::{Edit, EditedTree, SyntaxTree};

use driver::Driver;
use reuse::ReuseCursor;

/// Caller contract violations on the reparse path. Parsing itself has no
/// failure outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReparseError {
    /// An edit whose end lies before its start.
    #[error("edit {index} is inverted: start {start}, old end {old_end}, new end {new_end}")]
    InvertedEdit {
        index: usize,
        start: usize,
        old_end: usize,
        new_end: usize,
    },

    /// An edit reaching past the text it applies to.
    #[error("edit {index} ends at {old_end}, past the end of the text ({len} bytes)")]
    EditOutOfBounds { index: usize, old_end: usize, len: usize },

    /// The new text does not have the length the edits produce.
    #[error("edits produce {expected} bytes but the new text has {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The new text differs from the old text somewhere no edit covers.
    #[error("text changed outside the edited ranges")]
    TextMismatch,
}

/// A parser for one language. Cheap to create and `Sync`: one parser may
/// serve any number of threads.
#[derive(Debug, Clone)]
pub struct Parser {
    language: &'static Language,
    options: ParseOptions,
}

impl Parser {
    pub fn new(language: &'static Language) -> Self {
        Self::with_options(language, ParseOptions::default())
    }

    pub fn with_options(language: &'static Language, options: ParseOptions) -> Self {
        Self { language, options }
    }

    pub fn language(&self) -> &'static Language {
        self.language
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse `text` from scratch. Always returns a tree covering every byte.
    pub fn parse(&self, text: &str) -> SyntaxTree {
        let root = Driver::new(self.language, &self.options, StrCursor::new(text), None).run();
        SyntaxTree::new(root, Arc::from(text), self.language)
    }

    /// Parse text held in several pieces, e.g. the lines of an editor buffer.
    pub fn parse_chunks(&self, chunks: &[&str]) -> SyntaxTree {
        let root = Driver::new(
            self.language,
            &self.options,
            ChunkedCursor::new(chunks.iter().copied()),
            None,
        )
        .run();
        SyntaxTree::new(root, Arc::from(chunks.concat()), self.language)
    }

    /// Parse `text`, the result of applying `edits` in order to the text of
    /// `old`, reusing every subtree of `old` the edits left intact.
    ///
    /// With no edits the old tree is returned as-is. Text that differs from
    /// the old text outside the edited ranges is rejected.
    pub fn reparse(
        &self,
        old: &SyntaxTree,
        edits: &[Edit],
        text: &str,
    ) -> Result<SyntaxTree, ReparseError> {
        if edits.is_empty() {
            return if old.text() == text {
                Ok(old.clone())
            } else {
                Err(ReparseError::TextMismatch)
            };
        }
        let edited = old.edit(edits)?;
        self.reparse_edited(edited, text)
    }

    /// Reparse from a tree already adjusted with [`SyntaxTree::edit`].
    pub fn reparse_edited(
        &self,
        edited: EditedTree,
        text: &str,
    ) -> Result<SyntaxTree, ReparseError> {
        edited.check_text(text)?;
        debug!(dirty = edited.log().ranges().len(), len = text.len(), "reparse");
        let reuse = ReuseCursor::new(edited.root, edited.log);
        let cursor = StrCursor::new(text);
        let root = Driver::new(self.language, &self.options, cursor, Some(reuse)).run();
        Ok(SyntaxTree::new(root, Arc::from(text), self.language))
    }
}
