//! # huff-syntax
//!
//! Incremental, error-tolerant GLR parsing engine, with a grammar for the
//! Huff EVM assembly language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! huff      → Huff grammar, keywords, comment scanner, typed AST
//!   ↓
//! parser    → GLR driver, error recovery, subtree reuse, diagnostics
//!   ↓
//! tree      → Immutable shared subtrees, edits, nodes
//!   ↓
//! lexer     → Contextual lexer, cursors, external scanners
//!   ↓
//! language  → Grammar description, LALR(1) table construction
//!   ↓
//! base      → Primitives (TextRange, LineIndex, Position)
//! ```
//!
//! ## Example
//!
//! ```
//! use huff::{Edit, Parser};
//!
//! let parser = Parser::new(huff::language());
//! let tree = parser.parse("#define macro MAIN() = takes(0) returns(0) { stop }");
//! assert!(!tree.has_error());
//!
//! let text = "#define macro MAIN() = takes(0) returns(0) { caller stop }";
//! let edit = Edit::insert(45, 7);
//! let tree = parser.reparse(&tree, &[edit], text).unwrap();
//! assert!(!tree.has_error());
//! ```

// ============================================================================
// MODULES (dependency order: base → language → lexer → tree → parser → huff)
// ============================================================================

/// Foundation types: TextRange, LineIndex, Position
pub mod base;

/// Grammar symbols, grammar builder and parse table
pub mod language;

/// Contextual lexer and external scanner interface
pub mod lexer;

/// Syntax trees, nodes and edits
pub mod tree;

/// The GLR parser and incremental reparser
pub mod parser;

/// The Huff grammar
pub mod huff;

pub use huff::language;

// Re-export the parsing surface
pub use language::{Language, Symbol};
pub use parser::{ParseOptions, Parser, ReparseError};
pub use tree::{Edit, Node, SyntaxTree};

// Re-export foundation types
pub use base::{LineCol, LineIndex, Position, Span, TextRange, TextSize};
