//! Huff language tests
//!
//! Tests for the Huff grammar on top of the engine:
//! - Parsing every kind of definition
//! - Contextual keywords and comments
//! - Typed AST accessors
//! - Recovery and diagnostics on broken sources
//! - Incremental reparsing of realistic edits

pub mod tests_ast;
pub mod tests_incremental;
pub mod tests_parse;
pub mod tests_recovery;
