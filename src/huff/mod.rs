//! The Huff language
//!
//! [`language`] returns the compiled grammar; it is built on first use and
//! shared by every parser in the process.
//!
//! ```text
//! language() ─► Parser::parse ─► SyntaxTree ─► green() ─► SyntaxNode ─► ast::SourceFile
//! ```

pub mod ast;
mod grammar;
pub mod keywords;
mod scanner;
mod syntax_kind;

pub use ast::AstNode;
pub use scanner::CommentScanner;
pub use syntax_kind::{
    HuffLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxNodeChildren, SyntaxToken,
};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use rowan::GreenNode;

use crate::language::Language;
use crate::parser::Parser;
use crate::parser::errors::SyntaxError;
use crate::tree::SyntaxTree;

static LANGUAGE: Lazy<Language> = Lazy::new(|| {
    grammar::build().unwrap_or_else(|err| panic!("the Huff grammar does not build: {err}"))
});

/// The compiled Huff grammar.
pub fn language() -> &'static Language {
    &LANGUAGE
}

/// A parsed Huff file: the engine's tree plus its typed rowan view
pub struct Parse {
    pub tree: SyntaxTree,
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    fn new(tree: SyntaxTree) -> Self {
        let green = tree.green();
        let errors = tree.errors();
        Self { tree, green, errors }
    }

    /// Get the root syntax node
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn source_file(&self) -> Option<ast::SourceFile> {
        ast::SourceFile::cast(self.syntax())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse Huff source into a syntax tree
pub fn parse(text: &str) -> SyntaxTree {
    Parser::new(language()).parse(text)
}

/// Parse Huff source with the typed rowan view and diagnostics
pub fn parse_typed(text: &str) -> Parse {
    Parse::new(parse(text))
}

/// Parse many files in parallel
pub fn parse_all(texts: &[&str]) -> Vec<SyntaxTree> {
    let parser = Parser::new(language());
    texts.par_iter().map(|text| parser.parse(text)).collect()
}
