//! External scanner for Huff comments
//!
//! `//` and `/* */` are comments; `///` and `/** */` are natspec. `/**/` is
//! an empty block comment, not natspec. A block comment that never closes is
//! left to the lexer, which reports it as invalid text.

use crate::language::{Symbol, SymbolSet};
use crate::lexer::{Cursor, ExternalScanner};

use super::syntax_kind::SyntaxKind;

#[derive(Debug, Default)]
pub struct CommentScanner;

impl CommentScanner {
    pub fn boxed() -> Box<dyn ExternalScanner> {
        Box::new(Self)
    }
}

impl ExternalScanner for CommentScanner {
    fn scan(&mut self, cursor: &mut dyn Cursor, valid: &SymbolSet) -> Option<Symbol> {
        let comment = SyntaxKind::COMMENT.symbol();
        let natspec = SyntaxKind::NATSPEC.symbol();
        if !valid.contains(comment) && !valid.contains(natspec) {
            return None;
        }
        if cursor.peek() != Some('/') {
            return None;
        }
        cursor.advance();

        let kind = match cursor.peek() {
            Some('/') => {
                cursor.advance();
                let doc = cursor.peek() == Some('/');
                while cursor.peek().is_some_and(|c| c != '\n') {
                    cursor.advance();
                }
                if doc { natspec } else { comment }
            }
            Some('*') => {
                cursor.advance();
                let doc = match cursor.peek() {
                    Some('*') => {
                        cursor.advance();
                        if cursor.peek() == Some('/') {
                            cursor.advance();
                            cursor.mark_end();
                            return valid.contains(comment).then_some(comment);
                        }
                        true
                    }
                    _ => false,
                };
                if !skip_block(cursor) {
                    return None;
                }
                if doc { natspec } else { comment }
            }
            _ => return None,
        };
        cursor.mark_end();
        valid.contains(kind).then_some(kind)
    }

    fn serialize(&self) -> Vec<u8> {
        Vec::new()
    }

    fn deserialize(&mut self, _state: &[u8]) {}
}

/// Advance past the closing `*/`. `false` at end of input.
fn skip_block(cursor: &mut dyn Cursor) -> bool {
    let mut star = false;
    while let Some(c) = cursor.peek() {
        cursor.advance();
        if star && c == '/' {
            return true;
        }
        star = c == '*';
    }
    false
}
