//! A small expression grammar for exercising the engine without Huff.
//!
//! ```text
//! expr    := _expr
//! _expr   := _expr '+' _expr      left 1
//!          | product
//!          | _expr '-' _expr      no precedence: the driver forks
//!          | '(' _expr ')'
//!          | identifier
//! product := _expr '*' _expr      left 2
//! ```

use huff::language::{GrammarBuilder, Language, Symbol, TokenPattern};
use huff::lexer::Cursor;
use huff::{ParseOptions, Parser};
use once_cell::sync::Lazy;

pub const WHITESPACE: Symbol = Symbol(2);
pub const IDENT: Symbol = Symbol(3);
pub const PLUS: Symbol = Symbol(4);
pub const STAR: Symbol = Symbol(5);
pub const MINUS: Symbol = Symbol(6);
pub const L_PAREN: Symbol = Symbol(7);
pub const R_PAREN: Symbol = Symbol(8);
pub const EXPR: Symbol = Symbol(9);
pub const PRODUCT: Symbol = Symbol(10);
pub const HIDDEN_EXPR: Symbol = Symbol(11);

static CALC: Lazy<Language> = Lazy::new(|| build().expect("calc grammar builds"));

pub fn calc() -> &'static Language {
    &CALC
}

pub fn parser() -> Parser {
    Parser::new(calc())
}

pub fn parser_with(options: ParseOptions) -> Parser {
    Parser::with_options(calc(), options)
}

fn whitespace(cursor: &mut dyn Cursor) -> bool {
    let mut matched = false;
    while cursor.peek().is_some_and(|c| c == ' ' || c == '\n') {
        cursor.advance();
        matched = true;
    }
    matched
}

fn ident(cursor: &mut dyn Cursor) -> bool {
    let mut matched = false;
    while cursor.peek().is_some_and(|c| c.is_ascii_lowercase()) {
        cursor.advance();
        matched = true;
    }
    matched
}

fn build() -> Result<Language, huff::language::GrammarError> {
    let mut grammar = GrammarBuilder::new("calc");
    grammar
        .anonymous(WHITESPACE, "whitespace", TokenPattern::Matcher(whitespace))
        .token(IDENT, "identifier", TokenPattern::Matcher(ident))
        .literal(PLUS, "+")
        .literal(STAR, "*")
        .literal(MINUS, "-")
        .literal(L_PAREN, "(")
        .literal(R_PAREN, ")")
        .node(EXPR, "expr")
        .node(PRODUCT, "product")
        .hidden(HIDDEN_EXPR, "_expr")
        .start(EXPR)
        .extras(&[WHITESPACE]);
    grammar.rule(EXPR, &[HIDDEN_EXPR]);
    grammar.rule(HIDDEN_EXPR, &[HIDDEN_EXPR, PLUS, HIDDEN_EXPR]).left(1);
    grammar.rule(HIDDEN_EXPR, &[PRODUCT]);
    grammar.rule(HIDDEN_EXPR, &[HIDDEN_EXPR, MINUS, HIDDEN_EXPR]);
    grammar.rule(HIDDEN_EXPR, &[L_PAREN, HIDDEN_EXPR, R_PAREN]);
    grammar.rule(HIDDEN_EXPR, &[IDENT]);
    grammar.rule(PRODUCT, &[HIDDEN_EXPR, STAR, HIDDEN_EXPR]).left(2);
    grammar.build()
}
