//! The Huff grammar
//!
//! ```text
//! source_file  := (declaration | decorator | import)*
//! declaration  := '#define' (constant | error | event | fn | function
//!                 | jumptable | jumptable__packed | macro | table | test)
//! macro / fn   := name '(' names? ')' '=' 'takes' '(' n ')' ('returns' '(' n ')')? macro_body
//! macro_body   := '{' (opcode | number | jumpdest | label ':' | call | [CONST] | <param>
//!                 | builtin)* '}'
//! ```
//!
//! Comments and natspec are extras, found by the external scanner.

use crate::language::{GrammarBuilder, GrammarError, Language, RuleHandle, TokenPattern};
use crate::lexer::Cursor;

use super::keywords;
use super::scanner::CommentScanner;
use super::syntax_kind::SyntaxKind::{self, *};

pub(super) fn build() -> Result<Language, GrammarError> {
    let mut grammar = GrammarBuilder::new("huff");
    tokens(&mut grammar);
    nodes(&mut grammar);
    definitions(&mut grammar);
    macros(&mut grammar);
    abi(&mut grammar);
    bodies(&mut grammar);

    grammar
        .start(SOURCE_FILE.symbol())
        .extras(&[WHITESPACE.symbol(), COMMENT.symbol(), NATSPEC.symbol()])
        .sync(&[
            _DEFINITION.symbol(),
            _BODY_ITEM.symbol(),
            PARAMETER.symbol(),
            JUMPDEST.symbol(),
        ])
        .keywords(keywords::classify)
        .external_scanner(CommentScanner::boxed);
    grammar.build()
}

fn rule<'g>(
    grammar: &'g mut GrammarBuilder,
    lhs: SyntaxKind,
    rhs: &[SyntaxKind],
) -> RuleHandle<'g> {
    let rhs: Vec<_> = rhs.iter().map(|kind| kind.symbol()).collect();
    grammar.rule(lhs.symbol(), &rhs)
}

// =============================================================================
// TOKENS
// =============================================================================

fn tokens(grammar: &mut GrammarBuilder) {
    grammar
        .anonymous(WHITESPACE.symbol(), "whitespace", TokenPattern::Matcher(whitespace))
        .token(COMMENT.symbol(), "comment", TokenPattern::External)
        .token(NATSPEC.symbol(), "natspec", TokenPattern::External)
        .token(IDENTIFIER.symbol(), "identifier", TokenPattern::Word(identifier))
        .token(NUMBER.symbol(), "number", TokenPattern::Matcher(number))
        .token(STRING_LITERAL.symbol(), "string_literal", TokenPattern::Matcher(string_literal))
        .token(OPCODE.symbol(), "opcode", TokenPattern::Keyword)
        .token(PRIMITIVE_TYPE.symbol(), "primitive_type", TokenPattern::Keyword);

    let punctuation = [
        (HASH_DEFINE, "#define"),
        (HASH_INCLUDE, "#include"),
        (HASH_BRACKET, "#["),
        (L_PAREN, "("),
        (R_PAREN, ")"),
        (L_BRACE, "{"),
        (R_BRACE, "}"),
        (L_BRACKET, "["),
        (R_BRACKET, "]"),
        (L_ANGLE, "<"),
        (R_ANGLE, ">"),
        (COMMA, ","),
        (COLON, ":"),
        (EQ, "="),
        (FREE_STORAGE_POINTER, "FREE_STORAGE_POINTER()"),
    ];
    for (kind, text) in punctuation {
        grammar.literal(kind.symbol(), text);
    }

    let keywords = [
        (MACRO_KW, "macro"),
        (FN_KW, "fn"),
        (TAKES_KW, "takes"),
        (RETURNS_KW, "returns"),
        (CONSTANT_KW, "constant"),
        (ERROR_KW, "error"),
        (EVENT_KW, "event"),
        (FUNCTION_KW, "function"),
        (JUMPTABLE_KW, "jumptable"),
        (JUMPTABLE_PACKED_KW, "jumptable__packed"),
        (TABLE_KW, "table"),
        (TEST_KW, "test"),
        (PURE_KW, "pure"),
        (VIEW_KW, "view"),
        (NONPAYABLE_KW, "nonpayable"),
        (PAYABLE_KW, "payable"),
        (CALLDATA_KW, "calldata"),
        (INDEXED_KW, "indexed"),
        (MEMORY_KW, "memory"),
        (STORAGE_KW, "storage"),
        (CODESIZE_KW, "__codesize"),
        (ERROR_HASH_KW, "__ERROR"),
        (EVENT_HASH_KW, "__EVENT_HASH"),
        (FUNC_SIG_KW, "__FUNC_SIG"),
        (RIGHTPAD_KW, "__RIGHTPAD"),
        (TABLESTART_KW, "__tablestart"),
        (TABLESIZE_KW, "__tablesize"),
    ];
    for (kind, text) in keywords {
        grammar.anonymous(kind.symbol(), text, TokenPattern::Keyword);
    }
}

fn nodes(grammar: &mut GrammarBuilder) {
    let visible = [
        (SOURCE_FILE, "source_file"),
        (DECLARATION, "declaration"),
        (DECORATOR, "decorator"),
        (DECORATOR_ITEM, "decorator_item"),
        (IMPORT, "import"),
        (MACRO, "macro"),
        (FN, "fn"),
        (JUMPTABLE, "jumptable"),
        (JUMPTABLE_PACKED, "jumptable_packed"),
        (JUMPTABLE_BODY, "jumptable_body"),
        (ERROR_DEF, "error"),
        (FUNCTION, "function"),
        (PARAMETER_LIST, "parameter_list"),
        (PARAMETER, "parameter"),
        (EVENT, "event"),
        (VISIBILITY, "visibility"),
        (LOCATION, "location"),
        (TYPE, "type"),
        (CONSTANT, "constant"),
        (MACRO_CALL, "macro_call"),
        (REFERENCED_PARAMETER, "referenced_parameter"),
        (REFERENCED_CONSTANT, "referenced_constant"),
        (JUMPDEST, "jumpdest"),
        (JUMPDEST_LABEL, "jumpdest_label"),
        (MACRO_BODY, "macro_body"),
        (TABLE, "table"),
        (TEST, "test"),
        (BUILTIN_FUNCTION, "builtin_function"),
    ];
    for (kind, name) in visible {
        grammar.node(kind.symbol(), name);
    }

    let hidden = [
        (_DEFINITIONS, "_definitions"),
        (_DEFINITION, "_definition"),
        (_DECORATOR_ITEMS, "_decorator_items"),
        (_DECORATOR_ARGS, "_decorator_args"),
        (_DECORATOR_ARG, "_decorator_arg"),
        (_MACRO_SIGNATURE, "_macro_signature"),
        (_PARAMETER_NAMES, "_parameter_names"),
        (_JUMPDESTS, "_jumpdests"),
        (_PARAMETERS, "_parameters"),
        (_ARRAY_DIMENSIONS, "_array_dimensions"),
        (_CALL_ARGS, "_call_args"),
        (_CALL_ARG, "_call_arg"),
        (_BODY_ITEMS, "_body_items"),
        (_BODY_ITEM, "_body_item"),
        (_HASH_ARG, "_hash_arg"),
    ];
    for (kind, name) in hidden {
        grammar.hidden(kind.symbol(), name);
    }
}

// =============================================================================
// TOP LEVEL
// =============================================================================

fn definitions(grammar: &mut GrammarBuilder) {
    rule(grammar, SOURCE_FILE, &[]);
    rule(grammar, SOURCE_FILE, &[_DEFINITIONS]);
    rule(grammar, _DEFINITIONS, &[_DEFINITION]);
    rule(grammar, _DEFINITIONS, &[_DEFINITIONS, _DEFINITION]);
    for definition in [DECLARATION, DECORATOR, IMPORT] {
        rule(grammar, _DEFINITION, &[definition]);
    }

    for declared in [
        CONSTANT,
        ERROR_DEF,
        EVENT,
        FN,
        FUNCTION,
        JUMPTABLE,
        JUMPTABLE_PACKED,
        MACRO,
        TABLE,
        TEST,
    ] {
        rule(grammar, DECLARATION, &[HASH_DEFINE, declared]);
    }

    rule(grammar, IMPORT, &[HASH_INCLUDE, STRING_LITERAL]);

    rule(grammar, DECORATOR, &[HASH_BRACKET, _DECORATOR_ITEMS, R_BRACKET]);
    rule(grammar, _DECORATOR_ITEMS, &[DECORATOR_ITEM]);
    rule(grammar, _DECORATOR_ITEMS, &[_DECORATOR_ITEMS, COMMA, DECORATOR_ITEM]);
    rule(grammar, DECORATOR_ITEM, &[IDENTIFIER]);
    rule(grammar, DECORATOR_ITEM, &[IDENTIFIER, L_PAREN, _DECORATOR_ARGS, R_PAREN]);
    rule(grammar, _DECORATOR_ARGS, &[_DECORATOR_ARG]);
    rule(grammar, _DECORATOR_ARGS, &[_DECORATOR_ARGS, COMMA, _DECORATOR_ARG]);
    for arg in [STRING_LITERAL, NUMBER, IDENTIFIER] {
        rule(grammar, _DECORATOR_ARG, &[arg]);
    }

    rule(grammar, CONSTANT, &[CONSTANT_KW, IDENTIFIER, EQ, NUMBER]);
    rule(grammar, CONSTANT, &[CONSTANT_KW, IDENTIFIER, EQ, BUILTIN_FUNCTION]);
}

// =============================================================================
// MACROS, TABLES, TESTS
// =============================================================================

fn macros(grammar: &mut GrammarBuilder) {
    rule(grammar, MACRO, &[MACRO_KW, IDENTIFIER, _MACRO_SIGNATURE, MACRO_BODY]);
    rule(grammar, FN, &[FN_KW, IDENTIFIER, _MACRO_SIGNATURE, MACRO_BODY]);

    let takes = [EQ, TAKES_KW, L_PAREN, NUMBER, R_PAREN];
    let returns = [RETURNS_KW, L_PAREN, NUMBER, R_PAREN];
    for parameters in [&[L_PAREN, R_PAREN][..], &[L_PAREN, _PARAMETER_NAMES, R_PAREN]] {
        let signature: Vec<_> = parameters.iter().chain(&takes).copied().collect();
        rule(grammar, _MACRO_SIGNATURE, &signature);
        let signature: Vec<_> = signature.iter().chain(&returns).copied().collect();
        rule(grammar, _MACRO_SIGNATURE, &signature);
    }
    rule(grammar, _PARAMETER_NAMES, &[IDENTIFIER]);
    rule(grammar, _PARAMETER_NAMES, &[_PARAMETER_NAMES, COMMA, IDENTIFIER]);

    rule(grammar, TABLE, &[TABLE_KW, IDENTIFIER, MACRO_BODY]);

    rule(grammar, TEST, &[TEST_KW, IDENTIFIER, EQ, MACRO_BODY]);
    rule(grammar, TEST, &[TEST_KW, IDENTIFIER, L_PAREN, R_PAREN, EQ, MACRO_BODY]);
    rule(grammar, TEST, &[TEST_KW, IDENTIFIER, L_PAREN, _PARAMETER_NAMES, R_PAREN, EQ, MACRO_BODY]);

    rule(grammar, JUMPTABLE, &[JUMPTABLE_KW, IDENTIFIER, JUMPTABLE_BODY]);
    rule(grammar, JUMPTABLE_PACKED, &[JUMPTABLE_PACKED_KW, IDENTIFIER, JUMPTABLE_BODY]);
    rule(grammar, JUMPTABLE_BODY, &[L_BRACE, R_BRACE]);
    rule(grammar, JUMPTABLE_BODY, &[L_BRACE, _JUMPDESTS, R_BRACE]);
    rule(grammar, _JUMPDESTS, &[JUMPDEST]);
    rule(grammar, _JUMPDESTS, &[_JUMPDESTS, JUMPDEST]);
}

// =============================================================================
// ABI DECLARATIONS
// =============================================================================

fn abi(grammar: &mut GrammarBuilder) {
    rule(grammar, ERROR_DEF, &[ERROR_KW, IDENTIFIER, PARAMETER_LIST]);
    rule(grammar, EVENT, &[EVENT_KW, IDENTIFIER, PARAMETER_LIST]);
    rule(
        grammar,
        FUNCTION,
        &[FUNCTION_KW, IDENTIFIER, PARAMETER_LIST, VISIBILITY, RETURNS_KW, PARAMETER_LIST],
    );

    rule(grammar, PARAMETER_LIST, &[L_PAREN, R_PAREN]);
    rule(grammar, PARAMETER_LIST, &[L_PAREN, _PARAMETERS, R_PAREN]);
    rule(grammar, _PARAMETERS, &[PARAMETER]);
    rule(grammar, _PARAMETERS, &[_PARAMETERS, COMMA, PARAMETER]);

    rule(grammar, PARAMETER, &[TYPE]);
    rule(grammar, PARAMETER, &[TYPE, LOCATION]);
    rule(grammar, PARAMETER, &[TYPE, IDENTIFIER]);
    rule(grammar, PARAMETER, &[TYPE, LOCATION, IDENTIFIER]);

    rule(grammar, TYPE, &[PRIMITIVE_TYPE]);
    rule(grammar, TYPE, &[PRIMITIVE_TYPE, _ARRAY_DIMENSIONS]);
    rule(grammar, _ARRAY_DIMENSIONS, &[L_BRACKET, R_BRACKET]);
    rule(grammar, _ARRAY_DIMENSIONS, &[L_BRACKET, NUMBER, R_BRACKET]);
    rule(grammar, _ARRAY_DIMENSIONS, &[_ARRAY_DIMENSIONS, L_BRACKET, R_BRACKET]);
    rule(grammar, _ARRAY_DIMENSIONS, &[_ARRAY_DIMENSIONS, L_BRACKET, NUMBER, R_BRACKET]);

    for keyword in [PURE_KW, VIEW_KW, NONPAYABLE_KW, PAYABLE_KW] {
        rule(grammar, VISIBILITY, &[keyword]);
    }
    for keyword in [CALLDATA_KW, INDEXED_KW, MEMORY_KW, STORAGE_KW] {
        rule(grammar, LOCATION, &[keyword]);
    }
}

// =============================================================================
// MACRO BODIES
// =============================================================================

fn bodies(grammar: &mut GrammarBuilder) {
    rule(grammar, MACRO_BODY, &[L_BRACE, R_BRACE]);
    rule(grammar, MACRO_BODY, &[L_BRACE, _BODY_ITEMS, R_BRACE]);
    rule(grammar, _BODY_ITEMS, &[_BODY_ITEM]);
    rule(grammar, _BODY_ITEMS, &[_BODY_ITEMS, _BODY_ITEM]);
    for item in [
        BUILTIN_FUNCTION,
        JUMPDEST,
        JUMPDEST_LABEL,
        MACRO_CALL,
        NUMBER,
        OPCODE,
        REFERENCED_CONSTANT,
        REFERENCED_PARAMETER,
    ] {
        rule(grammar, _BODY_ITEM, &[item]);
    }

    rule(grammar, JUMPDEST, &[IDENTIFIER]);
    rule(grammar, JUMPDEST_LABEL, &[IDENTIFIER, COLON]);

    rule(grammar, MACRO_CALL, &[IDENTIFIER, L_PAREN, R_PAREN]);
    rule(grammar, MACRO_CALL, &[IDENTIFIER, L_PAREN, _CALL_ARGS, R_PAREN]);
    rule(grammar, _CALL_ARGS, &[_CALL_ARG]);
    rule(grammar, _CALL_ARGS, &[_CALL_ARGS, COMMA, _CALL_ARG]);
    rule(grammar, _CALL_ARG, &[NUMBER]);
    rule(grammar, _CALL_ARG, &[IDENTIFIER]);

    rule(grammar, REFERENCED_PARAMETER, &[L_ANGLE, IDENTIFIER, R_ANGLE]);
    rule(grammar, REFERENCED_CONSTANT, &[L_BRACKET, IDENTIFIER, R_BRACKET]);

    for (keyword, arg) in [
        (CODESIZE_KW, IDENTIFIER),
        (ERROR_HASH_KW, _HASH_ARG),
        (EVENT_HASH_KW, _HASH_ARG),
        (FUNC_SIG_KW, _HASH_ARG),
        (RIGHTPAD_KW, NUMBER),
        (TABLESTART_KW, IDENTIFIER),
        (TABLESIZE_KW, IDENTIFIER),
    ] {
        rule(grammar, BUILTIN_FUNCTION, &[keyword, L_PAREN, arg, R_PAREN]);
    }
    rule(grammar, BUILTIN_FUNCTION, &[FREE_STORAGE_POINTER]);
    rule(grammar, _HASH_ARG, &[IDENTIFIER]);
    rule(grammar, _HASH_ARG, &[STRING_LITERAL]);
}

// =============================================================================
// MATCHERS
// =============================================================================

fn whitespace(cursor: &mut dyn Cursor) -> bool {
    let mut matched = false;
    while cursor.peek().is_some_and(char::is_whitespace) {
        cursor.advance();
        matched = true;
    }
    matched
}

fn identifier(cursor: &mut dyn Cursor) -> bool {
    if !cursor.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
        return false;
    }
    while cursor.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
        cursor.advance();
    }
    true
}

/// `\d(_?\d)*` or `0[xX][\da-fA-F](_?[\da-fA-F])*`.
fn number(cursor: &mut dyn Cursor) -> bool {
    let Some(first) = cursor.peek().filter(char::is_ascii_digit) else {
        return false;
    };
    cursor.advance();
    cursor.mark_end();
    if first == '0' && matches!(cursor.peek(), Some('x' | 'X')) {
        cursor.advance();
        if cursor.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            cursor.advance();
            cursor.mark_end();
            digit_run(cursor, |c| c.is_ascii_hexdigit());
        }
        return true;
    }
    digit_run(cursor, |c| c.is_ascii_digit());
    true
}

/// Consume `(_?digit)*`, marking the end after every digit.
fn digit_run(cursor: &mut dyn Cursor, is_digit: fn(char) -> bool) {
    loop {
        if cursor.peek() == Some('_') {
            cursor.advance();
        }
        if !cursor.peek().is_some_and(is_digit) {
            return;
        }
        cursor.advance();
        cursor.mark_end();
    }
}

/// Double or single quoted, with backslash escapes. Unterminated strings do
/// not match.
fn string_literal(cursor: &mut dyn Cursor) -> bool {
    let Some(quote) = cursor.peek().filter(|&c| c == '"' || c == '\'') else {
        return false;
    };
    cursor.advance();
    while let Some(c) = cursor.peek() {
        cursor.advance();
        match c {
            '\\' => cursor.advance(),
            c if c == quote => return true,
            _ => {}
        }
    }
    false
}
