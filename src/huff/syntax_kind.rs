//! Syntax kinds of the Huff grammar
//!
//! Discriminants are the grammar's symbol ids, so a kind converts to and
//! from a [`Symbol`] or a rowan kind without a lookup table.

use crate::language::Symbol;

/// All syntax kinds (tokens and nodes) of Huff
///
/// Tokens are leaves (identifiers, keywords, punctuation, trivia).
/// Nodes are composite (declarations, bodies, parameter lists).
/// Hidden nodes (leading `_` in their name) never appear in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // RESERVED (end of input, recovery)
    // =========================================================================
    END = 0,
    ERROR = 1,

    // =========================================================================
    // TRIVIA (extras, allowed between any two tokens)
    // =========================================================================
    WHITESPACE,
    COMMENT,      // // line or /* block */
    NATSPEC,      // /// line or /** block */

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENTIFIER,
    NUMBER,         // 42, 0x2a, 1_000
    STRING_LITERAL, // "hello" or 'hello'
    OPCODE,         // add, mstore, push32, ...
    PRIMITIVE_TYPE, // address, uint256, bytes4, ...

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    HASH_DEFINE,          // #define
    HASH_INCLUDE,         // #include
    HASH_BRACKET,         // #[
    L_PAREN,              // (
    R_PAREN,              // )
    L_BRACE,              // {
    R_BRACE,              // }
    L_BRACKET,            // [
    R_BRACKET,            // ]
    L_ANGLE,              // <
    R_ANGLE,              // >
    COMMA,                // ,
    COLON,                // :
    EQ,                   // =
    FREE_STORAGE_POINTER, // FREE_STORAGE_POINTER()

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    MACRO_KW,
    FN_KW,
    TAKES_KW,
    RETURNS_KW,
    CONSTANT_KW,
    ERROR_KW,
    EVENT_KW,
    FUNCTION_KW,
    JUMPTABLE_KW,
    JUMPTABLE_PACKED_KW,
    TABLE_KW,
    TEST_KW,
    PURE_KW,
    VIEW_KW,
    NONPAYABLE_KW,
    PAYABLE_KW,
    CALLDATA_KW,
    INDEXED_KW,
    MEMORY_KW,
    STORAGE_KW,
    CODESIZE_KW,
    ERROR_HASH_KW,
    EVENT_HASH_KW,
    FUNC_SIG_KW,
    RIGHTPAD_KW,
    TABLESTART_KW,
    TABLESIZE_KW,

    // =========================================================================
    // NODES
    // =========================================================================
    SOURCE_FILE,
    DECLARATION,
    DECORATOR,
    DECORATOR_ITEM,
    IMPORT,
    MACRO,
    FN,
    JUMPTABLE,
    JUMPTABLE_PACKED,
    JUMPTABLE_BODY,
    ERROR_DEF,
    FUNCTION,
    PARAMETER_LIST,
    PARAMETER,
    EVENT,
    VISIBILITY,
    LOCATION,
    TYPE,
    CONSTANT,
    MACRO_CALL,
    REFERENCED_PARAMETER,
    REFERENCED_CONSTANT,
    JUMPDEST,
    JUMPDEST_LABEL,
    MACRO_BODY,
    TABLE,
    TEST,
    BUILTIN_FUNCTION,

    // =========================================================================
    // HIDDEN (spliced into their parent)
    // =========================================================================
    _DEFINITIONS,
    _DEFINITION,
    _DECORATOR_ITEMS,
    _DECORATOR_ARGS,
    _DECORATOR_ARG,
    _MACRO_SIGNATURE,
    _PARAMETER_NAMES,
    _JUMPDESTS,
    _PARAMETERS,
    _ARRAY_DIMENSIONS,
    _CALL_ARGS,
    _CALL_ARG,
    _BODY_ITEMS,
    _BODY_ITEM,
    _HASH_ARG,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    pub const fn symbol(self) -> Symbol {
        Symbol(self as u16)
    }

    /// The kind of a grammar symbol. `None` for the augmented start symbol
    /// and anything past it.
    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        (symbol.0 < Self::__LAST as u16).then(|| Self::from(rowan::SyntaxKind(symbol.0)))
    }

    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::COMMENT | Self::NATSPEC)
    }

    /// Check if this is a keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::MACRO_KW as u16) && (self as u16) <= (Self::TABLESIZE_KW as u16)
    }

    /// Check if this is a punctuation token
    pub fn is_punct(self) -> bool {
        (Self::HASH_DEFINE as u16..=Self::FREE_STORAGE_POINTER as u16).contains(&(self as u16))
    }

    /// Check if this is a literal
    pub fn is_literal(self) -> bool {
        matches!(self, Self::IDENTIFIER | Self::NUMBER | Self::STRING_LITERAL)
    }

    pub fn is_token(self) -> bool {
        (self as u16) < (Self::SOURCE_FILE as u16)
    }
}

impl From<SyntaxKind> for Symbol {
    fn from(kind: SyntaxKind) -> Self {
        kind.symbol()
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: discriminants are contiguous from 0 and checked above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HuffLanguage {}

impl rowan::Language for HuffLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<HuffLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<HuffLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<HuffLanguage>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<HuffLanguage>;
