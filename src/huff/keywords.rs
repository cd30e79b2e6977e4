//! Keyword classification for Huff words
//!
//! The lexer scans one word token and asks [`classify`] which keyword
//! terminals it may stand for. The parse state then picks the first one it
//! can shift, so `address` is a type in a parameter list and an opcode in a
//! macro body, and `takes` is a plain identifier everywhere it is not
//! expected as a keyword.

use logos::Logos;

use super::syntax_kind::SyntaxKind;
use crate::language::Symbol;

/// Huff keywords, recognized with logos over a single word
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // =========================================================================
    // DEFINITIONS
    // =========================================================================
    #[token("macro")]
    Macro,
    #[token("fn")]
    Fn,
    #[token("takes")]
    Takes,
    #[token("returns")]
    Returns,
    #[token("constant")]
    Constant,
    #[token("error")]
    Error,
    #[token("event")]
    Event,
    #[token("function")]
    Function,
    #[token("jumptable")]
    Jumptable,
    #[token("jumptable__packed")]
    JumptablePacked,
    #[token("table")]
    Table,
    #[token("test")]
    Test,

    // =========================================================================
    // VISIBILITY AND DATA LOCATION
    // =========================================================================
    #[token("pure")]
    Pure,
    #[token("view")]
    View,
    #[token("nonpayable")]
    Nonpayable,
    #[token("payable")]
    Payable,
    #[token("calldata")]
    Calldata,
    #[token("indexed")]
    Indexed,
    #[token("memory")]
    Memory,
    #[token("storage")]
    Storage,

    // =========================================================================
    // BUILTIN FUNCTIONS
    // =========================================================================
    #[token("__codesize")]
    Codesize,
    #[token("__ERROR")]
    ErrorHash,
    #[token("__EVENT_HASH")]
    EventHash,
    #[token("__FUNC_SIG")]
    FuncSig,
    #[token("__RIGHTPAD")]
    Rightpad,
    #[token("__tablestart")]
    Tablestart,
    #[token("__tablesize")]
    Tablesize,

    // =========================================================================
    // TYPES
    // =========================================================================
    /// Both a type and the `address` opcode
    #[token("address")]
    Address,
    #[token("bool")]
    #[token("bytes")]
    #[token("int")]
    #[token("string")]
    #[token("uint")]
    #[regex("u?int(8|16|24|32|40|48|56|64|72|80|88|96|104|112|120|128|136|144|152|160|168|176|184|192|200|208|216|224|232|240|248|256)")]
    #[regex("bytes([1-9]|[12][0-9]|3[0-2])")]
    PrimitiveType,

    // =========================================================================
    // OPCODES
    // =========================================================================
    // Arithmetic Ops
    #[token("add")]
    #[token("mul")]
    #[token("sub")]
    #[token("div")]
    #[token("sdiv")]
    #[token("mod")]
    #[token("smod")]
    #[token("addmod")]
    #[token("mulmod")]
    #[token("exp")]
    #[token("signextend")]
    // Comparison Ops
    #[token("lt")]
    #[token("gt")]
    #[token("slt")]
    #[token("sgt")]
    #[token("eq")]
    #[token("iszero")]
    // Bitwise Ops
    #[token("and")]
    #[token("or")]
    #[token("xor")]
    #[token("not")]
    #[token("byte")]
    #[token("shl")]
    #[token("shr")]
    #[token("sar")]
    // Keccak
    #[token("sha3")]
    // Environmental Ops
    #[token("balance")]
    #[token("origin")]
    #[token("caller")]
    #[token("callvalue")]
    #[token("calldataload")]
    #[token("calldatasize")]
    #[token("calldatacopy")]
    #[token("codesize")]
    #[token("codecopy")]
    #[token("gasprice")]
    #[token("extcodesize")]
    #[token("extcodecopy")]
    #[token("returndatasize")]
    #[token("returndatacopy")]
    #[token("extcodehash")]
    // Block Ops
    #[token("blockhash")]
    #[token("coinbase")]
    #[token("timestamp")]
    #[token("number")]
    #[token("prevrandao")]
    #[token("gaslimit")]
    #[token("chainid")]
    #[token("selfbalance")]
    #[token("basefee")]
    #[token("blobhash")]
    #[token("blobbasefee")]
    // Control Flow Ops
    #[token("stop")]
    #[token("jump")]
    #[token("jumpi")]
    #[token("pc")]
    #[token("gas")]
    #[token("jumpdest")]
    // Storage Ops
    #[token("sload")]
    #[token("sstore")]
    #[token("tload")]
    #[token("tstore")]
    // Stack Ops
    #[token("pop")]
    // Push Operations
    #[regex("push([0-9]|[12][0-9]|3[0-2])")]
    // Dup Operations
    #[regex("dup([1-9]|1[0-6])")]
    // Swap Operations
    #[regex("swap([1-9]|1[0-6])")]
    // Memory Operations
    #[token("mload")]
    #[token("mstore")]
    #[token("mstore8")]
    #[token("msize")]
    #[token("mcopy")]
    // Log Operations
    #[regex("log[0-4]")]
    // System Operations
    #[token("create")]
    #[token("call")]
    #[token("callcode")]
    #[token("return")]
    #[token("delegatecall")]
    #[token("create2")]
    #[token("staticcall")]
    #[token("revert")]
    #[token("selfdestruct")]
    Opcode,
}

const fn one(kind: SyntaxKind) -> [Symbol; 1] {
    [kind.symbol()]
}

const MACRO: [Symbol; 1] = one(SyntaxKind::MACRO_KW);
const FN: [Symbol; 1] = one(SyntaxKind::FN_KW);
const TAKES: [Symbol; 1] = one(SyntaxKind::TAKES_KW);
const RETURNS: [Symbol; 1] = one(SyntaxKind::RETURNS_KW);
const CONSTANT: [Symbol; 1] = one(SyntaxKind::CONSTANT_KW);
const ERROR: [Symbol; 1] = one(SyntaxKind::ERROR_KW);
const EVENT: [Symbol; 1] = one(SyntaxKind::EVENT_KW);
const FUNCTION: [Symbol; 1] = one(SyntaxKind::FUNCTION_KW);
const JUMPTABLE: [Symbol; 1] = one(SyntaxKind::JUMPTABLE_KW);
const JUMPTABLE_PACKED: [Symbol; 1] = one(SyntaxKind::JUMPTABLE_PACKED_KW);
const TABLE: [Symbol; 1] = one(SyntaxKind::TABLE_KW);
const TEST: [Symbol; 1] = one(SyntaxKind::TEST_KW);
const PURE: [Symbol; 1] = one(SyntaxKind::PURE_KW);
const VIEW: [Symbol; 1] = one(SyntaxKind::VIEW_KW);
const NONPAYABLE: [Symbol; 1] = one(SyntaxKind::NONPAYABLE_KW);
const PAYABLE: [Symbol; 1] = one(SyntaxKind::PAYABLE_KW);
const CALLDATA: [Symbol; 1] = one(SyntaxKind::CALLDATA_KW);
const INDEXED: [Symbol; 1] = one(SyntaxKind::INDEXED_KW);
const MEMORY: [Symbol; 1] = one(SyntaxKind::MEMORY_KW);
const STORAGE: [Symbol; 1] = one(SyntaxKind::STORAGE_KW);
const CODESIZE: [Symbol; 1] = one(SyntaxKind::CODESIZE_KW);
const ERROR_HASH: [Symbol; 1] = one(SyntaxKind::ERROR_HASH_KW);
const EVENT_HASH: [Symbol; 1] = one(SyntaxKind::EVENT_HASH_KW);
const FUNC_SIG: [Symbol; 1] = one(SyntaxKind::FUNC_SIG_KW);
const RIGHTPAD: [Symbol; 1] = one(SyntaxKind::RIGHTPAD_KW);
const TABLESTART: [Symbol; 1] = one(SyntaxKind::TABLESTART_KW);
const TABLESIZE: [Symbol; 1] = one(SyntaxKind::TABLESIZE_KW);
const ADDRESS: [Symbol; 2] = [SyntaxKind::PRIMITIVE_TYPE.symbol(), SyntaxKind::OPCODE.symbol()];
const PRIMITIVE_TYPE: [Symbol; 1] = one(SyntaxKind::PRIMITIVE_TYPE);
const OPCODE: [Symbol; 1] = one(SyntaxKind::OPCODE);

impl Keyword {
    /// Terminals this keyword can be, most specific first.
    pub fn symbols(self) -> &'static [Symbol] {
        match self {
            Self::Macro => &MACRO,
            Self::Fn => &FN,
            Self::Takes => &TAKES,
            Self::Returns => &RETURNS,
            Self::Constant => &CONSTANT,
            Self::Error => &ERROR,
            Self::Event => &EVENT,
            Self::Function => &FUNCTION,
            Self::Jumptable => &JUMPTABLE,
            Self::JumptablePacked => &JUMPTABLE_PACKED,
            Self::Table => &TABLE,
            Self::Test => &TEST,
            Self::Pure => &PURE,
            Self::View => &VIEW,
            Self::Nonpayable => &NONPAYABLE,
            Self::Payable => &PAYABLE,
            Self::Calldata => &CALLDATA,
            Self::Indexed => &INDEXED,
            Self::Memory => &MEMORY,
            Self::Storage => &STORAGE,
            Self::Codesize => &CODESIZE,
            Self::ErrorHash => &ERROR_HASH,
            Self::EventHash => &EVENT_HASH,
            Self::FuncSig => &FUNC_SIG,
            Self::Rightpad => &RIGHTPAD,
            Self::Tablestart => &TABLESTART,
            Self::Tablesize => &TABLESIZE,
            Self::Address => &ADDRESS,
            Self::PrimitiveType => &PRIMITIVE_TYPE,
            Self::Opcode => &OPCODE,
        }
    }
}

/// Parse a whole word as a keyword. `None` if any part of it is left over.
pub fn keyword(word: &str) -> Option<Keyword> {
    let mut lexer = Keyword::lexer(word);
    let keyword = lexer.next()?.ok()?;
    (lexer.span().end == word.len()).then_some(keyword)
}

/// Keyword classifier handed to the grammar.
pub fn classify(word: &str) -> &'static [Symbol] {
    keyword(word).map_or(&[], Keyword::symbols)
}

/// Check if a word is an EVM opcode mnemonic
pub fn is_opcode(word: &str) -> bool {
    matches!(keyword(word), Some(Keyword::Opcode | Keyword::Address))
}
