//! Huff sources used across the test modules.

/// A small ERC20-like contract touching every kind of definition.
pub const TOKEN: &str = r#"#include "./utils/Ownable.huff"

/// @title Token
/* Interface */
#define function transfer(address,uint256) nonpayable returns (bool)
#define function balanceOf(address) view returns (uint256)
#define event Transfer(address indexed, address indexed, uint256)
#define error Unauthorized(address)

#define constant BALANCE_SLOT = FREE_STORAGE_POINTER()
#define constant MAX_SUPPLY = 0xffff_ffff

#define jumptable SELECTORS {
    transfer_dest balance_dest
}

#define table CODE_TABLE {
    0x600160026003
}

// Reverts unless the caller owns the contract.
#define macro ONLY_OWNER() = takes(0) returns(0) {
    [OWNER] sload caller eq is_owner jumpi
    0x00 dup1 revert
    is_owner:
}

#define fn ADD(a, b) = takes(0) returns(1) {
    <a> <b> add
}

#define macro MAIN() = takes(0) returns(0) {
    0x00 calldataload 0xe0 shr
    dup1 __FUNC_SIG(transfer) eq transfer_dest jumpi
    __FUNC_SIG("balanceOf(address)") eq balance_dest jumpi
    __tablesize(CODE_TABLE) __tablestart(CODE_TABLE) 0x00 codecopy
    0x00 dup1 revert
    transfer_dest:
        ONLY_OWNER()
        ADD(0x01, MAX_SUPPLY)
    balance_dest:
        stop
}

#[calldata("0x01"), value(1)]
#define test TEST_ADD() = {
    ADD(0x01, 0x02)
}
"#;

pub const MINIMAL_MACRO: &str = "#define macro MAIN() = takes(0) returns(0) { stop }";

/// Each line is a complete, valid file.
pub const SNIPPETS: &[&str] = &[
    "",
    "// only a comment",
    "#include \"lib.huff\"",
    "#define constant X = 0x01",
    "#define constant P = FREE_STORAGE_POINTER()",
    "#define error Bad()",
    "#define event Log(uint256[] memory data)",
    "#define function f(bytes32[2][], string calldata) pure returns ()",
    "#define macro M() = takes(1) { pop }",
    "#define macro M(x) = takes(0) returns(0) { <x> [X] __codesize(M) lbl: lbl }",
    "#define jumptable__packed T { a b c }",
    "#define table T {}",
    "#define test T = { }",
    "#[with_storage] #define test T(a) = { <a> }",
];
