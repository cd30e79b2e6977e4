//! Parsing valid Huff sources.

use huff::huff::{SyntaxKind, parse};
use rstest::rstest;

use crate::helpers::assertions::{assert_covers, assert_well_formed};
use crate::helpers::fixtures::{MINIMAL_MACRO, SNIPPETS, TOKEN};

fn kinds_below(text: &str, kind: SyntaxKind) -> Vec<String> {
    let tree = parse(text);
    let mut found = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == kind.symbol() {
            found.push(node.text().to_string());
        }
        stack.extend(node.children());
    }
    found.sort();
    found
}

#[test]
fn test_token_contract_parses_cleanly() {
    let tree = parse(TOKEN);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert!(tree.errors().is_empty());
    assert_covers(&tree, TOKEN);
    assert_well_formed(tree.root_node());
    assert_eq!(tree.root_node().kind_name(), "source_file");
}

#[rstest]
#[case::empty(0)]
#[case::comment(1)]
#[case::include(2)]
#[case::constant(3)]
#[case::storage_pointer(4)]
#[case::error(5)]
#[case::event(6)]
#[case::function(7)]
#[case::macro_without_returns(8)]
#[case::macro_body_items(9)]
#[case::packed_jumptable(10)]
#[case::empty_table(11)]
#[case::test_without_parens(12)]
#[case::decorated_test(13)]
fn test_snippet_parses_cleanly(#[case] index: usize) {
    let text = SNIPPETS[index];
    let tree = parse(text);
    assert!(!tree.has_error(), "{text:?}: {}", tree.to_sexp());
    assert_covers(&tree, text);
}

#[test]
fn test_minimal_macro_shape() {
    let tree = parse(MINIMAL_MACRO);
    assert_eq!(
        tree.to_sexp(),
        "(source_file (declaration (macro (identifier) (number) (number) (macro_body (opcode)))))"
    );
}

#[test]
fn test_function_shape() {
    let tree = parse("#define function f(uint256[] memory, address a) view returns (bool)");
    assert_eq!(
        tree.to_sexp(),
        "(source_file (declaration (function (identifier) \
         (parameter_list (parameter (type (primitive_type)) (location)) \
         (parameter (type (primitive_type)) (identifier))) \
         (visibility) \
         (parameter_list (parameter (type (primitive_type)))))))"
    );
}

#[test]
fn test_empty_file_is_an_empty_source_file() {
    let tree = parse("");
    assert_eq!(tree.to_sexp(), "(source_file)");
    assert!(!tree.has_error());
}

// ============================================================================
// CONTEXTUAL KEYWORDS
// ============================================================================

#[test]
fn test_opcode_names_are_identifiers_where_a_name_is_expected() {
    let text = "#define macro add() = takes(0) returns(0) { add }";
    let tree = parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(kinds_below(text, SyntaxKind::IDENTIFIER), ["add"]);
    assert_eq!(kinds_below(text, SyntaxKind::OPCODE), ["add"]);
}

#[test]
fn test_address_is_a_type_or_an_opcode_by_context() {
    let text = "#define event E(address)\n#define macro M() = takes(0) { address }";
    let tree = parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(kinds_below(text, SyntaxKind::PRIMITIVE_TYPE), ["address"]);
    assert_eq!(kinds_below(text, SyntaxKind::OPCODE), ["address"]);
}

#[test]
fn test_longer_identifier_is_not_split_into_keyword() {
    let text = "#define macro M() = takes(0) { addr: addr }";
    assert_eq!(kinds_below(text, SyntaxKind::OPCODE), Vec::<String>::new());
    assert_eq!(kinds_below(text, SyntaxKind::JUMPDEST), ["addr"]);
    assert_eq!(kinds_below(text, SyntaxKind::JUMPDEST_LABEL), ["addr:"]);
}

#[test]
fn test_label_named_like_a_location_keyword() {
    let text = "#define macro M() = takes(0) { memory: memory }";
    let tree = parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(kinds_below(text, SyntaxKind::JUMPDEST), ["memory"]);
}

// ============================================================================
// COMMENTS
// ============================================================================

#[rstest]
#[case("// line\n", SyntaxKind::COMMENT)]
#[case("/* block */", SyntaxKind::COMMENT)]
#[case("/// @notice doc\n", SyntaxKind::NATSPEC)]
#[case("/** @dev doc */", SyntaxKind::NATSPEC)]
fn test_comments_are_extras(#[case] comment: &str, #[case] kind: SyntaxKind) {
    let text = format!("#define macro M() = takes(0) {{ {comment} stop }}");
    let tree = parse(&text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    let found = kinds_below(&text, kind);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].trim_end(), comment.trim_end());
}

#[test]
fn test_comment_between_tokens_of_a_declaration() {
    let text = "#define /* kind */ constant /* name */ X = 0x01";
    let tree = parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(kinds_below(text, SyntaxKind::COMMENT).len(), 2);
}

// ============================================================================
// ROWAN VIEW
// ============================================================================

#[test]
fn test_green_tree_is_lossless() {
    let parse = huff::huff::parse_typed(TOKEN);
    assert!(parse.ok());
    assert_eq!(parse.syntax().text().to_string(), TOKEN);
    assert_eq!(parse.syntax().kind(), SyntaxKind::SOURCE_FILE);
}
