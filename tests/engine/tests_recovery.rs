//! Error recovery: MISSING insertion, ERROR nodes, and coverage of the
//! input no matter how broken it is.

use huff::ParseOptions;
use huff::parser::errors::ErrorCode;
use rstest::rstest;

use crate::helpers::assertions::{assert_covers, assert_well_formed, outermost_errors};
use crate::helpers::calc::{self, EXPR, IDENT};

#[test]
fn test_missing_operand_at_end() {
    let tree = calc::parser().parse("a+");
    assert_eq!(tree.to_sexp(), "(expr (identifier) (MISSING identifier))");
    let missing = tree
        .root_node()
        .children()
        .find(|child| child.is_missing())
        .unwrap();
    assert_eq!((missing.start_byte(), missing.end_byte()), (2, 2));
    assert_eq!(missing.kind(), IDENT);
}

#[test]
fn test_missing_operand_in_the_middle() {
    let tree = calc::parser().parse("a*+b");
    assert_eq!(
        tree.to_sexp(),
        "(expr (product (identifier) (MISSING identifier)) (identifier))"
    );
}

#[test]
fn test_missing_closing_paren() {
    let tree = calc::parser().parse("(a+b");
    assert!(tree.has_error());
    assert!(tree.to_sexp().contains("(MISSING \")\")"), "{}", tree.to_sexp());
}

#[test]
fn test_invalid_character_becomes_error_leaf() {
    let text = "a+$b";
    let tree = calc::parser().parse(text);
    assert_covers(&tree, text);
    let errors = outermost_errors(tree.root_node());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text(), "$");

    let diagnostics = tree.errors();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::E0101);
    assert!(diagnostics[0].message.contains("'$'"), "{}", diagnostics[0].message);
}

#[test]
fn test_run_of_invalid_characters_is_one_token() {
    let tree = calc::parser().parse("a+$%&b");
    let errors = outermost_errors(tree.root_node());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text(), "$%&");
}

#[test]
fn test_unexpected_token_is_wrapped_in_error() {
    let text = "a b";
    let tree = calc::parser().parse(text);
    assert!(tree.has_error());
    assert_covers(&tree, text);
    assert_eq!(tree.root_node().kind(), EXPR);
}

#[rstest]
#[case("")]
#[case("+")]
#[case(")")]
#[case("((((")]
#[case("a++++b")]
#[case("*a*")]
#[case("a b c d")]
#[case("$$$")]
#[case("a+(b*)c")]
fn test_broken_input_still_covers_the_text(#[case] text: &str) {
    let tree = calc::parser().parse(text);
    assert_covers(&tree, text);
    assert_well_formed(tree.root_node());
    assert_eq!(tree.root_node().kind(), EXPR);
    if !text.is_empty() {
        assert!(tree.has_error(), "{text:?} parsed cleanly: {}", tree.to_sexp());
        assert!(!tree.errors().is_empty());
    }
}

#[test]
fn test_valid_input_reports_no_diagnostics() {
    let tree = calc::parser().parse("(a+b)*c-d");
    assert!(tree.errors().is_empty());
}

#[test]
fn test_fast_options_never_insert_missing_tokens() {
    let tree = calc::parser_with(ParseOptions::fast()).parse("a*+b");
    assert!(tree.has_error());
    assert!(!tree.to_sexp().contains("MISSING"), "{}", tree.to_sexp());
    assert_covers(&tree, "a*+b");
}

#[test]
fn test_diagnostic_for_missing_token_points_at_insertion() {
    let tree = calc::parser().parse("(a");
    let diagnostics = tree.errors();
    assert_eq!(diagnostics.len(), 1);
    let error = &diagnostics[0];
    assert_eq!(error.code, ErrorCode::E0203);
    assert_eq!(u32::from(error.range.start()), 2);
    assert!(error.has_related());
}
