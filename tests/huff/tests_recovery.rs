//! Broken Huff sources: recovery shape and diagnostics.

use huff::huff::{SyntaxKind, parse};
use huff::parser::errors::{ErrorCode, ParseContext};
use rstest::rstest;

use crate::helpers::assertions::{assert_covers, assert_well_formed, outermost_errors};

#[test]
fn test_unclosed_macro_body() {
    let text = "#define macro M() = takes(0) returns(0) { add";
    let tree = parse(text);
    assert!(tree.to_sexp().contains("(MISSING \"}\")"), "{}", tree.to_sexp());

    let errors = tree.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    let error = &errors[0];
    assert_eq!(error.code, ErrorCode::E0202);
    assert_eq!(error.context, ParseContext::Within("macro_body"));
    assert_eq!(error.message, "unclosed brace in macro body, expected '}'");
    assert_eq!(u32::from(error.range.start()) as usize, text.len());
    assert_eq!(error.related.len(), 1);
    assert_eq!(error.related[0].message, "'{' opened here");
}

#[test]
fn test_missing_macro_name() {
    let tree = parse("#define macro () = takes(0) { stop }");
    let errors = tree.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].code, ErrorCode::E0301);
    assert_eq!(errors[0].context, ParseContext::Within("macro"));
    assert!(tree.to_sexp().contains("(MISSING identifier)"));
}

#[test]
fn test_invalid_character_in_body() {
    let text = "#define macro M() = takes(0) { add @ stop }";
    let tree = parse(text);
    let errors = tree.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].code, ErrorCode::E0101);
    assert_eq!(errors[0].message, "invalid character '@'");
    assert_eq!(errors[0].hint.as_deref(), Some("remove it"));

    let start = text.find("stop").unwrap() as u32;
    let stop = tree
        .root_node()
        .descendant_for_range(huff::TextRange::at(start.into(), 4.into()))
        .unwrap();
    assert_eq!(stop.kind(), SyntaxKind::OPCODE.symbol());
    assert!(!stop.has_error());
}

#[test]
fn test_unterminated_string() {
    let text = "#include \"lib.huff";
    let tree = parse(text);
    assert_covers(&tree, text);
    assert!(
        tree.errors().iter().any(|error| error.code == ErrorCode::E0102),
        "{:?}",
        tree.errors()
    );
}

#[test]
fn test_stray_tokens_between_definitions() {
    let text = "#define macro M() = takes(0) { stop }\nfoo bar\n#define constant X = 0x01";
    let tree = parse(text);
    assert_covers(&tree, text);

    let errors = outermost_errors(tree.root_node());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text(), "foo bar");

    let diagnostics = tree.errors();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].code, ErrorCode::E0201);
    assert!(diagnostics[0].context.is_top_level());

    let kinds: Vec<_> = tree
        .root_node()
        .named_children()
        .filter(|child| !child.is_error())
        .map(|child| child.kind_name())
        .collect();
    assert_eq!(kinds, ["declaration", "declaration"]);
}

#[test]
fn test_later_definitions_survive_an_error() {
    let text = "#define macro A() = takes(0) { stop\n#define macro B() = takes(0) { stop }";
    let tree = parse(text);
    assert!(tree.has_error());
    assert_covers(&tree, text);
    let parse = huff::huff::parse_typed(text);
    let file = parse.source_file().unwrap();
    assert!(file.find_macro("B").is_some(), "{}", tree.to_sexp());
}

#[rstest]
#[case("#define")]
#[case("#define macro")]
#[case("#define macro M(")]
#[case("#define macro M() = takes(")]
#[case("#define function f(uint256 returns (")]
#[case("#define constant X = ")]
#[case("#define jumptable T { a b")]
#[case("}}}}")]
#[case("#[a(, )] #define test T = { <> [] }")]
#[case("/* never closed")]
#[case("#define macro M() = takes(0) { 0x01 ) }")]
#[case("\u{1F600} #define macro M() = takes(0) { \u{00E9} }")]
fn test_broken_sources_are_covered(#[case] text: &str) {
    let tree = parse(text);
    assert_covers(&tree, text);
    assert_well_formed(tree.root_node());
    assert_eq!(tree.root_node().kind(), SyntaxKind::SOURCE_FILE.symbol());
    assert!(tree.has_error(), "{text:?} parsed cleanly: {}", tree.to_sexp());
    for error in tree.errors() {
        assert!(u32::from(error.range.end()) as usize <= text.len());
        assert!(!error.message.is_empty());
    }
}
