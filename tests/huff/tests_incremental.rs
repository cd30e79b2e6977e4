//! Reparsing Huff sources after editor-style edits.

use huff::huff::{SyntaxKind, language};
use huff::tree::changed_ranges;
use huff::{Edit, Parser};
use rstest::rstest;

use crate::helpers::assertions::{assert_covers, assert_incremental_matches, contains_instance};
use crate::helpers::fixtures::TOKEN;

fn parser() -> Parser {
    Parser::new(language())
}

/// `TOKEN` with the first occurrence of `from` replaced by `to`.
fn edited(from: &str, to: &str) -> String {
    assert!(TOKEN.contains(from), "{from:?} is not in the fixture");
    TOKEN.replacen(from, to, 1)
}

#[rstest]
#[case::rename_macro("ONLY_OWNER()", "ONLY_ADMIN()")]
#[case::add_opcode("stop\n}", "caller stop\n}")]
#[case::change_constant("0xffff_ffff", "0x01")]
#[case::add_parameter("transfer(address,uint256)", "transfer(address,uint256,bytes)")]
#[case::insert_comment("#define table", "// tables\n#define table")]
#[case::delete_declaration("#define error Unauthorized(address)\n", "")]
#[case::rename_label("is_owner:", "owned:")]
fn test_edits_match_fresh_parse(#[case] from: &str, #[case] to: &str) {
    let new_text = edited(from, to);
    let (old, new) = assert_incremental_matches(&parser(), TOKEN, &new_text);
    assert!(!old.has_error());
    assert!(!new.has_error(), "{}", new.to_sexp());
}

const CALLER: &str = "#define macro M() = takes(0) returns(0) {\n    caller\n}\n";

#[rstest]
#[case::opcode_loses_its_start(CALLER, "#define macro M() = takes(0) returns(0) {\n    ler\n}\n")]
#[case::string_loses_its_quote(
    "#include \"a.huff\"\n#define macro M() = takes(0) { stop }",
    "#include a.huff\"\n#define macro M() = takes(0) { stop }"
)]
#[case::directive_loses_its_start(
    "#define constant X = 0x01\n#define macro M() = takes(0) { stop }",
    "ne constant X = 0x01\n#define macro M() = takes(0) { stop }"
)]
fn test_deleting_the_start_of_a_token(#[case] old_text: &str, #[case] new_text: &str) {
    let (_, new) = assert_incremental_matches(&parser(), old_text, new_text);
    assert_covers(&new, new_text);
}

#[test]
fn test_shortened_opcode_becomes_a_jumpdest() {
    let new_text = CALLER.replacen("caller", "ler", 1);
    let (_, new) = assert_incremental_matches(&parser(), CALLER, &new_text);
    assert!(new.to_sexp().contains("(macro_body (jumpdest (identifier)))"), "{}", new.to_sexp());
}

#[test]
fn test_untouched_declarations_are_shared() {
    let parser = parser();
    let old = parser.parse(TOKEN);
    let new_text = edited("returns(1) {\n    <a> <b> add", "returns(1) {\n    <a> <b> sub");
    let edit = Edit::between(TOKEN, &new_text).unwrap();
    let new = parser.reparse(&old, &[edit], &new_text).unwrap();
    assert!(!new.has_error());

    let declarations: Vec<_> = old
        .root_node()
        .children()
        .filter(|child| child.kind() == SyntaxKind::DECLARATION.symbol())
        .collect();
    let (before, after): (Vec<&_>, Vec<&_>) = declarations
        .iter()
        .partition(|declaration| declaration.end_byte() < edit.start);
    assert!(!before.is_empty() && !after.is_empty());

    // Declarations well before the edit keep their identity, the edited one does not.
    for declaration in &before[..before.len() - 1] {
        assert!(
            contains_instance(&new, declaration.subtree()),
            "{declaration:?} was rebuilt"
        );
    }
    let touched = after.first().unwrap();
    assert!(!contains_instance(&new, touched.subtree()));

    let ranges = changed_ranges(&old, &new);
    assert!(!ranges.is_empty());
    assert!(
        ranges
            .iter()
            .all(|range| u32::from(range.start()) as usize >= before[before.len() - 2].end_byte()),
        "{ranges:?}"
    );
}

#[test]
fn test_typing_a_declaration_character_by_character() {
    let parser = parser();
    let target = "#define macro M() = takes(0) { stop }";
    let mut text = String::new();
    let mut tree = parser.parse(&text);
    for c in target.chars() {
        let at = text.len();
        text.push(c);
        tree = parser.reparse(&tree, &[Edit::insert(at, c.len_utf8())], &text).unwrap();
        assert_covers(&tree, &text);
    }
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert!(tree.root().structurally_eq(parser.parse(target).root()));
}

#[test]
fn test_breaking_and_fixing_a_body() {
    let parser = parser();
    let text = "#define macro M() = takes(0) { add }\n#define macro N() = takes(0) { stop }";
    let tree = parser.parse(text);

    let broken_text = text.replacen("{ add }", "{ add ", 1);
    let broken = parser
        .reparse(&tree, &[Edit::between(text, &broken_text).unwrap()], &broken_text)
        .unwrap();
    assert!(broken.has_error());
    assert_covers(&broken, &broken_text);

    let fixed = parser
        .reparse(&broken, &[Edit::between(&broken_text, text).unwrap()], text)
        .unwrap();
    assert!(!fixed.has_error(), "{}", fixed.to_sexp());
    assert!(fixed.root().structurally_eq(tree.root()));
}
