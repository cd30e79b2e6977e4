//! Parsing without errors: precedence, forks, extras and node navigation.

use huff::TextRange;
use rstest::rstest;

use crate::helpers::assertions::{assert_covers, assert_well_formed};
use crate::helpers::calc::{self, EXPR, IDENT, PRODUCT};

// ============================================================================
// SHAPE
// ============================================================================

#[test]
fn test_simple_sum() {
    let tree = calc::parser().parse("a+b");
    let root = tree.root_node();
    assert_eq!(root.kind(), EXPR);
    assert_eq!((root.start_byte(), root.end_byte()), (0, 3));
    let kinds: Vec<_> = root.children().map(|child| child.kind_name()).collect();
    assert_eq!(kinds, ["identifier", "+", "identifier"]);
    assert!(!tree.has_error());
}

#[rstest]
#[case("a", "(expr (identifier))")]
#[case("a+b*c", "(expr (identifier) (product (identifier) (identifier)))")]
#[case("a*b+c", "(expr (product (identifier) (identifier)) (identifier))")]
#[case("a*b*c", "(expr (product (product (identifier) (identifier)) (identifier)))")]
#[case("(a+b)*c", "(expr (product (identifier) (identifier) (identifier)))")]
#[case(" a + b ", "(expr (identifier) (identifier))")]
fn test_precedence_and_grouping(#[case] text: &str, #[case] sexp: &str) {
    let tree = calc::parser().parse(text);
    assert_eq!(tree.to_sexp(), sexp);
    assert!(!tree.has_error());
    assert_covers(&tree, text);
    assert_well_formed(tree.root_node());
}

#[test]
fn test_hidden_rules_are_inlined() {
    let tree = calc::parser().parse("(a)");
    let root = tree.root_node();
    assert_eq!(root.child_count(), 3);
    assert!(root.children().all(|child| child.kind_name() != "_expr"));
}

// ============================================================================
// FORKS
// ============================================================================

#[test]
fn test_unresolved_conflict_is_kept_in_the_table() {
    assert!(calc::calc().table().conflict_count() > 0);
}

#[rstest]
#[case("a-b")]
#[case("a-b-c")]
#[case("a-b-c-d-e")]
#[case("a-(b-c)*d")]
fn test_ambiguous_input_parses_without_error(#[case] text: &str) {
    let tree = calc::parser().parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_covers(&tree, text);
}

#[test]
fn test_ambiguity_yields_one_tree() {
    let tree = calc::parser().parse("a-b-c");
    assert_eq!(tree.to_sexp(), "(expr (identifier) (identifier) (identifier))");
}

// ============================================================================
// EXTRAS AND INPUT SHAPES
// ============================================================================

#[test]
fn test_leading_and_trailing_whitespace_belong_to_the_root() {
    let text = "  a +\n b  ";
    let tree = calc::parser().parse(text);
    let root = tree.root_node();
    assert_eq!(root.kind(), EXPR);
    assert_eq!(root.range(), TextRange::up_to((text.len() as u32).into()));
    assert!(root.child(0).is_some_and(|child| child.is_extra()));
    assert!(root.children().last().is_some_and(|child| child.is_extra()));
}

#[test]
fn test_chunked_input_matches_contiguous_input() {
    let parser = calc::parser();
    let chunked = parser.parse_chunks(&["a +", " b*", "c"]);
    let whole = parser.parse("a + b*c");
    assert_eq!(chunked.text(), whole.text());
    assert!(chunked.root().structurally_eq(whole.root()));
}

// ============================================================================
// NAVIGATION
// ============================================================================

#[test]
fn test_descendant_for_range() {
    let tree = calc::parser().parse("a + bc*d");
    let root = tree.root_node();

    let node = root.descendant_for_range(TextRange::new(4.into(), 6.into())).unwrap();
    assert_eq!((node.kind(), node.text()), (IDENT, "bc"));

    let node = root.descendant_for_range(TextRange::new(4.into(), 8.into())).unwrap();
    assert_eq!(node.kind(), PRODUCT);

    assert!(root.descendant_for_range(TextRange::new(0.into(), 20.into())).is_none());
}

#[test]
fn test_tree_cursor_walks_in_document_order() {
    let tree = calc::parser().parse("a*b+c");
    let mut cursor = tree.root_node().walk();
    let mut seen = Vec::new();
    'walk: loop {
        seen.push(cursor.node().kind_name());
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    assert_eq!(
        seen,
        ["expr", "product", "identifier", "*", "identifier", "+", "identifier"]
    );
}

#[test]
fn test_goto_first_child_for_byte() {
    let tree = calc::parser().parse("a*b+c");
    let mut cursor = tree.root_node().walk();
    assert!(cursor.goto_first_child_for_byte(4));
    assert_eq!(cursor.node().text(), "c");
    assert_eq!(cursor.depth(), 1);
}

#[test]
fn test_positions_use_line_index() {
    let tree = calc::parser().parse("a +\n  b");
    let b = tree.root_node().named_children().last().unwrap();
    let position = b.start_position();
    assert_eq!((position.line, position.column), (1, 2));
}
