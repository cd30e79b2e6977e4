//! Property-based tests over generated input.
//!
//! 1. Parsing is total: any text yields a tree whose leaves tile it.
//! 2. Reparsing is total for any edit between two texts.
//! 3. Reparsing agrees with a fresh parse, for valid and broken text alike,
//!    whether the change arrives as one edit or as a batch.

use huff::huff::language;
use huff::{Edit, Parser};
use proptest::prelude::*;
use proptest::sample::Index;

use crate::helpers::assertions::{
    assert_batch_matches, assert_covers, assert_incremental_matches, assert_well_formed,
};
use crate::helpers::calc;
use crate::helpers::fixtures::{MINIMAL_MACRO, TOKEN};

// ============================================================================
// Generators
// ============================================================================

/// Anything the calc lexer knows, plus characters it does not.
fn noisy_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop::sample::select(&["a", "bc", "+", "*", "-", "(", ")", " ", "\n", "$", "#"][..]),
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

/// Valid expressions without `-`, whose parse is unambiguous.
fn valid_expression() -> impl Strategy<Value = String> {
    let leaf = prop::sample::select(&["a", "b", "xy", "zzz"][..]).prop_map(str::to_string);
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(lhs, rhs)| format!("{lhs}+{rhs}")),
            (inner.clone(), inner.clone()).prop_map(|(lhs, rhs)| format!("{lhs} * {rhs}")),
            inner.prop_map(|expr| format!("({expr})")),
        ]
    })
}

/// One to three edits: where, how many bytes to delete, what to insert.
fn edit_batch(
    fragments: &'static [&'static str],
) -> impl Strategy<Value = Vec<(Index, usize, &'static str)>> {
    let edit = (any::<Index>(), 0..8usize, prop::sample::select(fragments));
    proptest::collection::vec(edit, 1..=3)
}

const CALC_FRAGMENTS: &[&str] = &["", "a", "bc", "+", "*", "-", "(", ")", " ", "$"];

const HUFF_FRAGMENTS: &[&str] = &[
    "", " ", "\n", "add", "0x01", "(", ")", "{", "}", "[", "]", "<", ">", ",", ":", "=",
    "#define", "macro", "\"", "$", "//", "X",
];

/// Apply a batch to `text`, each edit in the coordinates its predecessors
/// left behind.
fn apply_batch(text: &str, batch: &[(Index, usize, &str)]) -> (Vec<Edit>, String) {
    let mut text = text.to_string();
    let mut edits = Vec::new();
    for (at, deleted, inserted) in batch {
        let start = at.index(text.len() + 1);
        let old_end = (start + deleted).min(text.len());
        text.replace_range(start..old_end, inserted);
        edits.push(Edit::new(start, old_end, start + inserted.len()));
    }
    (edits, text)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn parse_covers_any_text(text in noisy_text()) {
        let tree = calc::parser().parse(&text);
        assert_covers(&tree, &text);
        assert_well_formed(tree.root_node());
        for error in tree.errors() {
            prop_assert!(u32::from(error.range.end()) as usize <= text.len());
        }
    }

    #[test]
    fn reparse_covers_any_edit(old in noisy_text(), new in noisy_text()) {
        let parser = calc::parser();
        let tree = parser.parse(&old);
        let edits: Vec<Edit> = Edit::between(&old, &new).into_iter().collect();
        let reparsed = parser.reparse(&tree, &edits, &new).unwrap();
        assert_covers(&reparsed, &new);
        assert_well_formed(reparsed.root_node());
    }

    #[test]
    fn reparse_matches_fresh_parse(old in valid_expression(), new in valid_expression()) {
        prop_assume!(old != new);
        let (old_tree, new_tree) = assert_incremental_matches(&calc::parser(), &old, &new);
        prop_assert!(!old_tree.has_error());
        prop_assert!(!new_tree.has_error());
    }

    #[test]
    fn reparse_matches_fresh_parse_on_noisy_text(
        old in noisy_text(),
        batch in edit_batch(CALC_FRAGMENTS),
    ) {
        let (edits, new) = apply_batch(&old, &batch);
        assert_batch_matches(&calc::parser(), &old, &edits, &new);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reparse_matches_fresh_parse_on_huff_sources(
        token in any::<bool>(),
        batch in edit_batch(HUFF_FRAGMENTS),
    ) {
        let old = if token { TOKEN } else { MINIMAL_MACRO };
        let (edits, new) = apply_batch(old, &batch);
        assert_batch_matches(&Parser::new(language()), old, &edits, &new);
    }
}
