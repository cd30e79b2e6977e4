//! Tree assertions shared by the engine and Huff tests.

use huff::tree::{Node, Subtree};
use huff::{Edit, Parser, SyntaxTree};

/// Leaves in document order with their start offsets.
pub fn leaves(tree: &SyntaxTree) -> Vec<(Subtree, usize)> {
    let mut out = Vec::new();
    let mut stack = vec![(tree.root().clone(), 0usize)];
    while let Some((subtree, start)) = stack.pop() {
        if subtree.is_leaf() || subtree.child_count() == 0 {
            out.push((subtree, start));
            continue;
        }
        let mut offset = start;
        let mut children = Vec::with_capacity(subtree.child_count());
        for child in subtree.children() {
            children.push((child.clone(), offset));
            offset += child.len();
        }
        stack.extend(children.into_iter().rev());
    }
    out
}

/// The root spans the text and the leaves tile it without gaps.
pub fn assert_covers(tree: &SyntaxTree, text: &str) {
    assert_eq!(tree.root().len(), text.len(), "root must span the whole text");
    let mut expected = 0;
    for (leaf, start) in leaves(tree) {
        assert_eq!(start, expected, "gap or overlap before {:?}", leaf.symbol());
        expected = start + leaf.len();
    }
    assert_eq!(expected, text.len());
    let mut rebuilt = String::new();
    for (leaf, start) in leaves(tree) {
        rebuilt.push_str(&text[start..start + leaf.len()]);
    }
    assert_eq!(rebuilt, text);
}

/// Every node's children are contiguous and add up to its length.
pub fn assert_well_formed(node: Node<'_>) {
    let mut expected = node.start_byte();
    for child in node.children() {
        assert_eq!(child.start_byte(), expected, "child {child:?} of {node:?} is misplaced");
        expected = child.end_byte();
        assert_well_formed(child);
    }
    if node.child_count() > 0 {
        assert_eq!(expected, node.end_byte(), "children of {node:?} do not fill it");
    }
}

/// ERROR nodes that are not inside another ERROR node.
pub fn outermost_errors<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    if node.is_error() {
        return vec![node];
    }
    if !node.has_error() {
        return Vec::new();
    }
    node.children().flat_map(outermost_errors).collect()
}

/// Reparse `old_text` edited into `new_text` and compare with a fresh parse.
pub fn assert_incremental_matches(
    parser: &Parser,
    old_text: &str,
    new_text: &str,
) -> (SyntaxTree, SyntaxTree) {
    let edit = Edit::between(old_text, new_text).expect("texts differ");
    assert_batch_matches(parser, old_text, &[edit], new_text)
}

/// Reparse `old_text` through `edits` into `new_text` and compare with a
/// fresh parse of `new_text`.
pub fn assert_batch_matches(
    parser: &Parser,
    old_text: &str,
    edits: &[Edit],
    new_text: &str,
) -> (SyntaxTree, SyntaxTree) {
    let old = parser.parse(old_text);
    let incremental = parser.reparse(&old, edits, new_text).expect("valid edits");
    let fresh = parser.parse(new_text);
    assert!(
        incremental.root().structurally_eq(fresh.root()),
        "incremental {} != fresh {} for {:?} -> {:?} via {:?}",
        incremental.to_sexp(),
        fresh.to_sexp(),
        old_text,
        new_text,
        edits
    );
    (old, incremental)
}

/// Whether some subtree of `tree` is the very allocation `target`.
pub fn contains_instance(tree: &SyntaxTree, target: &Subtree) -> bool {
    let mut stack = vec![tree.root()];
    while let Some(subtree) = stack.pop() {
        if subtree.ptr_eq(target) {
            return true;
        }
        stack.extend(subtree.children());
    }
    false
}
