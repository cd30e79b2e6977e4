use rustc_hash::FxHashSet;
use text_size::{TextRange, TextSize};

use super::{Subtree, SyntaxTree};

/// Ranges of `new` whose syntactic structure differs from `old`.
///
/// Subtrees that `new` shares with `old` are unchanged by definition; only
/// freshly built subtrees are inspected. A fresh node whose children were
/// all shared still counts, since its own shape is new.
pub fn changed_ranges(old: &SyntaxTree, new: &SyntaxTree) -> Vec<TextRange> {
    let mut shared = FxHashSet::default();
    let mut pending = vec![old.root()];
    while let Some(subtree) = pending.pop() {
        if shared.insert(subtree.as_ptr()) {
            pending.extend(subtree.children());
        }
    }

    let mut ranges: Vec<TextRange> = Vec::new();
    collect(new.root(), 0, &shared, &mut ranges);

    let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.end() >= range.start() => *last = last.cover(range),
            _ => merged.push(range),
        }
    }
    merged
}

/// Returns whether anything below `subtree` was reported.
fn collect(
    subtree: &Subtree,
    start: usize,
    shared: &FxHashSet<*const ()>,
    out: &mut Vec<TextRange>,
) -> bool {
    if shared.contains(&subtree.as_ptr()) {
        return false;
    }
    let range = TextRange::at(TextSize::new(start as u32), subtree.size());
    let mut reported = false;
    let mut offset = start;
    for child in subtree.children() {
        reported |= collect(child, offset, shared, out);
        offset += child.len();
    }
    if !reported && !range.is_empty() {
        out.push(range);
        reported = true;
    }
    reported
}
