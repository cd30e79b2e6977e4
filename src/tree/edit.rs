//! Text edits and their effect on an existing tree.
//!
//! Editing a tree copies only the path from the root to every subtree the
//! edit touches. Everything else keeps its identity, which is what lets the
//! reparser hand unchanged subtrees straight back.

use std::ops::Range;
use std::sync::Arc;

use super::Subtree;
use crate::parser::ReparseError;

/// One text replacement, in byte offsets of the text as it was before this
/// edit and after every earlier edit of the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl Edit {
    pub fn new(start: usize, old_end: usize, new_end: usize) -> Self {
        Self {
            start,
            old_end,
            new_end,
        }
    }

    pub fn insert(at: usize, len: usize) -> Self {
        Self::new(at, at, at + len)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range.start, range.end, range.start)
    }

    pub fn replace(range: Range<usize>, new_len: usize) -> Self {
        Self::new(range.start, range.end, range.start + new_len)
    }

    /// The single edit turning `old` into `new`, found by trimming their
    /// common prefix and suffix. `None` when the texts are equal.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let mut prefix = old
            .bytes()
            .zip(new.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
            prefix -= 1;
        }
        let limit = old.len().min(new.len()) - prefix;
        let mut suffix = old
            .bytes()
            .rev()
            .zip(new.bytes().rev())
            .take(limit)
            .take_while(|(a, b)| a == b)
            .count();
        while !old.is_char_boundary(old.len() - suffix)
            || !new.is_char_boundary(new.len() - suffix)
        {
            suffix -= 1;
        }
        Some(Self::new(prefix, old.len() - suffix, new.len() - suffix))
    }

    fn shift(&self, offset: usize) -> usize {
        offset + self.new_end - self.old_end
    }
}

/// Byte ranges of the new text whose content differs from the old text, or
/// whose surroundings did. Kept sorted and disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditLog {
    ranges: Vec<Range<usize>>,
}

impl EditLog {
    /// Record `edit`, moving earlier ranges into the edited coordinates.
    pub fn record(&mut self, edit: &Edit) {
        let mut merged = edit.start..edit.new_end;
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        for range in self.ranges.drain(..) {
            if range.end < edit.start {
                ranges.push(range);
            } else if range.start > edit.old_end {
                ranges.push(edit.shift(range.start)..edit.shift(range.end));
            } else {
                let end = if range.end > edit.old_end {
                    edit.shift(range.end)
                } else {
                    edit.new_end
                };
                merged = merged.start.min(range.start)..merged.end.max(end);
            }
        }
        ranges.push(merged);
        ranges.sort_by_key(|range| range.start);
        self.ranges = ranges;
    }

    /// Whether anything in `span` changed. Zero-width ranges (pure
    /// deletions) count anywhere from the span's first byte to its last.
    pub fn is_dirty(&self, span: Range<usize>) -> bool {
        self.ranges.iter().any(|range| {
            range.start < span.end && (range.end > span.start || range.start == span.start)
        })
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// A run of old text that no edit touched, and where it sits in the new text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Kept {
    old: Range<usize>,
    new_start: usize,
}

impl Kept {
    fn len(&self) -> usize {
        self.old.end - self.old.start
    }

    /// What is left of this run after `edit`, in the edited coordinates.
    fn split(self, edit: &Edit, out: &mut Vec<Kept>) {
        let end = self.new_start + self.len();
        if end <= edit.start {
            out.push(self);
        } else if self.new_start >= edit.old_end {
            out.push(Kept {
                new_start: edit.shift(self.new_start),
                ..self
            });
        } else {
            if self.new_start < edit.start {
                let len = edit.start - self.new_start;
                out.push(Kept {
                    old: self.old.start..self.old.start + len,
                    new_start: self.new_start,
                });
            }
            if end > edit.old_end {
                let skipped = edit.old_end - self.new_start;
                out.push(Kept {
                    old: self.old.start + skipped..self.old.end,
                    new_start: edit.new_end,
                });
            }
        }
    }
}

/// A tree whose sizes were adjusted to a batch of edits, ready for reparsing.
#[derive(Debug, Clone)]
pub struct EditedTree {
    pub(crate) root: Subtree,
    pub(crate) log: EditLog,
    pub(crate) len: usize,
    old_text: Arc<str>,
    kept: Vec<Kept>,
}

impl EditedTree {
    pub fn root(&self) -> &Subtree {
        &self.root
    }

    pub fn log(&self) -> &EditLog {
        &self.log
    }

    /// Length of the text after every edit.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check that `text` is what the edits make of the old text: as long as
    /// they say, and equal to the old text wherever no edit reached.
    pub fn check_text(&self, text: &str) -> Result<(), ReparseError> {
        if self.len != text.len() {
            return Err(ReparseError::LengthMismatch {
                expected: self.len,
                actual: text.len(),
            });
        }
        let (old, new) = (self.old_text.as_bytes(), text.as_bytes());
        let intact = self.kept.iter().all(|kept| {
            new.get(kept.new_start..kept.new_start + kept.len()) == old.get(kept.old.clone())
        });
        if intact {
            Ok(())
        } else {
            Err(ReparseError::TextMismatch)
        }
    }
}

/// Apply `edits` in order to a tree parsed from `text`.
pub(crate) fn apply(
    root: &Subtree,
    text: &Arc<str>,
    edits: &[Edit],
) -> Result<EditedTree, ReparseError> {
    let mut root = root.clone();
    let mut log = EditLog::default();
    let mut len = text.len();
    let mut kept = vec![Kept {
        old: 0..len,
        new_start: 0,
    }];
    for (index, edit) in edits.iter().enumerate() {
        if edit.old_end < edit.start || edit.new_end < edit.start {
            return Err(ReparseError::InvertedEdit {
                index,
                start: edit.start,
                old_end: edit.old_end,
                new_end: edit.new_end,
            });
        }
        if edit.old_end > len {
            return Err(ReparseError::EditOutOfBounds {
                index,
                old_end: edit.old_end,
                len,
            });
        }
        root = edit_subtree(&root, 0, edit, true);
        log.record(edit);
        len = len - (edit.old_end - edit.start) + (edit.new_end - edit.start);
        let mut next = Vec::with_capacity(kept.len() + 1);
        for run in kept {
            run.split(edit, &mut next);
        }
        kept = next;
    }
    Ok(EditedTree {
        root,
        log,
        len,
        old_text: text.clone(),
        kept,
    })
}

/// Returns the original handle for subtrees the edit cannot have affected.
/// `on_insertion_path` marks the subtree that receives inserted bytes.
fn edit_subtree(tree: &Subtree, start: usize, edit: &Edit, on_insertion_path: bool) -> Subtree {
    let end = start + tree.len();
    if !on_insertion_path && (end + tree.lookahead() < edit.start || start > edit.old_end) {
        return tree.clone();
    }

    if tree.is_leaf() || tree.child_count() == 0 {
        let deleted = end.min(edit.old_end).saturating_sub(start.max(edit.start));
        let inserted = if on_insertion_path {
            edit.new_end - edit.start
        } else {
            0
        };
        if deleted == 0 && inserted == 0 {
            return if tree.is_leaf() {
                tree.clone()
            } else {
                tree.with_edited_children(Vec::new())
            };
        }
        let size = tree.len() - deleted + inserted;
        return if tree.is_leaf() {
            tree.with_size(size)
        } else {
            // An empty node receiving text; only its size matters until it is
            // reparsed.
            tree.with_edited_children(Vec::new()).with_size(size)
        };
    }

    let path_child = on_insertion_path.then(|| insertion_child(tree, start, edit.start));
    let mut children = Vec::with_capacity(tree.child_count());
    let mut child_start = start;
    for (index, child) in tree.children().iter().enumerate() {
        children.push(edit_subtree(child, child_start, edit, path_child == Some(index)));
        child_start += child.len();
    }
    tree.with_edited_children(children)
}

/// The child that receives bytes inserted at `at`: the one containing it,
/// or the last one when `at` is the subtree's end.
fn insertion_child(tree: &Subtree, start: usize, at: usize) -> usize {
    let mut child_start = start;
    for (index, child) in tree.children().iter().enumerate() {
        let child_end = child_start + child.len();
        if child_start <= at && at < child_end {
            return index;
        }
        child_start = child_end;
    }
    tree.child_count() - 1
}
