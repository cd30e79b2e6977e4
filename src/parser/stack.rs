//! Persistent parse stacks.
//!
//! Every version of the GLR driver owns a pointer to the top of a linked
//! list of [`StackNode`]s. Forking a version clones one `Arc`; versions that
//! share history share the nodes below their fork point.

use std::sync::Arc;

use crate::language::StateId;
use crate::tree::Subtree;

#[derive(Debug)]
pub(crate) struct StackNode {
    pub state: StateId,
    /// `None` only for the bottom node.
    pub subtree: Option<Subtree>,
    pub prev: Option<Arc<StackNode>>,
    /// Byte offset just past `subtree`.
    pub position: usize,
    /// Entries below this one.
    pub depth: usize,
}

impl StackNode {
    pub fn is_extra(&self) -> bool {
        self.subtree.as_ref().is_some_and(Subtree::is_extra)
    }
}

impl Drop for StackNode {
    fn drop(&mut self) {
        // Long stacks would otherwise recurse once per entry.
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut node) => prev = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Accumulated cost of the repairs a version made, compared field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ErrorCost {
    pub error_nodes: u32,
    pub skipped_bytes: u32,
    pub missing: u32,
}

impl ErrorCost {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// One live parse of the input so far.
#[derive(Debug, Clone)]
pub(crate) struct Version {
    pub head: Arc<StackNode>,
    pub cost: ErrorCost,
    pub dynamic_precedence: i32,
}

/// What [`Version::pop`] took off a stack.
pub(crate) struct Popped {
    /// Entries from the first popped non-extra up, extras in between included.
    pub children: Vec<Subtree>,
    /// Extras above the last popped non-extra.
    pub trailing: Vec<Subtree>,
    /// Node the reduction returns to.
    pub base: Arc<StackNode>,
    /// End offset of the popped children.
    pub end: usize,
}

impl Version {
    pub fn new() -> Self {
        Self {
            head: Arc::new(StackNode {
                state: 0,
                subtree: None,
                prev: None,
                position: 0,
                depth: 0,
            }),
            cost: ErrorCost::default(),
            dynamic_precedence: 0,
        }
    }

    pub fn state(&self) -> StateId {
        self.head.state
    }

    pub fn position(&self) -> usize {
        self.head.position
    }

    pub fn push(&mut self, state: StateId, subtree: Subtree) {
        let position = self.head.position + subtree.len();
        let depth = self.head.depth + 1;
        self.head = Arc::new(StackNode {
            state,
            subtree: Some(subtree),
            prev: Some(self.head.clone()),
            position,
            depth,
        });
    }

    /// Pop `count` non-extra entries. `None` when the stack is too shallow.
    pub fn pop(&self, count: usize) -> Option<Popped> {
        let mut node = self.head.clone();
        let mut trailing = Vec::new();
        while node.is_extra() {
            trailing.extend(node.subtree.clone());
            node = node.prev.clone()?;
        }
        let end = node.position;

        let mut children = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let subtree = node.subtree.clone()?;
            if !subtree.is_extra() {
                remaining -= 1;
            }
            children.push(subtree);
            node = node.prev.clone()?;
        }
        children.reverse();
        trailing.reverse();
        Some(Popped {
            children,
            trailing,
            base: node,
            end,
        })
    }

    /// Every subtree on the stack, bottom first.
    pub fn entries(&self) -> Vec<Subtree> {
        let mut entries = Vec::with_capacity(self.head.depth);
        let mut node = Some(&self.head);
        while let Some(current) = node {
            entries.extend(current.subtree.clone());
            node = current.prev.as_ref();
        }
        entries.reverse();
        entries
    }

    /// Whether the two stacks agree on state and position at every level
    /// down to a node they share, so their futures are identical.
    pub fn can_merge(&self, other: &Version) -> bool {
        let mut mine = &self.head;
        let mut theirs = &other.head;
        loop {
            if Arc::ptr_eq(mine, theirs) {
                return true;
            }
            if mine.state != theirs.state
                || mine.position != theirs.position
                || mine.depth != theirs.depth
            {
                return false;
            }
            match (&mine.prev, &theirs.prev) {
                (Some(a), Some(b)) => {
                    mine = a;
                    theirs = b;
                }
                _ => return false,
            }
        }
    }

    /// Ordering used to pick between versions: lower is better.
    pub fn rank(&self) -> (ErrorCost, std::cmp::Reverse<i32>) {
        (self.cost, std::cmp::Reverse(self.dynamic_precedence))
    }
}
