//! Walks an edited tree in document order, offering subtrees for reuse.

use crate::tree::{EditLog, Subtree};

struct Frame {
    parent: Subtree,
    index: usize,
}

pub(crate) struct ReuseCursor {
    root: Subtree,
    log: EditLog,
    path: Vec<Frame>,
    current: Option<(Subtree, usize)>,
}

impl ReuseCursor {
    pub fn new(root: Subtree, log: EditLog) -> Self {
        Self {
            current: Some((root.clone(), 0)),
            root,
            log,
            path: Vec::new(),
        }
    }

    pub fn log(&self) -> &EditLog {
        &self.log
    }

    /// The outermost old subtree starting at `position`, skipping everything
    /// that ends before it. `None` when nothing starts exactly there.
    pub fn candidate(&mut self, position: usize) -> Option<(Subtree, usize)> {
        loop {
            let (subtree, start) = self.current.clone()?;
            let end = start + subtree.len();
            if start > position {
                return None;
            }
            if end <= position || subtree.is_empty() {
                self.advance();
            } else if start == position {
                return Some((subtree, start));
            } else if !self.descend() {
                self.advance();
            }
        }
    }

    /// Give up on the current subtree: look at its children next, or at its
    /// next sibling when it has none.
    pub fn reject(&mut self) {
        if !self.descend() {
            self.advance();
        }
    }

    /// Step past the current subtree.
    pub fn advance(&mut self) {
        let Some((subtree, start)) = self.current.take() else {
            return;
        };
        let end = start + subtree.len();
        while let Some(frame) = self.path.last_mut() {
            frame.index += 1;
            if let Some(next) = frame.parent.children().get(frame.index) {
                self.current = Some((next.clone(), end));
                return;
            }
            self.path.pop();
        }
    }

    fn descend(&mut self) -> bool {
        let Some((subtree, start)) = self.current.clone() else {
            return false;
        };
        let Some(first) = subtree.children().first().cloned() else {
            return false;
        };
        self.path.push(Frame {
            parent: subtree,
            index: 0,
        });
        self.current = Some((first, start));
        true
    }

    /// The old leaf starting at `position`, found from the root.
    pub fn leaf_at(&self, position: usize) -> Option<Subtree> {
        let mut subtree = &self.root;
        let mut start = 0;
        'descend: while !subtree.is_leaf() {
            for child in subtree.children() {
                let end = start + child.len();
                if !child.is_empty() && start <= position && position < end {
                    subtree = child;
                    continue 'descend;
                }
                start = end;
            }
            return None;
        }
        (start == position).then(|| subtree.clone())
    }

    /// Where the current frame stack sits, for tracing.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
