//! Immutable, position-independent syntax subtrees.
//!
//! A [`Subtree`] stores only its own size, never an absolute offset, so an
//! unchanged subtree can be shared by pointer between an old tree and every
//! tree reparsed from it.

use std::fmt;
use std::sync::Arc;

use text_size::TextSize;

use crate::language::{LexMode, NO_STATE, ProductionId, StateId, Symbol};
use crate::lexer::ScannerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Flags(u8);

impl Flags {
    pub const LEAF: Flags = Flags(1);
    pub const EXTRA: Flags = Flags(1 << 1);
    pub const MISSING: Flags = Flags(1 << 2);
    pub const HAS_CHANGES: Flags = Flags(1 << 3);
    pub const HAS_ERROR: Flags = Flags(1 << 4);
    /// Built while more than one stack version was alive.
    pub const FRAGILE: Flags = Flags(1 << 5);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, other: Flags, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    fn with(mut self, other: Flags, on: bool) -> Flags {
        self.set(other, on);
        self
    }
}

#[derive(Debug)]
pub(crate) struct SubtreeData {
    pub symbol: Symbol,
    pub size: TextSize,
    pub children: Vec<Subtree>,
    pub production: Option<ProductionId>,
    /// Mode the first token was lexed in.
    pub lex_mode: LexMode,
    /// State the node was reduced from (its goto source). [`NO_STATE`] for leaves.
    pub parse_state: StateId,
    /// Mode of the token that followed the node when it was built.
    pub end_mode: LexMode,
    /// Bytes past the end that influenced how this subtree was built.
    pub lookahead: u32,
    pub flags: Flags,
    pub dynamic_precedence: i32,
    /// ERROR and MISSING nodes contained, this one included.
    pub error_count: u32,
    pub external_start: ScannerState,
    pub external_end: ScannerState,
}

/// Shared handle to an immutable subtree.
#[derive(Clone)]
pub struct Subtree(Arc<SubtreeData>);

/// Everything needed to build a leaf from a lexed token.
pub(crate) struct LeafInit {
    pub symbol: Symbol,
    pub size: usize,
    pub lookahead: usize,
    pub lex_mode: LexMode,
    pub extra: bool,
    pub fragile: bool,
    pub external_start: ScannerState,
    pub external_end: ScannerState,
}

/// Everything needed to build an interior node.
pub(crate) struct NodeInit {
    pub symbol: Symbol,
    pub children: Vec<Subtree>,
    pub production: Option<ProductionId>,
    pub parse_state: StateId,
    pub end_mode: LexMode,
    /// Bytes past the node's end read by the token that triggered the reduction.
    pub trailing_lookahead: usize,
    pub fragile: bool,
    pub extra: bool,
    pub dynamic_precedence: i32,
    /// Used when the node has no children.
    pub empty_mode: LexMode,
    pub empty_external: ScannerState,
}

impl Subtree {
    pub(crate) fn leaf(init: LeafInit) -> Subtree {
        let error = init.symbol == Symbol::ERROR;
        let flags = Flags::LEAF
            .with(Flags::EXTRA, init.extra)
            .with(Flags::FRAGILE, init.fragile)
            .with(Flags::HAS_ERROR, error);
        Subtree(Arc::new(SubtreeData {
            symbol: init.symbol,
            size: TextSize::new(init.size as u32),
            children: Vec::new(),
            production: None,
            lex_mode: init.lex_mode,
            parse_state: NO_STATE,
            end_mode: init.lex_mode,
            lookahead: init.lookahead as u32,
            flags,
            dynamic_precedence: 0,
            error_count: u32::from(error),
            external_start: init.external_start,
            external_end: init.external_end,
        }))
    }

    /// A zero-width token inserted by error recovery.
    pub(crate) fn missing(symbol: Symbol, lex_mode: LexMode, external: ScannerState) -> Subtree {
        Subtree(Arc::new(SubtreeData {
            symbol,
            size: TextSize::new(0),
            children: Vec::new(),
            production: None,
            lex_mode,
            parse_state: NO_STATE,
            end_mode: lex_mode,
            lookahead: 0,
            flags: Flags::LEAF.with(Flags::MISSING, true).with(Flags::HAS_ERROR, true),
            dynamic_precedence: 0,
            error_count: 1,
            external_start: external.clone(),
            external_end: external,
        }))
    }

    pub(crate) fn node(init: NodeInit) -> Subtree {
        let NodeInit {
            symbol,
            children,
            production,
            parse_state,
            end_mode,
            trailing_lookahead,
            fragile,
            extra,
            dynamic_precedence,
            empty_mode,
            empty_external,
        } = init;

        let mut size = TextSize::new(0);
        let mut reach = 0usize;
        let mut has_error = symbol == Symbol::ERROR;
        let mut fragile = fragile;
        let mut error_count = u32::from(symbol == Symbol::ERROR);
        let mut precedence = dynamic_precedence;
        for child in &children {
            size += child.size();
            reach = reach.max(usize::from(size) + child.lookahead());
            has_error |= child.has_error();
            fragile |= child.is_fragile();
            error_count += child.0.error_count;
            precedence += child.dynamic_precedence();
        }
        let end = usize::from(size);
        let lookahead = (reach.max(end + trailing_lookahead) - end) as u32;

        let (lex_mode, external_start, external_end) = match (children.first(), children.last()) {
            (Some(first), Some(last)) => (
                first.lex_mode(),
                first.external_start().clone(),
                last.external_end().clone(),
            ),
            _ => (empty_mode, empty_external.clone(), empty_external),
        };

        let flags = Flags::default()
            .with(Flags::EXTRA, extra)
            .with(Flags::FRAGILE, fragile)
            .with(Flags::HAS_ERROR, has_error);
        Subtree(Arc::new(SubtreeData {
            symbol,
            size,
            children,
            production,
            lex_mode,
            parse_state,
            end_mode,
            lookahead,
            flags,
            dynamic_precedence: precedence,
            error_count,
            external_start,
            external_end,
        }))
    }

    /// Copy of this subtree with new children and size, marked as changed.
    pub(crate) fn with_edited_children(&self, children: Vec<Subtree>) -> Subtree {
        let size = children.iter().fold(TextSize::new(0), |size, child| size + child.size());
        Subtree(Arc::new(SubtreeData {
            symbol: self.0.symbol,
            size,
            children,
            production: self.0.production,
            lex_mode: self.0.lex_mode,
            parse_state: self.0.parse_state,
            end_mode: self.0.end_mode,
            lookahead: self.0.lookahead,
            flags: self.0.flags.with(Flags::HAS_CHANGES, true),
            dynamic_precedence: self.0.dynamic_precedence,
            error_count: self.0.error_count,
            external_start: self.0.external_start.clone(),
            external_end: self.0.external_end.clone(),
        }))
    }

    /// Copy of a leaf with a new size, marked as changed.
    pub(crate) fn with_size(&self, size: usize) -> Subtree {
        Subtree(Arc::new(SubtreeData {
            symbol: self.0.symbol,
            size: TextSize::new(size as u32),
            children: Vec::new(),
            production: self.0.production,
            lex_mode: self.0.lex_mode,
            parse_state: self.0.parse_state,
            end_mode: self.0.end_mode,
            lookahead: self.0.lookahead,
            flags: self.0.flags.with(Flags::HAS_CHANGES, true),
            dynamic_precedence: self.0.dynamic_precedence,
            error_count: self.0.error_count,
            external_start: self.0.external_start.clone(),
            external_end: self.0.external_end.clone(),
        }))
    }

    /// Copy marked (or unmarked) as an extra.
    pub(crate) fn with_extra(&self, extra: bool) -> Subtree {
        if self.is_extra() == extra {
            return self.clone();
        }
        let data = &self.0;
        Subtree(Arc::new(SubtreeData {
            symbol: data.symbol,
            size: data.size,
            children: data.children.clone(),
            production: data.production,
            lex_mode: data.lex_mode,
            parse_state: data.parse_state,
            end_mode: data.end_mode,
            lookahead: data.lookahead,
            flags: data.flags.with(Flags::EXTRA, extra),
            dynamic_precedence: data.dynamic_precedence,
            error_count: data.error_count,
            external_start: data.external_start.clone(),
            external_end: data.external_end.clone(),
        }))
    }

    /// Take the children out of a node nobody else holds, or clone the list.
    pub(crate) fn into_children(self) -> Vec<Subtree> {
        match Arc::try_unwrap(self.0) {
            Ok(mut data) => std::mem::take(&mut data.children),
            Err(shared) => shared.children.clone(),
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    pub fn size(&self) -> TextSize {
        self.0.size
    }

    pub fn len(&self) -> usize {
        usize::from(self.0.size)
    }

    pub fn is_empty(&self) -> bool {
        self.0.size == TextSize::new(0)
    }

    pub fn children(&self) -> &[Subtree] {
        &self.0.children
    }

    pub fn child_count(&self) -> usize {
        self.0.children.len()
    }

    pub fn production(&self) -> Option<ProductionId> {
        self.0.production
    }

    pub fn lookahead(&self) -> usize {
        self.0.lookahead as usize
    }

    pub fn lex_mode(&self) -> LexMode {
        self.0.lex_mode
    }

    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    pub fn end_mode(&self) -> LexMode {
        self.0.end_mode
    }

    pub fn dynamic_precedence(&self) -> i32 {
        self.0.dynamic_precedence
    }

    pub fn error_count(&self) -> u32 {
        self.0.error_count
    }

    pub fn external_start(&self) -> &ScannerState {
        &self.0.external_start
    }

    pub fn external_end(&self) -> &ScannerState {
        &self.0.external_end
    }

    pub fn is_leaf(&self) -> bool {
        self.0.flags.contains(Flags::LEAF)
    }

    pub fn is_extra(&self) -> bool {
        self.0.flags.contains(Flags::EXTRA)
    }

    pub fn is_missing(&self) -> bool {
        self.0.flags.contains(Flags::MISSING)
    }

    pub fn is_error(&self) -> bool {
        self.0.symbol == Symbol::ERROR
    }

    pub fn has_changes(&self) -> bool {
        self.0.flags.contains(Flags::HAS_CHANGES)
    }

    pub fn has_error(&self) -> bool {
        self.0.flags.contains(Flags::HAS_ERROR)
    }

    pub fn is_fragile(&self) -> bool {
        self.0.flags.contains(Flags::FRAGILE)
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast()
    }

    /// Same symbols, sizes, flags that matter to readers, and shape.
    pub fn structurally_eq(&self, other: &Subtree) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.symbol() == other.symbol()
            && self.size() == other.size()
            && self.is_extra() == other.is_extra()
            && self.is_missing() == other.is_missing()
            && self.child_count() == other.child_count()
            && self
                .children()
                .iter()
                .zip(other.children())
                .all(|(mine, theirs)| mine.structurally_eq(theirs))
    }

    /// First leaf in document order, if any.
    pub fn first_leaf(&self) -> Option<&Subtree> {
        let mut current = self;
        while !current.is_leaf() {
            current = current.children().first()?;
        }
        Some(current)
    }

    /// Number of leaves and nodes, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Subtree::node_count).sum::<usize>()
    }
}

impl fmt::Debug for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Subtree");
        debug
            .field("symbol", &self.0.symbol.0)
            .field("size", &self.0.size)
            .field("flags", &self.0.flags);
        if !self.0.children.is_empty() {
            debug.field("children", &self.0.children);
        }
        debug.finish()
    }
}

impl Drop for SubtreeData {
    fn drop(&mut self) {
        // Deep trees would otherwise recurse once per level.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Ok(mut data) = Arc::try_unwrap(child.0) {
                pending.append(&mut data.children);
            }
        }
    }
}
