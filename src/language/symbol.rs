//! Grammar symbols, symbol sets and automaton state identifiers.

use std::fmt;

/// A terminal or non-terminal of a grammar.
///
/// Ids `0` and `1` are reserved for end-of-input and the error symbol; a
/// grammar numbers its own symbols from `2` up without gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub u16);

impl Symbol {
    /// End of input. Never appears in a tree.
    pub const END: Symbol = Symbol(0);
    /// Synthesized by error recovery.
    pub const ERROR: Symbol = Symbol(1);
    /// First id available to a grammar.
    pub const FIRST_GRAMMAR_SYMBOL: u16 = 2;

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a state of the parse automaton.
pub type StateId = u16;

/// Placeholder for "no state", e.g. the goto source of a leaf.
pub const NO_STATE: StateId = StateId::MAX;

/// Index of a production of a grammar.
pub type ProductionId = u16;

/// Identifies the set of terminals a token was lexed against.
///
/// Parse states with identical admissible terminals share one mode, so two
/// tokens lexed in the same mode at the same position over the same text are
/// the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LexMode(pub u16);

impl LexMode {
    /// Every terminal admissible, used while recovering from errors.
    pub const ERROR: LexMode = LexMode(u16::MAX);
    /// Union of several modes, used while more than one stack is alive.
    pub const MIXED: LexMode = LexMode(u16::MAX - 1);

    /// Whether a token lexed in this mode can be matched against a later lex.
    pub fn is_exact(self) -> bool {
        self != Self::ERROR && self != Self::MIXED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
}

/// Static facts about one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMetadata {
    pub name: &'static str,
    pub kind: SymbolKind,
    /// Hidden non-terminals are spliced into their parent.
    pub visible: bool,
    /// Anonymous symbols (punctuation, keywords) are omitted from S-expressions.
    pub named: bool,
}

impl SymbolMetadata {
    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }
}

/// A fixed-universe bit set of symbols.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SymbolSet {
    words: Vec<u64>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(symbols: usize) -> Self {
        Self {
            words: vec![0; symbols.div_ceil(64)],
        }
    }

    pub fn insert(&mut self, symbol: Symbol) -> bool {
        let (word, bit) = Self::slot(symbol);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & bit == 0;
        self.words[word] |= bit;
        fresh
    }

    pub fn remove(&mut self, symbol: Symbol) {
        let (word, bit) = Self::slot(symbol);
        if let Some(word) = self.words.get_mut(word) {
            *word &= !bit;
        }
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        let (word, bit) = Self::slot(symbol);
        self.words.get(word).is_some_and(|word| word & bit != 0)
    }

    /// Add every member of `other`; returns whether anything was added.
    pub fn union_with(&mut self, other: &SymbolSet) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub fn intersects(&self, other: &SymbolSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(mine, theirs)| mine & theirs != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            (0..64u16)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| Symbol(index as u16 * 64 + bit))
        })
    }

    fn slot(symbol: Symbol) -> (usize, u64) {
        (symbol.index() / 64, 1u64 << (symbol.index() % 64))
    }
}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|symbol| symbol.0)).finish()
    }
}

impl FromIterator<Symbol> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut set = SymbolSet::new();
        for symbol in iter {
            set.insert(symbol);
        }
        set
    }
}
