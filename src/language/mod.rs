//! Grammar description and the LALR(1) parse table built from it.
//!
//! A [`Language`] is immutable once built and is shared by reference between
//! every parser and tree that uses it.

mod build;
mod grammar;
mod symbol;
mod table;

pub use grammar::{
    Assoc, GrammarBuilder, GrammarError, KeywordClassifier, Production, RuleHandle, ScannerFactory,
    TokenPattern,
};
pub use symbol::{
    LexMode, NO_STATE, ProductionId, StateId, Symbol, SymbolKind, SymbolMetadata, SymbolSet,
};
pub use table::{ParseAction, ParseTable};

use crate::lexer::{ExternalScanner, LexicalGrammar};

/// A built grammar: symbols, productions, lexical rules and parse table.
pub struct Language {
    name: &'static str,
    symbols: Vec<SymbolMetadata>,
    productions: Vec<Production>,
    table: ParseTable,
    lexical: LexicalGrammar,
    start: Symbol,
    extras: SymbolSet,
    recoverable_extras: SymbolSet,
    scanner: Option<ScannerFactory>,
}

impl Language {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of symbols, including the reserved ones and the augmented start.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn metadata(&self, symbol: Symbol) -> Option<&SymbolMetadata> {
        self.symbols.get(symbol.index())
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &'static str {
        self.metadata(symbol).map_or("<unknown>", |metadata| metadata.name)
    }

    /// Look a symbol up by name and namedness.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        self.symbols
            .iter()
            .position(|metadata| metadata.name == name && metadata.named == named)
            .map(|index| Symbol(index as u16))
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        self.metadata(symbol).is_some_and(SymbolMetadata::is_terminal)
    }

    pub fn is_visible(&self, symbol: Symbol) -> bool {
        self.metadata(symbol).is_some_and(|metadata| metadata.visible)
    }

    pub fn is_named(&self, symbol: Symbol) -> bool {
        self.metadata(symbol).is_some_and(|metadata| metadata.named)
    }

    /// Tokens that may appear between any two tokens.
    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.extras.contains(symbol)
    }

    pub fn is_recoverable_extra(&self, symbol: Symbol) -> bool {
        self.recoverable_extras.contains(symbol)
    }

    pub fn extras(&self) -> &SymbolSet {
        &self.extras
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id as usize]
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    pub fn start_symbol(&self) -> Symbol {
        self.start
    }

    pub(crate) fn lexical(&self) -> &LexicalGrammar {
        &self.lexical
    }

    pub fn has_external_scanner(&self) -> bool {
        self.scanner.is_some()
    }

    pub fn new_external_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.scanner.map(|factory| factory())
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name)
            .field("symbols", &self.symbols.len())
            .field("productions", &self.productions.len())
            .field("states", &self.table.state_count())
            .finish()
    }
}
