//! Grammar description consumed by the table builder.
//!
//! A grammar is declared against fixed symbol ids so a language can expose
//! its symbols as a `#[repr(u16)]` enum. [`GrammarBuilder::build`] runs the
//! LALR(1) construction once and hands back an immutable [`Language`].

use thiserror::Error;

use super::symbol::{Symbol, SymbolKind, SymbolMetadata, SymbolSet};
use super::{Language, build};
use crate::lexer::{Cursor, ExternalScanner, LexicalGrammar};

/// How a terminal is recognized.
#[derive(Clone, Copy)]
pub enum TokenPattern {
    /// An exact string. Literals made only of word characters are keywords
    /// and are found by classifying the word token instead.
    Literal(&'static str),
    /// A hand-written recognizer. Returns `true` when it matched; the token
    /// ends at the cursor position, or at the last `mark_end` call.
    Matcher(fn(&mut dyn Cursor) -> bool),
    /// The word token (identifiers). Keywords are carved out of its matches.
    Word(fn(&mut dyn Cursor) -> bool),
    /// Produced only by the keyword classifier.
    Keyword,
    /// Produced only by the external scanner.
    External,
}

impl std::fmt::Debug for TokenPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "Literal({text:?})"),
            Self::Matcher(_) => f.write_str("Matcher"),
            Self::Word(_) => f.write_str("Word"),
            Self::Keyword => f.write_str("Keyword"),
            Self::External => f.write_str("External"),
        }
    }
}

/// Maps a word to the keyword terminals it can stand for, most specific first.
pub type KeywordClassifier = fn(&str) -> &'static [Symbol];

/// Creates a fresh external scanner for each parser.
pub type ScannerFactory = fn() -> Box<dyn ExternalScanner>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// One alternative of a non-terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: Symbol,
    pub rhs: Vec<Symbol>,
    /// Static precedence, used to resolve conflicts while building the table.
    pub precedence: i32,
    pub assoc: Assoc,
    /// Preference between competing parses that survive to a merge.
    pub dynamic_precedence: i32,
}

/// Errors found while validating a grammar or building its table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("symbol id {0} is declared twice")]
    DuplicateSymbol(u16),
    #[error("symbol id {0} is used but never declared")]
    UndeclaredSymbol(u16),
    #[error("symbol id {0} is reserved")]
    ReservedSymbol(u16),
    #[error("grammar has no start symbol")]
    MissingStart,
    #[error("`{0}` must be a non-terminal")]
    ExpectedNonTerminal(&'static str),
    #[error("`{0}` must be a terminal")]
    ExpectedTerminal(&'static str),
    #[error("non-terminal `{0}` has no productions")]
    EmptyNonTerminal(&'static str),
    #[error("terminal `{0}` has no way to be recognized")]
    UnreachableTerminal(&'static str),
    #[error("grammar needs {0} parse states, more than the automaton can index")]
    TooManyStates(usize),
}

/// Handle to the production just added, for attaching precedence.
pub struct RuleHandle<'g> {
    production: &'g mut Production,
}

impl RuleHandle<'_> {
    pub fn prec(self, precedence: i32) -> Self {
        self.production.precedence = precedence;
        self
    }

    pub fn left(self, precedence: i32) -> Self {
        self.production.assoc = Assoc::Left;
        self.prec(precedence)
    }

    pub fn right(self, precedence: i32) -> Self {
        self.production.assoc = Assoc::Right;
        self.prec(precedence)
    }

    pub fn dynamic(self, precedence: i32) -> Self {
        self.production.dynamic_precedence = precedence;
        self
    }
}

/// Collects symbols, productions and lexical rules, then builds a [`Language`].
pub struct GrammarBuilder {
    name: &'static str,
    symbols: Vec<Option<SymbolMetadata>>,
    patterns: Vec<(Symbol, TokenPattern)>,
    productions: Vec<Production>,
    start: Option<Symbol>,
    extras: Vec<Symbol>,
    recoverable_extras: Vec<Symbol>,
    sync_symbols: Vec<Symbol>,
    keywords: Option<KeywordClassifier>,
    scanner: Option<ScannerFactory>,
    problems: Vec<GrammarError>,
}

impl GrammarBuilder {
    pub fn new(name: &'static str) -> Self {
        let reserved = |name, named| {
            Some(SymbolMetadata {
                name,
                kind: SymbolKind::Terminal,
                visible: named,
                named,
            })
        };
        Self {
            name,
            symbols: vec![reserved("end", false), reserved("ERROR", true)],
            patterns: Vec::new(),
            productions: Vec::new(),
            start: None,
            extras: Vec::new(),
            recoverable_extras: Vec::new(),
            sync_symbols: Vec::new(),
            keywords: None,
            scanner: None,
            problems: Vec::new(),
        }
    }

    /// A named terminal, e.g. `identifier`.
    pub fn token(
        &mut self,
        symbol: Symbol,
        name: &'static str,
        pattern: TokenPattern,
    ) -> &mut Self {
        self.terminal(symbol, name, pattern, true)
    }

    /// An anonymous terminal recognized by a pattern.
    pub fn anonymous(
        &mut self,
        symbol: Symbol,
        name: &'static str,
        pattern: TokenPattern,
    ) -> &mut Self {
        self.terminal(symbol, name, pattern, false)
    }

    /// An anonymous terminal named by its own text.
    pub fn literal(&mut self, symbol: Symbol, text: &'static str) -> &mut Self {
        self.terminal(symbol, text, TokenPattern::Literal(text), false)
    }

    /// A visible, named non-terminal.
    pub fn node(&mut self, symbol: Symbol, name: &'static str) -> &mut Self {
        self.declare(symbol, name, SymbolKind::NonTerminal, true, true);
        self
    }

    /// A non-terminal whose children are spliced into its parent.
    pub fn hidden(&mut self, symbol: Symbol, name: &'static str) -> &mut Self {
        self.declare(symbol, name, SymbolKind::NonTerminal, false, false);
        self
    }

    pub fn rule(&mut self, lhs: Symbol, rhs: &[Symbol]) -> RuleHandle<'_> {
        self.productions.push(Production {
            lhs,
            rhs: rhs.to_vec(),
            precedence: 0,
            assoc: Assoc::None,
            dynamic_precedence: 0,
        });
        let index = self.productions.len() - 1;
        RuleHandle {
            production: &mut self.productions[index],
        }
    }

    pub fn start(&mut self, symbol: Symbol) -> &mut Self {
        self.start = Some(symbol);
        self
    }

    /// Tokens allowed anywhere, such as whitespace and comments.
    pub fn extras(&mut self, symbols: &[Symbol]) -> &mut Self {
        self.extras.extend_from_slice(symbols);
        self
    }

    /// Tokens that recovery may treat as extras where the grammar has no place for them.
    pub fn recoverable_extras(&mut self, symbols: &[Symbol]) -> &mut Self {
        self.recoverable_extras.extend_from_slice(symbols);
        self
    }

    /// Non-terminals whose boundaries error recovery resynchronizes on.
    pub fn sync(&mut self, symbols: &[Symbol]) -> &mut Self {
        self.sync_symbols.extend_from_slice(symbols);
        self
    }

    pub fn keywords(&mut self, classifier: KeywordClassifier) -> &mut Self {
        self.keywords = Some(classifier);
        self
    }

    pub fn external_scanner(&mut self, factory: ScannerFactory) -> &mut Self {
        self.scanner = Some(factory);
        self
    }

    pub fn build(self) -> Result<Language, GrammarError> {
        if let Some(problem) = self.problems.into_iter().next() {
            return Err(problem);
        }
        let mut symbols = self
            .symbols
            .into_iter()
            .enumerate()
            .map(|(id, metadata)| metadata.ok_or(GrammarError::UndeclaredSymbol(id as u16)))
            .collect::<Result<Vec<_>, _>>()?;

        let start = self.start.ok_or(GrammarError::MissingStart)?;
        let metadata = |symbol: Symbol| {
            symbols
                .get(symbol.index())
                .ok_or(GrammarError::UndeclaredSymbol(symbol.0))
        };
        if metadata(start)?.is_terminal() {
            return Err(GrammarError::ExpectedNonTerminal(metadata(start)?.name));
        }
        for production in &self.productions {
            if metadata(production.lhs)?.is_terminal() {
                return Err(GrammarError::ExpectedNonTerminal(metadata(production.lhs)?.name));
            }
            for &symbol in &production.rhs {
                metadata(symbol)?;
            }
        }
        for &symbol in self.extras.iter().chain(&self.recoverable_extras) {
            if !metadata(symbol)?.is_terminal() {
                return Err(GrammarError::ExpectedTerminal(metadata(symbol)?.name));
            }
        }
        for &symbol in &self.sync_symbols {
            if metadata(symbol)?.is_terminal() {
                return Err(GrammarError::ExpectedNonTerminal(metadata(symbol)?.name));
            }
        }
        for (id, symbol) in symbols.iter().enumerate() {
            let has_rules = self.productions.iter().any(|p| p.lhs.index() == id);
            if !symbol.is_terminal() && !has_rules {
                return Err(GrammarError::EmptyNonTerminal(symbol.name));
            }
        }
        for (id, symbol) in symbols.iter().enumerate().skip(Symbol::FIRST_GRAMMAR_SYMBOL as usize) {
            let recognized = self.patterns.iter().any(|(s, _)| s.index() == id);
            if symbol.is_terminal() && !recognized {
                return Err(GrammarError::UnreachableTerminal(symbol.name));
            }
        }

        let extras: SymbolSet = self.extras.iter().copied().collect();
        let recoverable_extras: SymbolSet = self.recoverable_extras.iter().copied().collect();
        let lexical = LexicalGrammar::new(self.patterns, self.keywords, self.scanner.is_some());

        // Augmented start `_start -> start`, accepted on end of input.
        let augmented = Symbol(symbols.len() as u16);
        symbols.push(SymbolMetadata {
            name: "_start",
            kind: SymbolKind::NonTerminal,
            visible: false,
            named: false,
        });
        let mut productions = self.productions;
        productions.push(Production {
            lhs: augmented,
            rhs: vec![start],
            precedence: 0,
            assoc: Assoc::None,
            dynamic_precedence: 0,
        });

        let table = build::build_table(&symbols, &productions, &extras, &self.sync_symbols)?;
        tracing::debug!(
            language = self.name,
            states = table.state_count(),
            conflicts = table.conflict_count(),
            "built parse table"
        );

        Ok(Language {
            name: self.name,
            symbols,
            productions,
            table,
            lexical,
            start,
            extras,
            recoverable_extras,
            scanner: self.scanner,
        })
    }

    fn terminal(
        &mut self,
        symbol: Symbol,
        name: &'static str,
        pattern: TokenPattern,
        named: bool,
    ) -> &mut Self {
        self.declare(symbol, name, SymbolKind::Terminal, true, named);
        self.patterns.push((symbol, pattern));
        self
    }

    fn declare(
        &mut self,
        symbol: Symbol,
        name: &'static str,
        kind: SymbolKind,
        visible: bool,
        named: bool,
    ) {
        let index = symbol.index();
        if symbol.0 < Symbol::FIRST_GRAMMAR_SYMBOL {
            self.problems.push(GrammarError::ReservedSymbol(symbol.0));
            return;
        }
        if index >= self.symbols.len() {
            self.symbols.resize(index + 1, None);
        }
        if self.symbols[index].is_some() {
            self.problems.push(GrammarError::DuplicateSymbol(symbol.0));
            return;
        }
        self.symbols[index] = Some(SymbolMetadata {
            name,
            kind,
            visible,
            named,
        });
    }
}
