//! Contextual lexer.
//!
//! The driver hands the lexer the set of terminals the current parse state
//! can shift; only those are attempted. Keyword-vs-identifier decisions are
//! therefore made by grammar context:
//!
//! ```text
//! external scanner ─► literals / matchers ─► word + keyword classifier
//!   (first, if any      (longest match;         (wins only when strictly
//!    external token       literals beat          longer than the best
//!    is admissible)       matchers on ties)      literal or matcher)
//! ```

mod cursor;
mod external;

pub use cursor::{ChunkedCursor, Cursor, StrCursor, TextSource};
pub use external::{ExternalScanner, ScannerState};

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::language::{KeywordClassifier, Language, LexMode, Symbol, SymbolSet, TokenPattern};

type MatchFn = fn(&mut dyn Cursor) -> bool;

#[derive(Clone, Copy)]
enum Recognizer {
    Literal(&'static str),
    Matcher(MatchFn),
}

enum Keywords {
    Classifier(KeywordClassifier),
    Table(FxHashMap<&'static str, Symbol>),
}

/// The lexical half of a grammar.
pub struct LexicalGrammar {
    recognizers: Vec<(Symbol, Recognizer)>,
    word: Option<(Symbol, MatchFn)>,
    keywords: Keywords,
    keyword_symbols: SymbolSet,
    external_symbols: SymbolSet,
}

impl LexicalGrammar {
    pub(crate) fn new(
        patterns: Vec<(Symbol, TokenPattern)>,
        classifier: Option<KeywordClassifier>,
        has_scanner: bool,
    ) -> Self {
        let word = patterns.iter().find_map(|&(symbol, pattern)| match pattern {
            TokenPattern::Word(matcher) => Some((symbol, matcher as MatchFn)),
            _ => None,
        });

        let mut recognizers = Vec::new();
        let mut table = FxHashMap::default();
        let mut keyword_symbols = SymbolSet::new();
        let mut external_symbols = SymbolSet::new();
        for (symbol, pattern) in patterns {
            match pattern {
                TokenPattern::Literal(text) if word.is_some() && is_word_shaped(text) => {
                    table.insert(text, symbol);
                    keyword_symbols.insert(symbol);
                }
                TokenPattern::Literal(text) => {
                    recognizers.push((symbol, Recognizer::Literal(text)));
                }
                TokenPattern::Matcher(matcher) => {
                    recognizers.push((symbol, Recognizer::Matcher(matcher)));
                }
                TokenPattern::Keyword => {
                    keyword_symbols.insert(symbol);
                }
                TokenPattern::External if has_scanner => {
                    external_symbols.insert(symbol);
                }
                TokenPattern::External | TokenPattern::Word(_) => {}
            }
        }

        let keywords = match classifier {
            Some(classifier) => Keywords::Classifier(classifier),
            None => Keywords::Table(table),
        };
        Self {
            recognizers,
            word,
            keywords,
            keyword_symbols,
            external_symbols,
        }
    }

    /// Keyword terminals a word can stand for, most specific first.
    pub fn classify(&self, word: &str) -> &[Symbol] {
        match &self.keywords {
            Keywords::Classifier(classifier) => classifier(word),
            Keywords::Table(table) => table.get(word).map_or(&[][..], std::slice::from_ref),
        }
    }

    pub fn word_symbol(&self) -> Option<Symbol> {
        self.word.map(|(symbol, _)| symbol)
    }

    pub fn is_external(&self, symbol: Symbol) -> bool {
        self.external_symbols.contains(symbol)
    }
}

fn is_word_shaped(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// A token produced by [`Lexer::next_token`]. Offsets are absolute bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    pub start: usize,
    pub end: usize,
    /// One past the last byte inspected while producing the token.
    pub lookahead_end: usize,
    pub mode: LexMode,
    pub external_before: ScannerState,
    pub external_after: ScannerState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexOutcome {
    Token(Token),
    /// Nothing admissible matches here.
    NoMatch,
    EndOfInput,
}

/// Turns text into tokens for one parser. Owns the parser's external scanner.
pub struct Lexer<'l> {
    grammar: &'l LexicalGrammar,
    scanner: Option<Box<dyn ExternalScanner>>,
    initial: ScannerState,
    state: ScannerState,
}

impl<'l> Lexer<'l> {
    pub fn new(language: &'l Language) -> Self {
        let mut scanner = language.new_external_scanner();
        let initial: ScannerState = match scanner.as_mut() {
            Some(scanner) => {
                scanner.reset();
                Arc::from(scanner.serialize())
            }
            None => Arc::from(Vec::new()),
        };
        Self {
            grammar: language.lexical(),
            scanner,
            state: initial.clone(),
            initial,
        }
    }

    /// External scanner state at the current position.
    pub fn scanner_state(&self) -> &ScannerState {
        &self.state
    }

    pub fn initial_state(&self) -> &ScannerState {
        &self.initial
    }

    pub fn restore(&mut self, state: &ScannerState) {
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.deserialize(state);
        }
        self.state = state.clone();
    }

    pub fn reset(&mut self) {
        let initial = self.initial.clone();
        self.restore(&initial);
    }

    /// Lex one token at `start`, trying only the members of `valid`.
    pub fn next_token<C: TextSource>(
        &mut self,
        cursor: &mut C,
        start: usize,
        mode: LexMode,
        valid: &SymbolSet,
    ) -> LexOutcome {
        cursor.seek(start);
        cursor.begin_token();
        if start >= cursor.len() {
            return LexOutcome::EndOfInput;
        }
        let before = self.state.clone();

        if let Some(token) = self.scan_external(cursor, start, mode, valid, &before) {
            return LexOutcome::Token(token);
        }

        let mut best: Option<(Symbol, usize, bool)> = None;
        for &(symbol, recognizer) in &self.grammar.recognizers {
            if !valid.contains(symbol) {
                continue;
            }
            cursor.seek(start);
            let (matched, literal) = match recognizer {
                Recognizer::Literal(text) => (match_literal(cursor, text), true),
                Recognizer::Matcher(matcher) => {
                    (matcher(cursor).then(|| cursor.token_end()), false)
                }
            };
            let Some(end) = matched.filter(|&end| end > start) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, best_end, best_literal)) => {
                    end > best_end || (end == best_end && literal && !best_literal)
                }
            };
            if better {
                best = Some((symbol, end, literal));
            }
        }

        let mut best = best.map(|(symbol, end, _)| (symbol, end));
        if let Some(word) = self.scan_word(cursor, start, valid, best.is_none()) {
            if best.is_none_or(|(_, end)| word.1 > end) {
                best = Some(word);
            }
        }

        match best {
            Some((symbol, end)) => LexOutcome::Token(Token {
                symbol,
                start,
                end,
                lookahead_end: cursor.furthest_read().max(end),
                mode,
                external_before: before.clone(),
                external_after: before,
            }),
            None => LexOutcome::NoMatch,
        }
    }

    fn scan_external<C: TextSource>(
        &mut self,
        cursor: &mut C,
        start: usize,
        mode: LexMode,
        valid: &SymbolSet,
        before: &ScannerState,
    ) -> Option<Token> {
        let scanner = self.scanner.as_mut()?;
        if !valid.intersects(&self.grammar.external_symbols) {
            return None;
        }
        cursor.seek(start);
        let result = scanner.scan(cursor, valid);
        let end = cursor.token_end();
        let symbol = match result {
            Some(symbol)
                if end > start && valid.contains(symbol) && self.grammar.is_external(symbol) =>
            {
                symbol
            }
            _ => {
                scanner.deserialize(before);
                return None;
            }
        };
        let serialized = scanner.serialize();
        let after = if *serialized == **before {
            before.clone()
        } else {
            Arc::from(serialized)
        };
        self.state = after.clone();
        tracing::trace!(symbol = symbol.0, start, end, "external token");
        Some(Token {
            symbol,
            start,
            end,
            lookahead_end: cursor.furthest_read().max(end),
            mode,
            external_before: before.clone(),
            external_after: after,
        })
    }

    /// Scan the word token and classify it. `fallback` admits the first
    /// keyword candidate even when no candidate is admissible.
    fn scan_word<C: TextSource>(
        &self,
        cursor: &mut C,
        start: usize,
        valid: &SymbolSet,
        fallback: bool,
    ) -> Option<(Symbol, usize)> {
        let (word_symbol, matcher) = self.grammar.word?;
        if !valid.contains(word_symbol) && !valid.intersects(&self.grammar.keyword_symbols) {
            return None;
        }
        cursor.seek(start);
        if !matcher(cursor) {
            return None;
        }
        let end = cursor.token_end();
        if end <= start {
            return None;
        }
        let text = cursor.text(start..end);
        let candidates = self.grammar.classify(&text);
        let symbol = candidates
            .iter()
            .copied()
            .find(|&candidate| valid.contains(candidate))
            .or_else(|| valid.contains(word_symbol).then_some(word_symbol))
            .or_else(|| candidates.first().copied().filter(|_| fallback))?;
        Some((symbol, end))
    }
}

fn match_literal(cursor: &mut dyn Cursor, text: &str) -> Option<usize> {
    for expected in text.chars() {
        if cursor.peek() != Some(expected) {
            return None;
        }
        cursor.advance();
    }
    Some(cursor.position())
}
