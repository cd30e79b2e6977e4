//! The GLR driver.
//!
//! ```text
//!            ┌──────────── one version alive? ───────────┐
//!            │ yes                                       │ no
//!   reuse old subtree at position ──(none)──► lex ◄──────┘
//!            │                                 │
//!            └──────────► advance_all(lookahead)
//!                           │ every version: shift / reduce* / accept,
//!                           │ forking on multi-action cells
//!                           ├─ some shifted ──► condense (merge, prune)
//!                           ├─ accepted ──────► finish
//!                           └─ none ──────────► recover (recovery.rs)
//! ```

use std::borrow::Cow;
use std::collections::VecDeque;

use crate::language::{Language, LexMode, ParseAction, ParseTable, ProductionId, Symbol, SymbolSet};
use crate::lexer::{LexOutcome, Lexer, ScannerState, TextSource, Token};
use crate::tree::{LeafInit, NodeInit, Subtree};

use super::options::ParseOptions;
use super::reuse::ReuseCursor;
use super::stack::Version;

/// Reductions allowed while processing one lookahead, across all branches.
pub(super) const MAX_REDUCTIONS: usize = 1024;

/// The token the driver is currently deciding on.
#[derive(Debug, Clone)]
pub(super) struct Lookahead {
    pub symbol: Symbol,
    /// `None` for end of input.
    pub leaf: Option<Subtree>,
    pub start: usize,
    pub end: usize,
    /// One past the last byte that influenced the token.
    pub lookahead_end: usize,
    pub mode: LexMode,
    pub external_before: ScannerState,
    pub external_after: ScannerState,
}

impl Lookahead {
    pub fn is_end(&self) -> bool {
        self.symbol == Symbol::END
    }

    fn from_subtree(subtree: &Subtree, start: usize) -> Self {
        let end = start + subtree.len();
        Self {
            symbol: subtree.symbol(),
            leaf: Some(subtree.clone()),
            start,
            end,
            lookahead_end: end + subtree.lookahead(),
            mode: subtree.lex_mode(),
            external_before: subtree.external_start().clone(),
            external_after: subtree.external_end().clone(),
        }
    }
}

#[derive(Default)]
pub(super) struct Advance {
    pub shifted: Vec<Version>,
    pub accepted: Vec<Version>,
}

enum Reused {
    Node,
    Leaf(Lookahead),
    Nothing,
}

pub(super) struct Driver<'p, C> {
    pub(super) language: &'static Language,
    pub(super) table: &'static ParseTable,
    pub(super) options: &'p ParseOptions,
    pub(super) lexer: Lexer<'static>,
    pub(super) cursor: C,
    pub(super) versions: Vec<Version>,
    reuse: Option<ReuseCursor>,
    /// Start of the next token.
    pub(super) position: usize,
    /// Mode for the next token, set after reusing a node.
    pub(super) lex_override: Option<LexMode>,
    /// External scanner state at `position`.
    pub(super) scanner_state: ScannerState,
    pub(super) tokens_since_fork: usize,
    /// Position of the last recovery and how often it recovered there.
    pub(super) recovery_site: (usize, usize),
}

impl<'p, C: TextSource> Driver<'p, C> {
    pub fn new(
        language: &'static Language,
        options: &'p ParseOptions,
        cursor: C,
        reuse: Option<ReuseCursor>,
    ) -> Self {
        let lexer = Lexer::new(language);
        let scanner_state = lexer.initial_state().clone();
        Self {
            language,
            table: language.table(),
            options,
            lexer,
            cursor,
            versions: vec![Version::new()],
            reuse,
            position: 0,
            lex_override: None,
            scanner_state,
            tokens_since_fork: 0,
            recovery_site: (usize::MAX, 0),
        }
    }

    /// Parse to the end of input. Always produces a tree covering the text.
    pub fn run(mut self) -> Subtree {
        let _span =
            tracing::debug_span!("parse", language = self.language.name(), len = self.cursor.len())
                .entered();
        loop {
            let reused = if self.versions.len() == 1 {
                self.try_reuse()
            } else {
                Reused::Nothing
            };
            let lookahead = match reused {
                Reused::Node => continue,
                Reused::Leaf(lookahead) => lookahead,
                Reused::Nothing => self.lex(),
            };
            if let Some(root) = self.advance_all(lookahead) {
                return root;
            }
        }
    }

    fn advance_all(&mut self, lookahead: Lookahead) -> Option<Subtree> {
        let versions = std::mem::take(&mut self.versions);
        let fragile = versions.len() > 1;
        let mut shifted = Vec::new();
        let mut accepted = Vec::new();
        let mut failed = Vec::new();
        for version in versions {
            let advance = self.advance_version(&version, &lookahead, fragile);
            if advance.shifted.is_empty() && advance.accepted.is_empty() {
                failed.push(version);
            }
            shifted.extend(advance.shifted);
            accepted.extend(advance.accepted);
        }

        if let Some(best) = best_of(accepted) {
            return Some(self.finish(best));
        }
        if shifted.is_empty() {
            let best = best_of(failed).unwrap_or_else(Version::new);
            return self.recover(best, lookahead);
        }
        self.versions = shifted;
        self.consume(&lookahead);
        self.condense();
        None
    }

    /// Feed `lookahead` to one version, following every action of every
    /// cell it meets. `fragile` marks the nodes built as possibly ambiguous.
    pub(super) fn advance_version(
        &self,
        version: &Version,
        lookahead: &Lookahead,
        fragile: bool,
    ) -> Advance {
        let mut advance = Advance::default();
        let mut work = VecDeque::from([version.clone()]);
        let mut reductions = 0;
        while let Some(current) = work.pop_front() {
            let state = current.state();
            let actions = self.table.actions(state, lookahead.symbol);
            if actions.is_empty() {
                if self.language.is_extra(lookahead.symbol) {
                    if let Some(leaf) = &lookahead.leaf {
                        let mut current = current;
                        current.push(state, leaf.with_extra(true));
                        advance.shifted.push(current);
                    }
                }
                continue;
            }

            let fragile = fragile || actions.len() > 1;
            for &action in actions {
                tracing::trace!(state, symbol = lookahead.symbol.0, ?action, "action");
                match action {
                    ParseAction::Shift(next) => {
                        if let Some(leaf) = &lookahead.leaf {
                            let mut branch = current.clone();
                            branch.push(next, leaf.with_extra(false));
                            advance.shifted.push(branch);
                        }
                    }
                    ParseAction::Reduce(production) => {
                        reductions += 1;
                        if reductions > MAX_REDUCTIONS {
                            tracing::warn!(state, "reduction limit reached, dropping branch");
                            continue;
                        }
                        let reduced = self.reduce(&current, production, lookahead, fragile);
                        work.extend(reduced);
                    }
                    ParseAction::Accept => advance.accepted.push(current.clone()),
                }
            }
        }
        advance
    }

    /// Apply one reduction. Hidden children are spliced into the new node;
    /// extras above the last child stay on top of it.
    pub(super) fn reduce(
        &self,
        version: &Version,
        id: ProductionId,
        lookahead: &Lookahead,
        fragile: bool,
    ) -> Option<Version> {
        let production = self.language.production(id);
        let popped = version.pop(production.rhs.len())?;
        let state = popped.base.state;
        let goto = self.table.goto(state, production.lhs)?;

        let mut children = Vec::with_capacity(popped.children.len());
        for child in popped.children {
            if !child.is_leaf() && !child.is_extra() && !self.language.is_visible(child.symbol()) {
                children.extend(child.into_children());
            } else {
                children.push(child);
            }
        }
        let node = Subtree::node(NodeInit {
            symbol: production.lhs,
            children,
            production: Some(id),
            parse_state: state,
            end_mode: lookahead.mode,
            trailing_lookahead: lookahead.lookahead_end.saturating_sub(popped.end),
            fragile,
            extra: false,
            dynamic_precedence: production.dynamic_precedence,
            empty_mode: lookahead.mode,
            empty_external: lookahead.external_before.clone(),
        });

        let mut reduced = Version {
            head: popped.base,
            cost: version.cost,
            dynamic_precedence: version.dynamic_precedence + production.dynamic_precedence,
        };
        reduced.push(goto, node);
        for extra in popped.trailing {
            reduced.push(goto, extra);
        }
        Some(reduced)
    }

    /// Build the root from an accepted version. Extras before and after the
    /// start node become the root's first and last children.
    fn finish(&self, version: Version) -> Subtree {
        tracing::debug!(
            cost = ?version.cost,
            dynamic_precedence = version.dynamic_precedence,
            "accepted"
        );
        let start = self.language.start_symbol();
        let entries = version.entries();
        if let [only] = entries.as_slice() {
            if !only.is_extra() {
                return only.clone();
            }
        }

        let mut children = Vec::with_capacity(entries.len());
        let mut main = None;
        for entry in entries {
            if main.is_none() && !entry.is_extra() && entry.symbol() == start {
                main = Some((entry.production(), entry.parse_state()));
                children.extend(entry.into_children());
            } else {
                children.push(entry);
            }
        }
        let (production, parse_state) = main.unwrap_or((None, 0));
        Subtree::node(NodeInit {
            symbol: start,
            children,
            production,
            parse_state,
            end_mode: LexMode::ERROR,
            trailing_lookahead: 1,
            fragile: false,
            extra: false,
            dynamic_precedence: 0,
            empty_mode: LexMode::ERROR,
            empty_external: self.scanner_state.clone(),
        })
    }

    pub(super) fn consume(&mut self, lookahead: &Lookahead) {
        self.position = lookahead.end;
        self.scanner_state = lookahead.external_after.clone();
        if !self.language.is_extra(lookahead.symbol) {
            self.lex_override = None;
        }
    }

    /// Merge versions with identical futures, then enforce the fork limits.
    fn condense(&mut self) {
        let mut index = 0;
        while index < self.versions.len() {
            let mut other = index + 1;
            while other < self.versions.len() {
                if self.versions[index].can_merge(&self.versions[other]) {
                    let loser = self.versions.remove(other);
                    if loser.rank() < self.versions[index].rank() {
                        self.versions[index] = loser;
                    }
                    tracing::trace!(state = self.versions[index].state(), "merged versions");
                } else {
                    other += 1;
                }
            }
            index += 1;
        }

        if self.versions.len() > self.options.max_versions {
            tracing::warn!(
                versions = self.versions.len(),
                limit = self.options.max_versions,
                position = self.position,
                "too many stack versions, pruning"
            );
            self.versions.sort_by_key(Version::rank);
            self.versions.truncate(self.options.max_versions);
        }

        if self.versions.len() > 1 {
            self.tokens_since_fork += 1;
            if self.tokens_since_fork > self.options.max_fork_window {
                tracing::warn!(
                    versions = self.versions.len(),
                    position = self.position,
                    "ambiguity not resolved within the fork window, keeping the best version"
                );
                let versions = std::mem::take(&mut self.versions);
                self.versions.extend(best_of(versions));
                self.tokens_since_fork = 0;
            }
        } else {
            self.tokens_since_fork = 0;
        }
    }

    /// Mode and admissible terminals for the next token.
    pub(super) fn lex_mode(&self) -> (LexMode, Cow<'static, SymbolSet>) {
        let table = self.table;
        if let Some(mode) = self.lex_override {
            return (mode, Cow::Borrowed(table.valid_for_mode(mode)));
        }
        let Some(first) = self.versions.first() else {
            return (LexMode::ERROR, Cow::Borrowed(table.all_terminals()));
        };
        let mode = table.lex_mode(first.state());
        if self.versions.iter().all(|version| table.lex_mode(version.state()) == mode) {
            return (mode, Cow::Borrowed(table.valid_for_mode(mode)));
        }
        let mut valid = SymbolSet::with_capacity(self.language.symbol_count());
        for version in &self.versions {
            valid.union_with(table.valid_terminals(version.state()));
        }
        (LexMode::MIXED, Cow::Owned(valid))
    }

    fn lex(&mut self) -> Lookahead {
        let (mode, valid) = self.lex_mode();
        self.lexer.restore(&self.scanner_state);
        match self.lexer.next_token(&mut self.cursor, self.position, mode, &valid) {
            LexOutcome::Token(token) => self.token_lookahead(token),
            LexOutcome::EndOfInput => self.end_of_input(mode),
            LexOutcome::NoMatch => self.lex_error(mode),
        }
    }

    fn end_of_input(&self, mode: LexMode) -> Lookahead {
        Lookahead {
            symbol: Symbol::END,
            leaf: None,
            start: self.position,
            end: self.position,
            lookahead_end: self.cursor.len() + 1,
            mode,
            external_before: self.scanner_state.clone(),
            external_after: self.scanner_state.clone(),
        }
    }

    /// Nothing admissible matched: try every terminal, then give up and
    /// group characters into an ERROR token until something lexes again.
    fn lex_error(&mut self, mode: LexMode) -> Lookahead {
        let all = self.table.all_terminals();
        if mode != LexMode::ERROR {
            self.lexer.restore(&self.scanner_state);
            match self.lexer.next_token(&mut self.cursor, self.position, LexMode::ERROR, all) {
                LexOutcome::Token(token) => return self.token_lookahead(token),
                LexOutcome::EndOfInput => return self.end_of_input(LexMode::ERROR),
                LexOutcome::NoMatch => {}
            }
        }

        let start = self.position;
        let len = self.cursor.len();
        let mut end = start;
        let mut furthest = self.cursor.furthest_read();
        loop {
            self.cursor.seek(end);
            self.cursor.advance();
            let next = self.cursor.position();
            if next <= end {
                break;
            }
            end = next;
            if end >= len {
                break;
            }
            self.lexer.restore(&self.scanner_state);
            let outcome = self.lexer.next_token(&mut self.cursor, end, LexMode::ERROR, all);
            furthest = furthest.max(self.cursor.furthest_read());
            if !matches!(outcome, LexOutcome::NoMatch) {
                break;
            }
        }
        self.lexer.restore(&self.scanner_state);
        tracing::debug!(start, end, "unrecognized characters");

        let leaf = Subtree::leaf(LeafInit {
            symbol: Symbol::ERROR,
            size: end - start,
            lookahead: furthest.saturating_sub(end),
            lex_mode: LexMode::ERROR,
            extra: false,
            fragile: self.versions.len() > 1,
            external_start: self.scanner_state.clone(),
            external_end: self.scanner_state.clone(),
        });
        Lookahead::from_subtree(&leaf, start)
    }

    fn token_lookahead(&self, token: Token) -> Lookahead {
        let Token {
            symbol,
            start,
            end,
            lookahead_end,
            mode,
            external_before,
            external_after,
        } = token;
        let leaf = Subtree::leaf(LeafInit {
            symbol,
            size: end - start,
            lookahead: lookahead_end - end,
            lex_mode: mode,
            extra: self.language.is_extra(symbol),
            fragile: self.versions.len() > 1,
            external_start: external_before.clone(),
            external_end: external_after.clone(),
        });
        let leaf = self.identical_old_leaf(&leaf, start).unwrap_or(leaf);
        Lookahead {
            symbol,
            leaf: Some(leaf),
            start,
            end,
            lookahead_end,
            mode,
            external_before,
            external_after,
        }
    }

    /// An old leaf at `start` indistinguishable from the fresh one, so the
    /// new tree shares it.
    fn identical_old_leaf(&self, fresh: &Subtree, start: usize) -> Option<Subtree> {
        if self.versions.len() != 1 {
            return None;
        }
        let old = self.reuse.as_ref()?.leaf_at(start)?;
        let identical = old.symbol() == fresh.symbol()
            && old.len() == fresh.len()
            && old.lookahead() == fresh.lookahead()
            && old.lex_mode() == fresh.lex_mode()
            && old.is_extra() == fresh.is_extra()
            && old.external_start() == fresh.external_start()
            && old.external_end() == fresh.external_end()
            && !old.has_changes()
            && !old.has_error()
            && !old.is_fragile()
            && !fresh.is_fragile();
        identical.then_some(old)
    }

    fn try_reuse(&mut self) -> Reused {
        let Some(mut reuse) = self.reuse.take() else {
            return Reused::Nothing;
        };
        let (mode, _) = self.lex_mode();
        let mut reused = Reused::Nothing;
        if mode.is_exact() {
            while let Some((subtree, start)) = reuse.candidate(self.position) {
                if !self.reusable(&reuse, &subtree, start, mode) {
                    reuse.reject();
                    continue;
                }
                if subtree.is_leaf() {
                    reuse.advance();
                    reused = Reused::Leaf(Lookahead::from_subtree(&subtree, start));
                    break;
                }
                if self.push_reused_node(&subtree) {
                    tracing::debug!(
                        symbol = self.language.symbol_name(subtree.symbol()),
                        start,
                        len = subtree.len(),
                        depth = reuse.depth(),
                        "reused node"
                    );
                    reuse.advance();
                    reused = Reused::Node;
                    break;
                }
                reuse.reject();
            }
        }
        self.reuse = Some(reuse);
        reused
    }

    fn reusable(
        &self,
        reuse: &ReuseCursor,
        subtree: &Subtree,
        start: usize,
        mode: LexMode,
    ) -> bool {
        let extra_ok = !subtree.is_extra()
            || (subtree.is_leaf() && self.language.is_extra(subtree.symbol()));
        extra_ok
            && !subtree.has_changes()
            && !subtree.has_error()
            && !subtree.is_fragile()
            && !subtree.is_missing()
            && !subtree.is_empty()
            && subtree.lex_mode() == mode
            && *subtree.external_start() == self.scanner_state
            && !reuse
                .log()
                .is_dirty(start..start + subtree.len() + subtree.lookahead())
    }

    /// Push an old node as a whole, after the reductions its first token
    /// would have triggered. Leaves the stack untouched on failure.
    fn push_reused_node(&mut self, node: &Subtree) -> bool {
        let mut first = node;
        while !first.is_leaf() {
            match first.children().first() {
                Some(child) if !child.is_empty() => first = child,
                _ => return false,
            }
        }
        let lookahead = Lookahead::from_subtree(first, self.position);

        let Some(mut version) = self.versions.first().cloned() else {
            return false;
        };
        for _ in 0..MAX_REDUCTIONS {
            let &[ParseAction::Reduce(production)] =
                self.table.actions(version.state(), lookahead.symbol)
            else {
                break;
            };
            match self.reduce(&version, production, &lookahead, false) {
                Some(reduced) => version = reduced,
                None => return false,
            }
        }

        let state = version.state();
        if state != node.parse_state()
            || !matches!(self.table.actions(state, lookahead.symbol), [ParseAction::Shift(_)])
        {
            return false;
        }
        let Some(goto) = self.table.goto(state, node.symbol()) else {
            return false;
        };
        version.push(goto, node.clone());
        self.versions = vec![version];
        self.position += node.len();
        self.lex_override = Some(node.end_mode());
        self.scanner_state = node.external_end().clone();
        true
    }
}

/// The best version: lowest cost, then highest dynamic precedence, then the
/// earliest in the list.
pub(super) fn best_of(versions: Vec<Version>) -> Option<Version> {
    let mut best: Option<Version> = None;
    for version in versions {
        match &best {
            Some(current) if current.rank() <= version.rank() => {}
            _ => best = Some(version),
        }
    }
    best
}
