//! Error recovery.
//!
//! Runs when no version can take the lookahead. Only the best failed
//! version is repaired. Strategies, cheapest first:
//!
//! 1. an ERROR token is set aside as an extra;
//! 2. a recoverable extra is set aside as an ordinary extra;
//! 3. deleting the lookahead or inserting up to
//!    [`ParseOptions::max_inserted_tokens`] MISSING tokens before it, scored
//!    by how far a simulated parse gets afterwards;
//! 4. popping the stack to a synchronization state that accepts the
//!    lookahead, wrapping what was popped in an ERROR node;
//! 5. skipping the lookahead.
//!
//! Each repair either consumes input or is retried at most
//! [`MAX_ATTEMPTS`] times at one position, so parsing always terminates.
//!
//! [`ParseOptions::max_inserted_tokens`]: super::ParseOptions::max_inserted_tokens

use std::collections::VecDeque;

use crate::language::{LexMode, ParseAction, StateId, Symbol};
use crate::lexer::{LexOutcome, ScannerState, TextSource};
use crate::tree::{NodeInit, Subtree};

use super::driver::{Driver, Lookahead, MAX_REDUCTIONS};
use super::stack::{StackNode, Version};

/// Recoveries allowed at one position before the lookahead is skipped.
const MAX_ATTEMPTS: usize = 3;

enum RepairKind {
    Delete,
    Insert(Vec<Symbol>),
}

struct Repair {
    kind: RepairKind,
    accepted: bool,
    /// Real tokens consumed after the repair.
    reached: usize,
    /// Tokens deleted or inserted.
    cost: usize,
    /// One past the last byte the simulation looked at.
    furthest: usize,
}

impl Repair {
    fn beats(&self, other: &Repair) -> bool {
        (self.accepted, self.reached, std::cmp::Reverse(self.cost))
            > (other.accepted, other.reached, std::cmp::Reverse(other.cost))
    }
}

struct Simulated {
    accepted: bool,
    reached: usize,
    furthest: usize,
}

enum Fed {
    Shifted,
    Accepted,
    Failed,
}

/// The states of a version's stack, pulled lazily from below as simulated
/// reductions pop past what was copied.
struct SimStack<'a> {
    states: VecDeque<StateId>,
    rest: Option<&'a StackNode>,
}

impl<'a> SimStack<'a> {
    fn new(head: &'a StackNode) -> Self {
        let top = skip_extras(head);
        Self {
            states: VecDeque::from([top.state]),
            rest: top.prev.as_deref(),
        }
    }

    fn top(&self) -> StateId {
        self.states.back().copied().unwrap_or(0)
    }

    fn push(&mut self, state: StateId) {
        self.states.push_back(state);
    }

    fn pop(&mut self, count: usize) -> bool {
        while self.states.len() <= count {
            let Some(rest) = self.rest else {
                return false;
            };
            let node = skip_extras(rest);
            self.states.push_front(node.state);
            self.rest = node.prev.as_deref();
        }
        self.states.truncate(self.states.len() - count);
        true
    }
}

/// The first node at or below `node` that holds a non-extra or is the bottom.
fn skip_extras(mut node: &StackNode) -> &StackNode {
    while node.is_extra() {
        match node.prev.as_deref() {
            Some(prev) => node = prev,
            None => break,
        }
    }
    node
}

impl<C: TextSource> Driver<'_, C> {
    /// Repair `version` so parsing can go on. Returns the root only when the
    /// input ended and nothing else worked.
    pub(super) fn recover(&mut self, version: Version, lookahead: Lookahead) -> Option<Subtree> {
        self.lex_override = None;
        self.tokens_since_fork = 0;
        let attempts = self.note_recovery(lookahead.start);
        tracing::debug!(
            position = lookahead.start,
            symbol = self.language.symbol_name(lookahead.symbol),
            state = version.state(),
            attempts,
            "recovering"
        );

        if lookahead.symbol == Symbol::ERROR {
            self.skip(version, &lookahead, lookahead.lookahead_end);
            return None;
        }
        if self.language.is_recoverable_extra(lookahead.symbol) {
            if let Some(leaf) = &lookahead.leaf {
                let mut version = version;
                version.push(version.state(), leaf.with_extra(true));
                self.versions = vec![version];
                self.consume(&lookahead);
                return None;
            }
        }

        if attempts <= MAX_ATTEMPTS {
            if let Some(repair) = self.best_repair(&version, &lookahead) {
                match repair.kind {
                    RepairKind::Delete => {
                        tracing::debug!(
                            start = lookahead.start,
                            end = lookahead.end,
                            "deleted token"
                        );
                        self.skip(version, &lookahead, repair.furthest);
                        return None;
                    }
                    RepairKind::Insert(symbols) => {
                        if self.insert_missing(&version, &symbols, &lookahead, repair.furthest) {
                            return None;
                        }
                    }
                }
            }
            if let Some(synchronized) = self.synchronize(&version, &lookahead) {
                self.versions = vec![synchronized];
                return None;
            }
        }

        if lookahead.is_end() {
            tracing::debug!("no repair reaches the end of input, wrapping the stack in ERROR");
            return Some(self.fallback_root(&version, &lookahead));
        }
        self.skip(version, &lookahead, lookahead.lookahead_end);
        None
    }

    fn note_recovery(&mut self, position: usize) -> usize {
        let (site, count) = &mut self.recovery_site;
        if *site == position {
            *count += 1;
        } else {
            *site = position;
            *count = 1;
        }
        *count
    }

    /// Put the lookahead into an ERROR extra and move past it.
    fn skip(&mut self, version: Version, lookahead: &Lookahead, furthest: usize) {
        if let Some(leaf) = &lookahead.leaf {
            let version = self.push_error(version, leaf, lookahead, furthest);
            self.versions = vec![version];
        } else {
            self.versions = vec![version];
        }
        self.consume(lookahead);
    }

    /// Add `leaf` to the ERROR extra on top of the stack (looking through
    /// other extras), or start a new one.
    fn push_error(
        &self,
        mut version: Version,
        leaf: &Subtree,
        lookahead: &Lookahead,
        furthest: usize,
    ) -> Version {
        let mut node = version.head.clone();
        let mut above = Vec::new();
        let target = loop {
            let Some(subtree) = node.subtree.clone() else {
                break None;
            };
            if !subtree.is_extra() {
                break None;
            }
            if subtree.is_error() && !subtree.is_leaf() {
                break Some(subtree);
            }
            above.push(subtree);
            match node.prev.clone() {
                Some(prev) => node = prev,
                None => break None,
            }
        };

        version.cost.skipped_bytes += leaf.len() as u32;
        match target {
            Some(error) => {
                let Some(base) = node.prev.clone() else {
                    return version;
                };
                let mut children = error.children().to_vec();
                children.extend(above.into_iter().rev());
                children.push(leaf.clone());
                let state = base.state;
                let merged = self.error_node(children, lookahead, lookahead.end, furthest);
                version.head = base;
                version.push(state, merged);
            }
            None if leaf.is_error() => {
                version.cost.error_nodes += 1;
                version.push(version.state(), leaf.with_extra(true));
            }
            None => {
                version.cost.error_nodes += 1;
                let error = self.error_node(vec![leaf.clone()], lookahead, lookahead.end, furthest);
                version.push(version.state(), error);
            }
        }
        version
    }

    /// An ERROR extra ending at `end` whose content depended on bytes up to `furthest`.
    fn error_node(
        &self,
        children: Vec<Subtree>,
        lookahead: &Lookahead,
        end: usize,
        furthest: usize,
    ) -> Subtree {
        Subtree::node(NodeInit {
            symbol: Symbol::ERROR,
            children,
            production: None,
            parse_state: crate::language::NO_STATE,
            end_mode: lookahead.mode,
            trailing_lookahead: furthest.saturating_sub(end),
            fragile: false,
            extra: true,
            dynamic_precedence: 0,
            empty_mode: lookahead.mode,
            empty_external: lookahead.external_before.clone(),
        })
    }

    /// Children for an ERROR node built from discarded stack entries.
    /// Nested ERROR and hidden nodes are opened up; MISSING tokens are dropped.
    fn discarded(&self, entries: Vec<Subtree>) -> Vec<Subtree> {
        let mut children = Vec::with_capacity(entries.len());
        let mut pending: Vec<Subtree> = entries.into_iter().rev().collect();
        while let Some(entry) = pending.pop() {
            if entry.is_missing() {
                continue;
            }
            let open = !entry.is_leaf()
                && (entry.is_error() || !self.language.is_visible(entry.symbol()));
            if open {
                pending.extend(entry.into_children().into_iter().rev());
            } else {
                children.push(entry);
            }
        }
        children
    }

    fn best_repair(&mut self, version: &Version, lookahead: &Lookahead) -> Option<Repair> {
        let mut best: Option<Repair> = None;
        let mut budget = self.options.max_recovery_candidates;
        let consider = |repair: Repair, best: &mut Option<Repair>| {
            if best.as_ref().is_none_or(|best| repair.beats(best)) {
                *best = Some(repair);
            }
        };
        let settled = |best: &Option<Repair>| {
            best.as_ref().is_some_and(|best| {
                best.accepted && best.cost <= 1 && matches!(best.kind, RepairKind::Insert(_))
            })
        };

        if !lookahead.is_end() && budget > 0 {
            budget -= 1;
            let outcome = self.simulate(version, &[], lookahead.end, &lookahead.external_after);
            if let Some(outcome) = outcome {
                consider(
                    Repair {
                        kind: RepairKind::Delete,
                        accepted: outcome.accepted,
                        reached: outcome.reached,
                        cost: 1,
                        furthest: outcome.furthest,
                    },
                    &mut best,
                );
            }
        }

        let mut prefixes: Vec<Vec<Symbol>> = Vec::new();
        if self.options.max_inserted_tokens >= 1 {
            let first_tokens = self.insertable(version.state());
            prefixes.extend(first_tokens.into_iter().map(|symbol| vec![symbol]));
        }
        let singles = prefixes.len();
        for index in 0.. {
            if settled(&best) || budget == 0 {
                break;
            }
            if index == singles && self.options.max_inserted_tokens >= 2 {
                for first in 0..singles {
                    let first = prefixes[first][0];
                    if let Some(state) = self.state_after(version, first) {
                        let seconds = self.insertable(state);
                        prefixes.extend(seconds.into_iter().map(|second| vec![first, second]));
                    }
                }
            }
            let Some(prefix) = prefixes.get(index) else {
                break;
            };
            budget -= 1;
            let mut symbols = prefix.clone();
            symbols.push(lookahead.symbol);
            let outcome =
                self.simulate(version, &symbols, lookahead.end, &lookahead.external_after);
            let Some(outcome) = outcome else {
                continue;
            };
            let reached = outcome.reached + usize::from(!lookahead.is_end());
            let inserted = symbols.len() - 1;
            consider(
                Repair {
                    kind: RepairKind::Insert(prefix.clone()),
                    accepted: outcome.accepted,
                    reached,
                    cost: inserted,
                    furthest: outcome.furthest,
                },
                &mut best,
            );
        }

        best.filter(|best| best.accepted || best.reached >= self.options.min_repair_progress)
    }

    /// Terminals worth inserting in `state`.
    fn insertable(&self, state: StateId) -> Vec<Symbol> {
        self.table
            .valid_terminals(state)
            .iter()
            .filter(|&symbol| {
                symbol != Symbol::END
                    && symbol != Symbol::ERROR
                    && !self.language.is_extra(symbol)
                    && !self.language.is_recoverable_extra(symbol)
                    && !self.table.actions(state, symbol).is_empty()
            })
            .collect()
    }

    fn state_after(&self, version: &Version, symbol: Symbol) -> Option<StateId> {
        let mut stack = SimStack::new(&version.head);
        match self.feed(&mut stack, symbol) {
            Fed::Shifted => Some(stack.top()),
            Fed::Accepted | Fed::Failed => None,
        }
    }

    /// Feed `symbol` following the first action of every cell.
    fn feed(&self, stack: &mut SimStack<'_>, symbol: Symbol) -> Fed {
        for _ in 0..MAX_REDUCTIONS {
            match self.table.actions(stack.top(), symbol).first() {
                None => return Fed::Failed,
                Some(&ParseAction::Shift(next)) => {
                    stack.push(next);
                    return Fed::Shifted;
                }
                Some(&ParseAction::Accept) => return Fed::Accepted,
                Some(&ParseAction::Reduce(id)) => {
                    let production = self.language.production(id);
                    if !stack.pop(production.rhs.len()) {
                        return Fed::Failed;
                    }
                    let Some(goto) = self.table.goto(stack.top(), production.lhs) else {
                        return Fed::Failed;
                    };
                    stack.push(goto);
                }
            }
        }
        Fed::Failed
    }

    /// Feed `prefix`, then lex and feed real tokens from `resume` until
    /// [`ParseOptions::recovery_lookahead`] of them were taken or one fails.
    /// `None` when the prefix itself fails.
    ///
    /// [`ParseOptions::recovery_lookahead`]: super::ParseOptions::recovery_lookahead
    fn simulate(
        &mut self,
        version: &Version,
        prefix: &[Symbol],
        resume: usize,
        scanner: &ScannerState,
    ) -> Option<Simulated> {
        let mut stack = SimStack::new(&version.head);
        for &symbol in prefix {
            match self.feed(&mut stack, symbol) {
                Fed::Shifted => {}
                Fed::Accepted => {
                    return Some(Simulated {
                        accepted: true,
                        reached: 0,
                        furthest: self.cursor.len() + 1,
                    });
                }
                Fed::Failed => return None,
            }
        }

        self.lexer.restore(scanner);
        let mut position = resume;
        let mut furthest = resume;
        let mut reached = 0;
        let mut accepted = false;
        while reached < self.options.recovery_lookahead {
            let mode = self.table.lex_mode(stack.top());
            let valid = self.table.valid_for_mode(mode);
            match self.lexer.next_token(&mut self.cursor, position, mode, valid) {
                LexOutcome::Token(token) => {
                    furthest = furthest.max(token.lookahead_end);
                    position = token.end;
                    let skippable = self.language.is_extra(token.symbol)
                        && self.table.actions(stack.top(), token.symbol).is_empty();
                    if skippable {
                        continue;
                    }
                    match self.feed(&mut stack, token.symbol) {
                        Fed::Shifted => reached += 1,
                        Fed::Accepted => {
                            accepted = true;
                            break;
                        }
                        Fed::Failed => break,
                    }
                }
                LexOutcome::EndOfInput => {
                    furthest = self.cursor.len() + 1;
                    accepted = matches!(self.feed(&mut stack, Symbol::END), Fed::Accepted);
                    break;
                }
                LexOutcome::NoMatch => break,
            }
        }
        self.lexer.restore(&self.scanner_state);
        Some(Simulated {
            accepted,
            reached,
            furthest,
        })
    }

    /// Push MISSING tokens for `symbols` in front of the lookahead, which is
    /// then retried.
    fn insert_missing(
        &mut self,
        version: &Version,
        symbols: &[Symbol],
        lookahead: &Lookahead,
        furthest: usize,
    ) -> bool {
        let mut current = version.clone();
        for &symbol in symbols {
            let mode = self.table.lex_mode(current.state());
            let missing = Subtree::missing(symbol, mode, lookahead.external_before.clone());
            let inserted = Lookahead {
                symbol,
                leaf: Some(missing),
                start: lookahead.start,
                end: lookahead.start,
                lookahead_end: furthest,
                mode,
                external_before: lookahead.external_before.clone(),
                external_after: lookahead.external_before.clone(),
            };
            let advance = self.advance_version(&current, &inserted, false);
            let Some(mut next) = advance.shifted.into_iter().next() else {
                return false;
            };
            next.cost.missing += 1;
            current = next;
            tracing::debug!(
                symbol = self.language.symbol_name(symbol),
                position = lookahead.start,
                "inserted missing token"
            );
        }
        self.versions = vec![current];
        true
    }

    /// Pop entries until a synchronization state that can take the
    /// lookahead, wrapping the popped entries in an ERROR extra.
    fn synchronize(&self, version: &Version, lookahead: &Lookahead) -> Option<Version> {
        let mut node = version.head.clone();
        let mut popped = Vec::new();
        for _ in 0..self.options.max_error_depth {
            popped.push(node.subtree.clone()?);
            node = node.prev.clone()?;
            if !self.table.is_sync_state(node.state) {
                continue;
            }
            let mut stack = SimStack::new(&node);
            if matches!(self.feed(&mut stack, lookahead.symbol), Fed::Failed) {
                continue;
            }

            popped.reverse();
            let skipped: usize = popped.iter().map(Subtree::len).sum();
            let children = self.discarded(popped);
            let end = version.position();
            let error = self.error_node(children, lookahead, end, lookahead.lookahead_end);
            let mut synchronized = Version {
                head: node.clone(),
                cost: version.cost,
                dynamic_precedence: version.dynamic_precedence,
            };
            synchronized.cost.error_nodes += 1;
            synchronized.cost.skipped_bytes += skipped as u32;
            synchronized.push(node.state, error);
            tracing::debug!(state = node.state, skipped, "synchronized");
            return Some(synchronized);
        }
        None
    }

    /// Root for input that could not be completed: the start symbol over
    /// one ERROR node holding the whole stack.
    fn fallback_root(&self, version: &Version, lookahead: &Lookahead) -> Subtree {
        let children = self.discarded(version.entries());
        let end = version.position();
        let error = self.error_node(children, lookahead, end, lookahead.lookahead_end);
        Subtree::node(NodeInit {
            symbol: self.language.start_symbol(),
            children: vec![error.with_extra(false)],
            production: None,
            parse_state: 0,
            end_mode: LexMode::ERROR,
            trailing_lookahead: 1,
            fragile: false,
            extra: false,
            dynamic_precedence: 0,
            empty_mode: LexMode::ERROR,
            empty_external: self.scanner_state.clone(),
        })
    }
}
