//! LALR(1) table construction.
//!
//! ```text
//! productions ─► nullable/FIRST ─► LR(0) item sets ─► lookahead propagation
//!                                                          │
//!                       ParseTable ◄── conflict resolution ◄┘
//! ```
//!
//! Lookaheads are computed by repeatedly taking the LR(1) closure of each
//! state's kernel and pushing the lookaheads of every advanced item into the
//! successor state, until nothing changes. Conflicts that precedence and
//! associativity cannot settle are kept: the driver forks on them.

use std::collections::{BTreeMap, VecDeque};

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

use super::grammar::{Assoc, GrammarError, Production};
use super::symbol::{LexMode, NO_STATE, ProductionId, StateId, Symbol, SymbolMetadata, SymbolSet};
use super::table::{ParseAction, ParseTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Item {
    production: ProductionId,
    dot: u16,
}

struct Analysis<'g> {
    symbols: &'g [SymbolMetadata],
    productions: &'g [Production],
    by_lhs: Vec<Vec<ProductionId>>,
    nullable: Vec<bool>,
    first: Vec<SymbolSet>,
}

impl<'g> Analysis<'g> {
    fn new(symbols: &'g [SymbolMetadata], productions: &'g [Production]) -> Self {
        let mut by_lhs = vec![Vec::new(); symbols.len()];
        for (id, production) in productions.iter().enumerate() {
            by_lhs[production.lhs.index()].push(id as ProductionId);
        }

        let mut nullable = vec![false; symbols.len()];
        let mut first: Vec<SymbolSet> = symbols
            .iter()
            .enumerate()
            .map(|(id, metadata)| {
                let mut set = SymbolSet::with_capacity(symbols.len());
                if metadata.is_terminal() {
                    set.insert(Symbol(id as u16));
                }
                set
            })
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for production in productions {
                let lhs = production.lhs.index();
                let mut all_nullable = true;
                for &symbol in &production.rhs {
                    if symbol.index() != lhs {
                        let addition = first[symbol.index()].clone();
                        changed |= first[lhs].union_with(&addition);
                    }
                    if !nullable[symbol.index()] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }

        Self {
            symbols,
            productions,
            by_lhs,
            nullable,
            first,
        }
    }

    fn next_symbol(&self, item: Item) -> Option<Symbol> {
        self.productions[item.production as usize]
            .rhs
            .get(item.dot as usize)
            .copied()
    }

    fn is_terminal(&self, symbol: Symbol) -> bool {
        self.symbols[symbol.index()].is_terminal()
    }

    /// FIRST of `sequence` followed by any member of `follow`.
    fn first_of(&self, sequence: &[Symbol], follow: &SymbolSet) -> SymbolSet {
        let mut set = SymbolSet::with_capacity(self.symbols.len());
        for &symbol in sequence {
            set.union_with(&self.first[symbol.index()]);
            if !self.nullable[symbol.index()] {
                return set;
            }
        }
        set.union_with(follow);
        set
    }

    fn closure0(&self, kernel: &[Item]) -> Vec<Item> {
        let mut items = kernel.to_vec();
        let mut seen = vec![false; self.symbols.len()];
        let mut index = 0;
        while index < items.len() {
            let next = self.next_symbol(items[index]);
            index += 1;
            let Some(next) = next.filter(|&next| !self.is_terminal(next)) else {
                continue;
            };
            if !std::mem::replace(&mut seen[next.index()], true) {
                items.extend(
                    self.by_lhs[next.index()]
                        .iter()
                        .map(|&production| Item { production, dot: 0 }),
                );
            }
        }
        items
    }

    /// LR(1) closure of a kernel whose items carry `lookaheads`.
    fn closure1(
        &self,
        kernel: &[Item],
        lookaheads: &[SymbolSet],
    ) -> IndexMap<Item, SymbolSet, FxBuildHasher> {
        let mut items: IndexMap<Item, SymbolSet, FxBuildHasher> = kernel
            .iter()
            .copied()
            .zip(lookaheads.iter().cloned())
            .collect();
        let mut pending: Vec<Item> = kernel.to_vec();
        while let Some(item) = pending.pop() {
            let Some(next) = self.next_symbol(item) else {
                continue;
            };
            if self.is_terminal(next) {
                continue;
            }
            let production = &self.productions[item.production as usize];
            let follow = self.first_of(&production.rhs[item.dot as usize + 1..], &items[&item]);
            for &candidate in &self.by_lhs[next.index()] {
                let derived = Item {
                    production: candidate,
                    dot: 0,
                };
                let fresh = !items.contains_key(&derived);
                let entry = items.entry(derived).or_default();
                if entry.union_with(&follow) || fresh {
                    pending.push(derived);
                }
            }
        }
        items
    }
}

struct Automaton {
    kernels: IndexMap<Vec<Item>, (), FxBuildHasher>,
    transitions: Vec<BTreeMap<Symbol, StateId>>,
}

fn build_automaton(
    analysis: &Analysis<'_>,
    augmented: ProductionId,
) -> Result<Automaton, GrammarError> {
    let mut kernels: IndexMap<Vec<Item>, (), FxBuildHasher> = IndexMap::default();
    kernels.insert(
        vec![Item {
            production: augmented,
            dot: 0,
        }],
        (),
    );
    let mut transitions = Vec::new();
    let mut state = 0;
    while state < kernels.len() {
        let Some((kernel, _)) = kernels.get_index(state) else {
            break;
        };
        let mut successors: BTreeMap<Symbol, Vec<Item>> = BTreeMap::new();
        for item in analysis.closure0(kernel) {
            if let Some(next) = analysis.next_symbol(item) {
                successors.entry(next).or_default().push(Item {
                    production: item.production,
                    dot: item.dot + 1,
                });
            }
        }
        let mut edges = BTreeMap::new();
        for (symbol, mut kernel) in successors {
            kernel.sort_unstable();
            kernel.dedup();
            let (target, _) = kernels.insert_full(kernel, ());
            if target >= NO_STATE as usize {
                return Err(GrammarError::TooManyStates(target + 1));
            }
            edges.insert(symbol, target as StateId);
        }
        transitions.push(edges);
        state += 1;
    }
    Ok(Automaton {
        kernels,
        transitions,
    })
}

fn propagate_lookaheads(analysis: &Analysis<'_>, automaton: &Automaton) -> Vec<Vec<SymbolSet>> {
    let mut lookaheads: Vec<Vec<SymbolSet>> = automaton
        .kernels
        .keys()
        .map(|kernel| vec![SymbolSet::with_capacity(analysis.symbols.len()); kernel.len()])
        .collect();
    lookaheads[0][0].insert(Symbol::END);

    let mut queue: VecDeque<usize> = (0..lookaheads.len()).collect();
    let mut queued = vec![true; lookaheads.len()];
    while let Some(state) = queue.pop_front() {
        queued[state] = false;
        let Some((kernel, _)) = automaton.kernels.get_index(state) else {
            continue;
        };
        let closure = analysis.closure1(kernel, &lookaheads[state]);
        for (item, follow) in &closure {
            let Some(next) = analysis.next_symbol(*item) else {
                continue;
            };
            let target = automaton.transitions[state][&next] as usize;
            let advanced = Item {
                production: item.production,
                dot: item.dot + 1,
            };
            let Some((target_kernel, _)) = automaton.kernels.get_index(target) else {
                continue;
            };
            let Ok(position) = target_kernel.binary_search(&advanced) else {
                continue;
            };
            if lookaheads[target][position].union_with(follow) && !queued[target] {
                queued[target] = true;
                queue.push_back(target);
            }
        }
    }
    lookaheads
}

/// Build the parse table for `productions`, whose last entry is the
/// augmented start production.
pub(super) fn build_table(
    symbols: &[SymbolMetadata],
    productions: &[Production],
    extras: &SymbolSet,
    sync_symbols: &[Symbol],
) -> Result<ParseTable, GrammarError> {
    let analysis = Analysis::new(symbols, productions);
    let augmented = (productions.len() - 1) as ProductionId;
    let automaton = build_automaton(&analysis, augmented)?;
    let lookaheads = propagate_lookaheads(&analysis, &automaton);

    let symbol_count = symbols.len();
    let state_count = automaton.kernels.len();
    let mut action_lists: Vec<Box<[ParseAction]>> = vec![Box::new([])];
    let mut interned: FxHashMap<Vec<ParseAction>, u32> = FxHashMap::default();
    let mut action_rows = vec![0u32; state_count * symbol_count];
    let mut gotos = vec![NO_STATE; state_count * symbol_count];
    let mut conflicts = 0;

    for (state, (kernel, _)) in automaton.kernels.iter().enumerate() {
        let closure = analysis.closure1(kernel, &lookaheads[state]);

        let mut reduces: BTreeMap<Symbol, Vec<ProductionId>> = BTreeMap::new();
        let mut shift_precedence: FxHashMap<Symbol, i32> = FxHashMap::default();
        for (item, follow) in &closure {
            match analysis.next_symbol(*item) {
                Some(next) if analysis.is_terminal(next) => {
                    let precedence = productions[item.production as usize].precedence;
                    shift_precedence
                        .entry(next)
                        .and_modify(|current| *current = (*current).max(precedence))
                        .or_insert(precedence);
                }
                Some(_) => {}
                None => {
                    for lookahead in follow.iter() {
                        reduces.entry(lookahead).or_default().push(item.production);
                    }
                }
            }
        }

        for (&symbol, &target) in &automaton.transitions[state] {
            if !analysis.is_terminal(symbol) {
                gotos[state * symbol_count + symbol.index()] = target;
            }
        }

        let mut terminals: Vec<Symbol> = reduces.keys().copied().collect();
        terminals.extend(
            automaton.transitions[state]
                .keys()
                .copied()
                .filter(|&symbol| analysis.is_terminal(symbol)),
        );
        terminals.sort_unstable();
        terminals.dedup();

        for terminal in terminals {
            let shift = automaton.transitions[state].get(&terminal).copied();
            let mut candidates = reduces.remove(&terminal).unwrap_or_default();
            candidates.sort_unstable();
            candidates.dedup();
            let actions = resolve(
                productions,
                augmented,
                shift.map(|target| (target, shift_precedence.get(&terminal).copied().unwrap_or(0))),
                candidates,
            );
            if actions.len() > 1 {
                conflicts += 1;
                tracing::debug!(
                    state,
                    terminal = symbols[terminal.index()].name,
                    ?actions,
                    "unresolved conflict kept for the GLR driver"
                );
            }
            if actions.is_empty() {
                continue;
            }
            let next_index = action_lists.len() as u32;
            let index = *interned.entry(actions.clone()).or_insert_with(|| {
                action_lists.push(actions.into_boxed_slice());
                next_index
            });
            action_rows[state * symbol_count + terminal.index()] = index;
        }
    }

    let mut all_terminals = SymbolSet::with_capacity(symbol_count);
    for (id, metadata) in symbols.iter().enumerate() {
        if metadata.is_terminal() {
            all_terminals.insert(Symbol(id as u16));
        }
    }

    // States sharing an admissible terminal set share a lex mode.
    let mut modes: IndexMap<SymbolSet, (), FxBuildHasher> = IndexMap::default();
    let mut lex_modes = Vec::with_capacity(state_count);
    for state in 0..state_count {
        let mut valid = extras.clone();
        for symbol in all_terminals.iter() {
            if action_rows[state * symbol_count + symbol.index()] != 0 {
                valid.insert(symbol);
            }
        }
        let (mode, _) = modes.insert_full(valid, ());
        lex_modes.push(LexMode(mode as u16));
    }

    let sync_states = (0..state_count)
        .map(|state| {
            state == 0
                || sync_symbols
                    .iter()
                    .any(|symbol| gotos[state * symbol_count + symbol.index()] != NO_STATE)
        })
        .collect();

    Ok(ParseTable {
        symbol_count,
        state_count,
        action_rows,
        action_lists,
        gotos,
        lex_modes,
        valid_sets: modes.into_keys().collect(),
        sync_states,
        all_terminals,
        conflicts,
    })
}

/// Settle shift/reduce and reduce/reduce conflicts with precedence and
/// associativity. Whatever remains is returned shift first, then reductions
/// in production order.
fn resolve(
    productions: &[Production],
    augmented: ProductionId,
    shift: Option<(StateId, i32)>,
    reduces: Vec<ProductionId>,
) -> Vec<ParseAction> {
    let mut keep_shift = shift.is_some();
    let mut kept: Vec<ProductionId> = Vec::new();
    for production in reduces {
        if production == augmented {
            kept.push(production);
            continue;
        }
        let Some((_, shift_precedence)) = shift else {
            kept.push(production);
            continue;
        };
        let rule = &productions[production as usize];
        if rule.precedence > shift_precedence {
            keep_shift = false;
            kept.push(production);
        } else if rule.precedence == shift_precedence {
            match rule.assoc {
                Assoc::Left => {
                    keep_shift = false;
                    kept.push(production);
                }
                Assoc::Right => {}
                Assoc::None => kept.push(production),
            }
        }
    }

    if kept.len() > 1 {
        let best = kept
            .iter()
            .map(|&production| productions[production as usize].precedence)
            .max()
            .unwrap_or(0);
        kept.retain(|&production| productions[production as usize].precedence == best);
    }

    let mut actions = Vec::with_capacity(kept.len() + 1);
    if let Some((target, _)) = shift.filter(|_| keep_shift) {
        actions.push(ParseAction::Shift(target));
    }
    for production in kept {
        actions.push(if production == augmented {
            ParseAction::Accept
        } else {
            ParseAction::Reduce(production)
        });
    }
    actions
}
