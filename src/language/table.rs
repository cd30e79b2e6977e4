//! Dense parse table produced by [`super::build`].

use super::symbol::{LexMode, NO_STATE, ProductionId, StateId, Symbol, SymbolSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseAction {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

/// Actions and gotos for every state of the automaton.
///
/// A cell holds zero or more actions. More than one means the grammar is
/// ambiguous there and the driver must fork.
#[derive(Debug)]
pub struct ParseTable {
    pub(super) symbol_count: usize,
    pub(super) state_count: usize,
    /// Index into `action_lists` per (state, symbol); `0` is the empty list.
    pub(super) action_rows: Vec<u32>,
    pub(super) action_lists: Vec<Box<[ParseAction]>>,
    pub(super) gotos: Vec<StateId>,
    pub(super) lex_modes: Vec<LexMode>,
    pub(super) valid_sets: Vec<SymbolSet>,
    pub(super) sync_states: Vec<bool>,
    pub(super) all_terminals: SymbolSet,
    pub(super) conflicts: usize,
}

impl ParseTable {
    /// Actions for `symbol` in `state`, shift first.
    pub fn actions(&self, state: StateId, symbol: Symbol) -> &[ParseAction] {
        match self.cell(state, symbol) {
            Some(cell) => &self.action_lists[self.action_rows[cell] as usize],
            None => &[],
        }
    }

    pub fn goto(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        let cell = self.cell(state, symbol)?;
        Some(self.gotos[cell]).filter(|&target| target != NO_STATE)
    }

    /// Terminals with an action in `state`, plus the grammar's extras.
    pub fn valid_terminals(&self, state: StateId) -> &SymbolSet {
        self.valid_for_mode(self.lex_mode(state))
    }

    pub fn lex_mode(&self, state: StateId) -> LexMode {
        self.lex_modes
            .get(state as usize)
            .copied()
            .unwrap_or(LexMode::ERROR)
    }

    /// The terminal set a mode stands for. Inexact modes admit every terminal.
    pub fn valid_for_mode(&self, mode: LexMode) -> &SymbolSet {
        self.valid_sets
            .get(mode.0 as usize)
            .unwrap_or(&self.all_terminals)
    }

    /// States where error recovery may resume after discarding stack entries.
    pub fn is_sync_state(&self, state: StateId) -> bool {
        self.sync_states.get(state as usize).copied().unwrap_or(false)
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn mode_count(&self) -> usize {
        self.valid_sets.len()
    }

    /// Number of cells left with more than one action.
    pub fn conflict_count(&self) -> usize {
        self.conflicts
    }

    pub fn all_terminals(&self) -> &SymbolSet {
        &self.all_terminals
    }

    fn cell(&self, state: StateId, symbol: Symbol) -> Option<usize> {
        let state = state as usize;
        (state < self.state_count && symbol.index() < self.symbol_count)
            .then(|| state * self.symbol_count + symbol.index())
    }
}
