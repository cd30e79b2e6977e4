//! Grammar-supplied scanning logic for tokens that regular patterns cannot
//! describe.

use std::sync::Arc;

use super::Cursor;
use crate::language::{Symbol, SymbolSet};

/// Serialized external scanner state. Compared by content.
pub type ScannerState = Arc<[u8]>;

/// A hand-written scanner that runs before the built-in patterns.
///
/// The engine saves the state before every attempt and restores it whenever
/// the produced token is discarded, so `scan` may mutate freely.
pub trait ExternalScanner: Send {
    /// Try to recognize one of the `valid` external tokens at the cursor.
    fn scan(&mut self, cursor: &mut dyn Cursor, valid: &SymbolSet) -> Option<Symbol>;

    fn serialize(&self) -> Vec<u8>;

    /// Restore a state produced by [`ExternalScanner::serialize`]. An empty
    /// slice means the initial state.
    fn deserialize(&mut self, state: &[u8]);

    fn reset(&mut self) {
        self.deserialize(&[]);
    }
}
