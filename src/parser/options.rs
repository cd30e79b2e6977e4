//! Parser tuning knobs

/// Limits that keep the GLR driver and error recovery bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Most stack versions kept alive at once; the worst are pruned beyond this.
    pub max_versions: usize,
    /// Tokens a fork may stay unresolved before only the best version is kept.
    pub max_fork_window: usize,
    /// Tokens past the error a repair candidate is checked against.
    pub recovery_lookahead: usize,
    /// Longest run of MISSING tokens tried as a repair.
    pub max_inserted_tokens: usize,
    /// Repair candidates simulated per error.
    pub max_recovery_candidates: usize,
    /// Stack entries searched for a synchronization state.
    pub max_error_depth: usize,
    /// Tokens past the error a repair must consume to be taken, unless it
    /// reaches the end of input.
    pub min_repair_progress: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_versions: 6,
            max_fork_window: 24,
            recovery_lookahead: 6,
            max_inserted_tokens: 2,
            max_recovery_candidates: 96,
            max_error_depth: 64,
            min_repair_progress: 2,
        }
    }
}

impl ParseOptions {
    /// Narrow forking and no MISSING insertion, for callers that prefer
    /// speed over repair quality.
    pub fn fast() -> Self {
        Self {
            max_versions: 2,
            max_fork_window: 4,
            max_inserted_tokens: 0,
            ..Self::default()
        }
    }
}
