//! Round state for the director engine.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Process-wide round state, owned by the engine and mutated only by its
/// transitions.
///
/// Invariant: `current_round <= total_rounds`. At most one in-flight
/// generation exists at any time; `is_generating` is the mutual-exclusion
/// flag the engine maintains around its only suspension point into the
/// vendor client.
///
/// A running session never silently resumes after a restart: whatever value
/// was persisted, the engine normalizes the state back to idle on
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct RoundState {
    /// Whether directing is enabled at all
    pub(crate) enabled: bool,
    /// Whether a run is active
    pub(crate) running: bool,
    /// Rounds consumed so far in this run
    pub(crate) current_round: u32,
    /// Rounds configured for this run
    pub(crate) total_rounds: u32,
    /// Whether a generation is in flight
    pub(crate) is_generating: bool,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            enabled: false,
            running: false,
            current_round: 0,
            total_rounds: 0,
            is_generating: false,
        }
    }
}

impl RoundState {
    /// Normalize a persisted state for process startup.
    ///
    /// Clears the run-scoped fields; configuration-scoped fields survive.
    pub fn normalized(mut self) -> Self {
        self.running = false;
        self.current_round = 0;
        self.is_generating = false;
        self
    }

    /// True when every configured round has been consumed.
    pub fn rounds_exhausted(&self) -> bool {
        self.current_round >= self.total_rounds
    }
}
