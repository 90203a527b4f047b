//! Guarded state store
//!
//! Owns the single live [`MatchState`]. Every read is a whole-snapshot copy and
//! every write is one closure under the lock, so no reader can observe a state
//! that mixes fields from before and after a mutation.
//!
//! The lock is a plain `std::sync::Mutex`: it is held for one validation pass
//! or one clone and never across `.await`, encoding or transport I/O.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::model::MatchState;
use super::validate::{apply_update, ApplyOutcome, Rejected};
use crate::protocol::StateUpdate;

/// Process-wide owner of the match state
#[derive(Debug, Default)]
pub struct StateStore {
    state: Mutex<MatchState>,
}

impl StateStore {
    /// Create a store holding the default state
    pub fn new() -> Self {
        Self::with_state(MatchState::default())
    }

    /// Create a store holding a given state
    pub fn with_state(state: MatchState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    // A writer that panicked mid-closure leaves at worst a per-field update
    // half applied, which the validator already permits.
    fn lock(&self) -> MutexGuard<'_, MatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deep copy of the current state
    pub fn snapshot(&self) -> MatchState {
        self.lock().clone()
    }

    /// Run `f` with exclusive access to the live state
    ///
    /// `f` must not block or call back into the store.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut MatchState) -> T) -> T {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Validate and apply a partial update in one lock scope
    pub fn apply(&self, update: &StateUpdate) -> Result<ApplyOutcome, Rejected> {
        self.mutate(|state| apply_update(state, update))
    }

    /// Record the wireless link state; returns whether it changed
    pub fn set_wireless_connected(&self, connected: bool) -> bool {
        self.mutate(|state| {
            let changed = state.wireless_connected != connected;
            state.wireless_connected = connected;
            changed
        })
    }
}
