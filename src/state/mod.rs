//! Match state
//!
//! - [`model`]: the `MatchState` aggregate, its defaults and range constants
//! - [`validate`]: per-field application of partial updates with clamping
//! - [`store`]: the lock-guarded owner of the live state

pub mod model;
pub mod store;
pub mod validate;

pub use model::{BestOf, LogEntry, MatchState, RecentEvents, Team, TeamState};
pub use store::StateStore;
pub use validate::{apply_update, ApplyOutcome, Rejected};
