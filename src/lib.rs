//! State synchronization engine for a two-team scoreboard
//!
//! One authoritative [`MatchState`] is mutated by controllers over a
//! fragmented wireless link or an HTTP API, validated per field, and fanned
//! out by a coalescing broadcaster to a local display, the wireless notify
//! channel and an HTTP event stream.
//!
//! # Example
//!
//! ```no_run
//! use scoreboard_sync::{Scoreboard, ScoreboardConfig};
//!
//! #[tokio::main]
//! async fn main() -> scoreboard_sync::Result<()> {
//!     let config = ScoreboardConfig::with_addr("0.0.0.0:8080".parse().unwrap());
//!     let scoreboard = Scoreboard::with_config(config);
//!
//!     scoreboard
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod protocol;
pub mod server;
pub mod state;
pub mod stats;
pub mod transport;

pub use broadcast::{Broadcaster, DirtySignal, SinkKind, StateFrame, StateSink};
pub use error::{DecodeError, Error, Result, ValidationError};
pub use protocol::{Inbound, StateUpdate};
pub use server::{Command, Scoreboard, ScoreboardConfig};
pub use state::{MatchState, StateStore, Team};
pub use stats::{StatsSnapshot, SyncStats};
pub use transport::{DisplaySink, LogRenderer, Renderer, ViewMode, WirelessLink};
