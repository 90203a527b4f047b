//! Scoreboard server
//!
//! - [`config`]: builder-style runtime options
//! - [`dispatch`]: the inbound command queue and its single consumer
//! - [`scoreboard`]: wiring and the run loop

pub mod config;
pub mod dispatch;
pub mod scoreboard;

pub use config::{AccessPoint, ScoreboardConfig};
pub use dispatch::{submit, ApplyReply, Command, Dispatcher};
pub use scoreboard::Scoreboard;
