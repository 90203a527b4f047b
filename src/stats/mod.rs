//! Statistics for the synchronization engine

pub mod metrics;

pub use metrics::{StatsSnapshot, SyncStats};
