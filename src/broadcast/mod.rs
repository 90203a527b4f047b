//! Coalescing fan-out from the state store to output sinks
//!
//! Writers never touch a sink. After committing a mutation they raise the
//! [`DirtySignal`]; the [`Broadcaster`] task picks it up, snapshots the store
//! once and hands the same encoded frame to every sink in fixed order.
//!
//! # Architecture
//!
//! ```text
//!   [Dispatcher]     [Wireless presence]
//!        │                   │
//!        └── store.apply() ──┴──► signal.raise()
//!                                     │
//!                                     ▼
//!                            Arc<Broadcaster>
//!                     ┌──────────────────────────┐
//!                     │ tick():                  │
//!                     │   signal.take()          │
//!                     │   store.snapshot()       │
//!                     │   StateFrame::new()      │
//!                     └────────────┬─────────────┘
//!                                  │
//!         ┌────────────────────────┼────────────────────────┐
//!         ▼                        ▼                        ▼
//!   [Render sink]          [Wireless sink]          [Push-stream sink]
//!   DisplaySink            notify queue             broadcast::Tx ──► SSE
//! ```
//!
//! # Coalescing
//!
//! The flag is cleared before the snapshot is taken. Any number of raises
//! between two ticks produce one pass carrying the newest state, and a raise
//! that lands during a pass is picked up by the next one.

pub mod broadcaster;
pub mod frame;
pub mod signal;
pub mod sink;

pub use broadcaster::{Broadcaster, DEFAULT_FALLBACK_INTERVAL};
pub use frame::{SinkKind, StateFrame};
pub use signal::DirtySignal;
pub use sink::StateSink;
