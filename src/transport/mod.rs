//! Transport adapters
//!
//! Input paths turn bytes into dispatcher commands; output paths implement
//! [`StateSink`](crate::broadcast::StateSink) and are driven only by the
//! broadcaster.
//!
//! - [`wireless`]: fragmented write characteristic and notify queue
//! - [`http`]: axum routes and the event stream
//! - [`push`]: broadcast hub behind the event stream
//! - [`display`]: local render sink with tap-to-toggle

pub mod display;
pub mod http;
pub mod push;
pub mod wireless;

pub use display::{ConnectInfo, DisplaySink, LogRenderer, Renderer, ViewMode};
pub use http::{create_router, HttpState};
pub use push::{PushHub, PushSubscription};
pub use wireless::{WirelessLink, WirelessNotifySink};
