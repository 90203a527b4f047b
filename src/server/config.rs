//! Scoreboard configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::broadcast::DEFAULT_FALLBACK_INTERVAL;
use crate::protocol::framing::DEFAULT_MAX_BUFFER;

/// Controller page shown in the connect-info view
pub const DEFAULT_CONTROLLER_URL: &str = "https://awaxnova.github.io/vscore/";

/// Soft access point credentials advertised to controllers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub ssid: String,
    pub passphrase: String,
}

impl Default for AccessPoint {
    fn default() -> Self {
        Self {
            ssid: "ESP32-SCOREBOARD".to_string(),
            passphrase: "volley123".to_string(),
        }
    }
}

/// Scoreboard configuration options
#[derive(Debug, Clone)]
pub struct ScoreboardConfig {
    /// Address the HTTP API binds to
    pub http_bind_addr: SocketAddr,

    /// Value of `Access-Control-Allow-Origin`
    pub cors_origin: String,

    /// Inbound command queue depth
    pub inbound_capacity: usize,

    /// Push-stream broadcast channel depth; slower subscribers skip ahead
    pub push_capacity: usize,

    /// Wireless notify queue depth; frames beyond it are dropped
    pub notify_capacity: usize,

    /// Largest wireless message reassembled before the buffer is discarded
    ///
    /// Must hold a whole-state resend with both untrimmed event logs; the
    /// default of 64 KiB covers a full five-set match with room to spare.
    pub max_fragment_buffer: usize,

    /// Minimum time between two display view toggles
    pub tap_debounce: Duration,

    /// Broadcaster re-check interval when no wakeup arrives
    pub tick_fallback_interval: Duration,

    /// Stats log interval
    pub stats_interval: Duration,

    /// Access point shown in the connect-info view
    pub access_point: AccessPoint,

    /// Controller URL shown in the connect-info view
    pub controller_url: String,
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            http_bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 80)),
            cors_origin: "*".to_string(),
            inbound_capacity: 64,
            push_capacity: 16,
            notify_capacity: 8,
            max_fragment_buffer: DEFAULT_MAX_BUFFER,
            tap_debounce: Duration::from_millis(400),
            tick_fallback_interval: DEFAULT_FALLBACK_INTERVAL,
            stats_interval: Duration::from_secs(30),
            access_point: AccessPoint::default(),
            controller_url: DEFAULT_CONTROLLER_URL.to_string(),
        }
    }
}

impl ScoreboardConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            http_bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the HTTP bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.http_bind_addr = addr;
        self
    }

    /// Set the CORS origin
    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = origin.into();
        self
    }

    /// Set the inbound command queue depth
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }

    /// Set the push-stream channel depth
    pub fn push_capacity(mut self, capacity: usize) -> Self {
        self.push_capacity = capacity.max(1);
        self
    }

    /// Set the wireless notify queue depth
    pub fn notify_capacity(mut self, capacity: usize) -> Self {
        self.notify_capacity = capacity.max(1);
        self
    }

    /// Set the wireless reassembly limit
    pub fn max_fragment_buffer(mut self, bytes: usize) -> Self {
        self.max_fragment_buffer = bytes.max(1);
        self
    }

    /// Set the display tap debounce
    pub fn tap_debounce(mut self, debounce: Duration) -> Self {
        self.tap_debounce = debounce;
        self
    }

    /// Set the broadcaster fallback interval
    pub fn tick_fallback_interval(mut self, interval: Duration) -> Self {
        self.tick_fallback_interval = interval;
        self
    }

    /// Set the stats log interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Set the advertised access point
    pub fn access_point(mut self, ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        self.access_point = AccessPoint {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
        };
        self
    }

    /// Set the controller URL
    pub fn controller_url(mut self, url: impl Into<String>) -> Self {
        self.controller_url = url.into();
        self
    }
}
