//! Local display sink
//!
//! The display shows either the scoreboard or a connect-info view with the
//! Wi-Fi join payload and controller URL. A tap toggles between the two,
//! debounced, and redraws from the last delivered snapshot.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::broadcast::{StateFrame, StateSink};
use crate::error::Result;
use crate::server::config::ScoreboardConfig;
use crate::state::MatchState;

/// Which view the display shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Scoreboard,
    ConnectInfo,
}

impl ViewMode {
    fn toggled(self) -> Self {
        match self {
            ViewMode::Scoreboard => ViewMode::ConnectInfo,
            ViewMode::ConnectInfo => ViewMode::Scoreboard,
        }
    }
}

/// Drawing backend
pub trait Renderer: Send {
    /// Draw `state` in the current view mode
    fn render(&mut self, state: &MatchState);

    /// Switch view mode; the next `render` draws the new view
    fn set_view_mode(&mut self, mode: ViewMode);
}

/// One scannable item in the connect-info view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub label: &'static str,
    pub payload: String,
}

/// Content of the connect-info view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    pub ssid: String,
    pub passphrase: String,
    pub controller_url: String,
}

impl ConnectInfo {
    /// Build from config; a specific CORS origin hosts the controller
    pub fn from_config(config: &ScoreboardConfig) -> Self {
        let controller_url = if config.cors_origin == "*" {
            config.controller_url.clone()
        } else {
            format!("{}/vscore/", config.cors_origin.trim_end_matches('/'))
        };
        Self {
            ssid: config.access_point.ssid.clone(),
            passphrase: config.access_point.passphrase.clone(),
            controller_url,
        }
    }

    /// Wi-Fi join payload
    pub fn wifi_payload(&self) -> String {
        format!("WIFI:T:WPA;S:{};P:{};;", self.ssid, self.passphrase)
    }

    /// Items to show for `state`
    ///
    /// Once a controller is connected over the wireless link only the Wi-Fi
    /// payload is offered.
    pub fn offers(&self, state: &MatchState) -> Vec<Offer> {
        let wifi = Offer {
            label: "Join WiFi",
            payload: self.wifi_payload(),
        };
        if state.wireless_connected {
            vec![wifi]
        } else {
            vec![
                Offer {
                    label: "Controller",
                    payload: self.controller_url.clone(),
                },
                wifi,
            ]
        }
    }
}

/// One-line text summary of a state
pub fn summary_line(state: &MatchState) -> String {
    let [a, b] = &state.teams;
    format!(
        "{}({}) {}({}) • serve:{} • set:{} • match:{}-{} • best:{}",
        a.name,
        a.score,
        b.name,
        b.score,
        state.serving,
        state.set_number,
        a.sets_won,
        b.sets_won,
        state.best_of.sets()
    )
}

/// Renderer that writes each frame to the log
#[derive(Debug)]
pub struct LogRenderer {
    connect: ConnectInfo,
    mode: ViewMode,
}

impl LogRenderer {
    pub fn new(connect: ConnectInfo) -> Self {
        Self {
            connect,
            mode: ViewMode::default(),
        }
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, state: &MatchState) {
        match self.mode {
            ViewMode::Scoreboard => {
                tracing::info!(target: "scoreboard::display", "{}", summary_line(state));
            }
            ViewMode::ConnectInfo => {
                for offer in self.connect.offers(state) {
                    tracing::info!(
                        target: "scoreboard::display",
                        label = offer.label,
                        payload = %offer.payload,
                        "Connect info"
                    );
                }
            }
        }
    }

    fn set_view_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }
}

/// Convert `#RRGGBB` or `RRGGBB` to RGB565
pub fn hex_to_rgb565(hex: &str) -> Option<u16> {
    let digits = hex.strip_prefix('#').unwrap_or(hex).as_bytes().get(..6)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let rgb = u32::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()?;
    let (r, g, b) = ((rgb >> 16) & 0xFF, (rgb >> 8) & 0xFF, rgb & 0xFF);
    Some((((r & 0xF8) << 8) | ((g & 0xFC) << 3) | (b >> 3)) as u16)
}

/// [`hex_to_rgb565`], falling back to white
pub fn rgb565_or_white(hex: &str) -> u16 {
    hex_to_rgb565(hex).unwrap_or(0xFFFF)
}

struct DisplayInner {
    renderer: Box<dyn Renderer>,
    mode: ViewMode,
    last_toggle: Option<Instant>,
    last_state: Option<Arc<MatchState>>,
}

/// Render sink with tap-to-toggle view mode
pub struct DisplaySink {
    inner: Mutex<DisplayInner>,
    debounce: Duration,
}

impl DisplaySink {
    pub fn new(renderer: impl Renderer + 'static, debounce: Duration) -> Self {
        Self {
            inner: Mutex::new(DisplayInner {
                renderer: Box::new(renderer),
                mode: ViewMode::default(),
                last_toggle: None,
                last_state: None,
            }),
            debounce,
        }
    }

    /// Current view mode
    pub fn view_mode(&self) -> ViewMode {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).mode
    }

    /// Handle a tap at `now`; returns whether the view toggled
    ///
    /// A tap toggles only once more than the debounce has passed since the
    /// last toggle.
    pub fn on_tap(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = inner.last_toggle {
            if now.saturating_duration_since(last) <= self.debounce {
                return false;
            }
        }

        let mode = inner.mode.toggled();
        inner.mode = mode;
        inner.last_toggle = Some(now);
        inner.renderer.set_view_mode(mode);
        if let Some(state) = inner.last_state.clone() {
            inner.renderer.render(&state);
        }

        tracing::debug!(mode = ?mode, "Display view toggled");
        true
    }
}

impl StateSink for DisplaySink {
    fn deliver(&self, frame: &StateFrame) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.last_state = Some(Arc::clone(&frame.state));
        inner.renderer.render(&frame.state);
        Ok(())
    }
}
