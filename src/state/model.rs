//! Match state model
//!
//! One `MatchState` exists for the lifetime of the process. It is owned by the
//! [`StateStore`](super::StateStore) and only ever read as a whole-snapshot copy.

use serde::{Deserialize, Serialize};

/// Maximum display length of a team name, in characters
pub const MAX_TEAM_NAME_CHARS: usize = 20;

/// Number of rotation positions per team
pub const ROTATION_SLOTS: usize = 6;

/// Number of recent events retained per team
pub const RECENT_EVENTS_CAP: usize = 4;

/// Legal score range
pub const SCORE_RANGE: (i64, i64) = (0, 99);

/// Legal set number range
pub const SET_NUMBER_RANGE: (i64, i64) = (1, 9);

/// Legal sets-won range
pub const SETS_WON_RANGE: (i64, i64) = (0, 9);

/// Legal rotation slot index range
pub const SERVER_SLOT_RANGE: (i64, i64) = (0, ROTATION_SLOTS as i64 - 1);

/// One of the two teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// Both teams, in display order
    pub const ALL: [Team; 2] = [Team::A, Team::B];

    /// Index into per-team arrays
    pub fn index(self) -> usize {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }

    /// Parse the wire representation (`"A"` or `"B"`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(Team::A),
            "B" => Some(Team::B),
            _ => None,
        }
    }

    /// Wire representation
    pub fn code(self) -> &'static str {
        match self {
            Team::A => "A",
            Team::B => "B",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Match length: best of three or best of five sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestOf {
    Three,
    Five,
}

impl BestOf {
    /// Accepts exactly 3 or 5
    pub fn from_sets(sets: i64) -> Option<Self> {
        match sets {
            3 => Some(BestOf::Three),
            5 => Some(BestOf::Five),
            _ => None,
        }
    }

    /// Number of sets
    pub fn sets(self) -> u8 {
        match self {
            BestOf::Three => 3,
            BestOf::Five => 5,
        }
    }
}

/// A single scoring event shown in the recent-events log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Why the point was awarded (e.g. "ace", "block")
    pub reason: String,
    /// Player label credited with the point
    pub scorer: String,
    /// Client timestamp in milliseconds, typically since the Unix epoch
    #[serde(rename = "ts")]
    pub timestamp_millis: u64,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(reason: impl Into<String>, scorer: impl Into<String>, timestamp_millis: u64) -> Self {
        Self {
            reason: reason.into(),
            scorer: scorer.into(),
            timestamp_millis,
        }
    }

    /// Wall-clock label `HH:MM`, taking the timestamp modulo one day
    pub fn clock_label(&self) -> String {
        let secs = (self.timestamp_millis / 1000) % 86_400;
        format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
    }
}

/// Bounded log of the most recent events for one team
///
/// Updates replace the whole ring with the tail of the supplied sequence;
/// entries are never appended one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentEvents {
    entries: Vec<LogEntry>,
}

impl RecentEvents {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the log with the last `RECENT_EVENTS_CAP` entries of `supplied`,
    /// keeping their relative order
    pub fn replace_with_tail(&mut self, supplied: &[LogEntry]) {
        let start = supplied.len().saturating_sub(RECENT_EVENTS_CAP);
        self.entries.clear();
        self.entries.extend_from_slice(&supplied[start..]);
    }

    /// Entries, oldest first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-team portion of the match state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamState {
    /// Display name, at most `MAX_TEAM_NAME_CHARS` characters
    pub name: String,
    /// Accent color, `#RRGGBB` or `RRGGBB` (not validated)
    pub color: String,
    /// Panel background color (not validated)
    pub background: String,
    /// Points in the current set
    pub score: u8,
    /// Sets won in this match
    pub sets_won: u8,
    /// Player labels by rotation position
    pub rotation: [String; ROTATION_SLOTS],
    /// Rotation position currently serving
    pub server_slot: u8,
    /// Last few scoring events
    pub recent: RecentEvents,
}

impl TeamState {
    fn with_defaults(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            background: "#0c1220".to_string(),
            score: 0,
            sets_won: 0,
            rotation: Default::default(),
            server_slot: 0,
            recent: RecentEvents::new(),
        }
    }
}

/// Complete scoreboard state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    /// Team A and team B, indexed by [`Team::index`]
    pub teams: [TeamState; 2],
    /// Team currently serving
    pub serving: Team,
    /// Current set, 1-based
    pub set_number: u8,
    /// Match length
    pub best_of: BestOf,
    /// Whether a wireless controller is connected
    pub wireless_connected: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            teams: [
                TeamState::with_defaults("Team A", "#42a5f5"),
                TeamState::with_defaults("Team B", "#ef5350"),
            ],
            serving: Team::A,
            set_number: 1,
            best_of: BestOf::Three,
            wireless_connected: false,
        }
    }
}

impl MatchState {
    /// Create a state with the documented defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-team state
    pub fn team(&self, team: Team) -> &TeamState {
        &self.teams[team.index()]
    }

    /// Mutable per-team state
    pub fn team_mut(&mut self, team: Team) -> &mut TeamState {
        &mut self.teams[team.index()]
    }
}

/// Clamp an integer into an inclusive range and narrow it to `u8`
pub fn clamp_to_u8(value: i64, (lo, hi): (i64, i64)) -> u8 {
    value.clamp(lo, hi) as u8
}

/// Truncate a team name to `MAX_TEAM_NAME_CHARS` characters
pub fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_TEAM_NAME_CHARS).collect()
}
