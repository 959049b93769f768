//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room on a server.
///
/// The server builds one of these from its environment and hands a clone
/// to each room it spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long a letter vote stays open.
    pub vote_duration: Duration,

    /// Minimum gap between two chat messages from the same sender.
    pub chat_cooldown: Duration,

    /// Chat messages are cut to this many characters.
    pub chat_max_len: usize,

    /// Chat lines kept per room; the oldest are dropped first.
    pub chat_history_cap: usize,

    /// Players shown on the host's leaderboard.
    pub leaderboard_size: usize,

    /// Display names are cut to this many characters.
    pub max_name_len: usize,

    /// A room with no connected participants and no commands for this long
    /// shuts down. Zero disables expiry.
    pub idle_ttl: Duration,

    /// Terms masked out of chat, matched case-insensitively.
    pub blocked_terms: Vec<String>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            vote_duration: Duration::from_secs(20),
            chat_cooldown: Duration::from_secs(10),
            chat_max_len: 200,
            chat_history_cap: 50,
            leaderboard_size: 10,
            max_name_len: 24,
            idle_ttl: Duration::from_secs(2 * 60 * 60),
            blocked_terms: Vec::new(),
        }
    }
}

impl RoomConfig {
    /// Clamps values that would make a room unusable.
    ///
    /// A zero vote duration would resolve votes before anyone could see
    /// them, and zero-sized limits would drop every name or chat line.
    pub fn validated(mut self) -> Self {
        self.vote_duration = self.vote_duration.max(Duration::from_secs(1));
        self.chat_max_len = self.chat_max_len.max(1);
        self.chat_history_cap = self.chat_history_cap.max(1);
        self.leaderboard_size = self.leaderboard_size.max(1);
        self.max_name_len = self.max_name_len.max(1);
        self
    }

    /// How often a room checks whether it has gone idle.
    ///
    /// A tenth of the TTL, at least one second. Zero when expiry is off.
    pub fn sweep_period(&self) -> Duration {
        if self.idle_ttl.is_zero() {
            Duration::ZERO
        } else {
            (self.idle_ttl / 10).max(Duration::from_secs(1))
        }
    }
}
