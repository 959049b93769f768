//! Server configuration from environment variables.
//!
//! | Variable                   | Default        |
//! |----------------------------|----------------|
//! | `BINGO_BIND_ADDR`          | `0.0.0.0:3000` |
//! | `BINGO_ADMIN_SECRET`       | required       |
//! | `BINGO_VOTE_SECS`          | `20`           |
//! | `BINGO_CHAT_COOLDOWN_SECS` | `10`           |
//! | `BINGO_IDLE_TTL_SECS`      | `7200`         |
//! | `BINGO_BLOCKED_TERMS`      | empty, comma separated |
//!
//! A `.env` file in the working directory is loaded first when present;
//! variables already set in the environment win.

use std::time::Duration;

use bingo_room::RoomConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Why the environment could not be turned into a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub admin_secret: String,
    pub room: RoomConfig,
}

impl ServerConfig {
    /// Loads `.env` if there is one, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's
    /// value or `None` when unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BINGO_BIND_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let admin_secret = lookup("BINGO_ADMIN_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("BINGO_ADMIN_SECRET"))?;

        let defaults = RoomConfig::default();
        let room = RoomConfig {
            vote_duration: secs(&lookup, "BINGO_VOTE_SECS", defaults.vote_duration, 1)?,
            chat_cooldown: secs(&lookup, "BINGO_CHAT_COOLDOWN_SECS", defaults.chat_cooldown, 0)?,
            idle_ttl: secs(&lookup, "BINGO_IDLE_TTL_SECS", defaults.idle_ttl, 0)?,
            blocked_terms: lookup("BINGO_BLOCKED_TERMS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            ..defaults
        };

        Ok(Self {
            bind_addr,
            admin_secret,
            room,
        })
    }
}

/// Parses a whole number of seconds, at least `min`.
fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
    min: u64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
        ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }
    })?;
    if value < min {
        return Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: format!("must be at least {min}"),
        });
    }
    Ok(Duration::from_secs(value))
}
