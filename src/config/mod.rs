//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use crate::util::time::{DEFAULT_CLOCK_TICK_MS, DEFAULT_RENDER_TPS};
use crate::util::rate_limit::ROTATION_RATE_LIMIT;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// WebSocket endpoint of the game server
    pub server_url: String,
    /// Name offered when the lobby asks for one
    pub player_name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Local clock advance per tick (ms)
    pub clock_tick_ms: u64,
    /// Render ticks per second
    pub render_tps: u32,

    /// Send `player_ready` as soon as the lobby pairs us
    pub auto_ready: bool,
    /// Max rotation updates sent per second
    pub rotation_rate_limit: u32,
    /// Minimum Euler change before a sensor sample is processed; 0 processes all
    pub sensor_change_threshold: f32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("SERVER_URL").unwrap_or_else(|| "ws://127.0.0.1:8080".to_string());
        if !(server_url.starts_with("ws://") || server_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(server_url));
        }

        let player_name = lookup("PLAYER_NAME")
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::Missing("PLAYER_NAME"))?;

        let clock_tick_ms = parse_or(&lookup, "CLOCK_TICK_MS", DEFAULT_CLOCK_TICK_MS)?;
        let render_tps = parse_or(&lookup, "RENDER_TPS", DEFAULT_RENDER_TPS)?;
        if clock_tick_ms == 0 {
            return Err(ConfigError::Invalid("CLOCK_TICK_MS"));
        }
        if render_tps == 0 {
            return Err(ConfigError::Invalid("RENDER_TPS"));
        }

        let sensor_change_threshold: f32 = parse_or(&lookup, "SENSOR_CHANGE_THRESHOLD", 0.0)?;
        if !sensor_change_threshold.is_finite() || sensor_change_threshold < 0.0 {
            return Err(ConfigError::Invalid("SENSOR_CHANGE_THRESHOLD"));
        }

        Ok(Self {
            server_url,
            player_name,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            clock_tick_ms,
            render_tps,
            auto_ready: parse_or(&lookup, "AUTO_READY", false)?,
            rotation_rate_limit: parse_or(&lookup, "ROTATION_RATE_LIMIT", ROTATION_RATE_LIMIT)?,
            sensor_change_threshold,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Server URL must use ws:// or wss://, got {0}")]
    InvalidUrl(String),
}
