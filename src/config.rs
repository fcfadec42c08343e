// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Roster file (races + runners) loaded at startup
    pub roster_path: String,
    /// Segments shorter than this are GPS jitter and accrue no distance
    pub jitter_threshold_m: f64,
    /// Interval between liveness pings on the feed
    pub heartbeat_interval: Duration,
    /// Per-subscriber delivery timeout before eviction
    pub send_timeout: Duration,
    /// Optional bearer token required on the ingestion endpoint.
    /// `None` means ingestion is open (authentication handled upstream).
    pub ingest_token: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            roster_path: "data/roster.json".to_string(),
            jitter_threshold_m: 3.0,
            heartbeat_interval: Duration::from_secs(25),
            send_timeout: Duration::from_secs(1),
            ingest_token: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for everything that is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            roster_path: env::var("ROSTER_PATH").unwrap_or(defaults.roster_path),
            jitter_threshold_m: parse_var("JITTER_THRESHOLD_M", defaults.jitter_threshold_m)?,
            heartbeat_interval: Duration::from_secs(parse_var(
                "HEARTBEAT_INTERVAL_SECS",
                defaults.heartbeat_interval.as_secs(),
            )?),
            send_timeout: Duration::from_millis(parse_var(
                "SEND_TIMEOUT_MS",
                defaults.send_timeout.as_millis() as u64,
            )?),
            ingest_token: env::var("INGEST_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
