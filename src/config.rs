//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local runs. The Strava credentials are the only
//! required settings; everything else has a deployment default.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// How the ingestion engine treats the existing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Fetch after the store's cursor and merge.
    Incremental,
    /// Discard the store and refetch everything (backfills, schema changes).
    FullReset,
}

impl FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(SyncMode::Incremental),
            "full" | "full_reset" | "full-reset" | "reset" => Ok(SyncMode::FullReset),
            other => Err(ConfigError::Invalid("SYNC_MODE", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Strava credentials ---
    /// Strava OAuth client ID
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Long-lived refresh token for the single tracked athlete
    pub strava_refresh_token: String,

    // --- Job policy ---
    /// Directory holding the activity table and leaderboard document
    pub data_dir: PathBuf,
    pub sync_mode: SyncMode,
    /// Whether the best-effort leaderboard pass runs at all
    pub leaderboard_enabled: bool,
    /// Number of most recent activities enriched with segment efforts
    pub leaderboard_recent_count: usize,
    /// Records between progress checkpoints
    pub progress_interval: usize,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            strava_refresh_token: "test_refresh_token".to_string(),
            data_dir: PathBuf::from("data"),
            sync_mode: SyncMode::Incremental,
            leaderboard_enabled: true,
            leaderboard_recent_count: 5,
            progress_interval: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            strava_client_id: required("STRAVA_CLIENT_ID")?,
            strava_client_secret: required("STRAVA_CLIENT_SECRET")?,
            strava_refresh_token: required("STRAVA_REFRESH_TOKEN")?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            sync_mode: optional("SYNC_MODE", SyncMode::Incremental)?,
            leaderboard_enabled: optional_bool("LEADERBOARD_ENABLED", true)?,
            leaderboard_recent_count: optional("LEADERBOARD_RECENT_COUNT", 5)?,
            progress_interval: optional("PROGRESS_INTERVAL", 50)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn optional<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn optional_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(name, raw)),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
