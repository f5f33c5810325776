//! Configuration management for the polling core
//!
//! Loads change feed sizing, snapshot location and logging settings from
//! environment variables with validation. Option limits are fixed.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fewest options a poll may have
pub const MIN_OPTIONS: usize = 2;

/// Most options a poll may have
pub const MAX_OPTIONS: usize = 10;

/// Buffered change events per subscriber before it starts lagging
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Poll creation and change feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Capacity of the broadcast change feed
    pub event_capacity: usize,

    /// Where snapshots are written, if persistence is enabled
    pub snapshot_path: Option<PathBuf>,
}

impl PollConfig {
    /// Load poll configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let event_capacity = std::env::var("POLL_EVENT_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_EVENT_CAPACITY.to_string())
            .parse()
            .map_err(|_| Error::internal("Invalid POLL_EVENT_CAPACITY"))?;

        let snapshot_path = std::env::var("POLL_SNAPSHOT_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            event_capacity,
            snapshot_path,
        };
        config.validate()?;

        Ok(config)
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            event_capacity: 64, // Small buffer to exercise lagging
            snapshot_path: None,
        }
    }

    /// Reject settings the change feed cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::internal("POLL_EVENT_CAPACITY must be positive"));
        }

        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            snapshot_path: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub polls: PollConfig,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Output formats understood by `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LoggingConfig {
    pub fn log_format(&self) -> Result<LogFormat> {
        match self.format.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::internal(format!("Invalid LOG_FORMAT: {other}"))),
        }
    }
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        let polls = PollConfig::from_env()?;

        let logging = LoggingConfig {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
        };

        Ok(Self { polls, logging })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        };

        Self {
            polls: PollConfig::for_testing(),
            logging,
        }
    }
}
