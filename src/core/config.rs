//! # Configuration
//!
//! Environment-driven configuration for the reminder host.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added max wake interval for the single wake loop
//! - 1.0.0: Initial release

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Default env_logger filter when RUST_LOG is unset
    pub log_level: String,
    /// SQLite file holding persisted notification settings
    pub database_path: String,
    /// YAML file listing habits and their reminder rules
    pub habits_path: String,
    /// How long a platform notification stays up before it is closed
    pub auto_dismiss: Duration,
    /// Snooze delay used when the user does not pick one
    pub default_snooze_minutes: u32,
    /// Upper bound on a single wake-loop sleep
    pub max_wake: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            database_path: "nudge.db".to_string(),
            habits_path: "habits.yaml".to_string(),
            auto_dismiss: Duration::from_secs(30),
            default_snooze_minutes: 10,
            max_wake: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Build the configuration from `NUDGE_*` environment variables.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            log_level: env::var("NUDGE_LOG_LEVEL").unwrap_or(defaults.log_level),
            database_path: env::var("NUDGE_DATABASE_PATH").unwrap_or(defaults.database_path),
            habits_path: env::var("NUDGE_HABITS_PATH").unwrap_or(defaults.habits_path),
            auto_dismiss: Duration::from_secs(parse_var("NUDGE_AUTO_DISMISS_SECS", 30u64)?),
            default_snooze_minutes: parse_var(
                "NUDGE_DEFAULT_SNOOZE_MINUTES",
                defaults.default_snooze_minutes,
            )?,
            max_wake: Duration::from_secs(parse_var("NUDGE_MAX_WAKE_SECS", 60u64)?.max(1)),
        })
    }
}

/// Parse a numeric environment variable, falling back to `default` when unset
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
