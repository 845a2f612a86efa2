//! Runtime configuration for stepboard hosts.
//!
//! # Responsibility
//! - Collect database location, lock wait bound and logging settings.
//! - Read overrides from `STEPBOARD_*` environment variables.
//!
//! # Invariants
//! - Invalid values are rejected, never silently replaced by defaults.

use crate::db::{DbOptions, DEFAULT_BUSY_TIMEOUT};
use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DATABASE_PATH: &str = "STEPBOARD_DATABASE_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "STEPBOARD_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "STEPBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STEPBOARD_LOG_DIR";

const DEFAULT_DATABASE_FILE: &str = "stepboard.sqlite3";

/// Errors from configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Host configuration for the core library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub log_level: String,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads defaults overridden by `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = non_blank(lookup(ENV_DATABASE_PATH)) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(value) = non_blank(lookup(ENV_BUSY_TIMEOUT_MS)) {
            config.busy_timeout_ms = parse_timeout(&value)?;
        }
        if let Some(value) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = parse_level(&value)?;
        }
        if let Some(value) = non_blank(lookup(ENV_LOG_DIR)) {
            config.log_dir = Some(PathBuf::from(value));
        }
        Ok(config)
    }

    /// Connection options derived from this config.
    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|err| ConfigError::InvalidValue {
        key: ENV_BUSY_TIMEOUT_MS,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn parse_level(value: &str) -> Result<String, ConfigError> {
    normalize_level(value)
        .map(str::to_string)
        .map_err(|err| ConfigError::InvalidValue {
            key: ENV_LOG_LEVEL,
            value: value.to_string(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ConfigError, ENV_BUSY_TIMEOUT_MS, ENV_DATABASE_PATH, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.db_options().busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DATABASE_PATH, "/var/lib/stepboard.db"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
            (ENV_LOG_LEVEL, "Warning"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/stepboard.db"));
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(ENV_BUSY_TIMEOUT_MS, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key, .. } if key == ENV_BUSY_TIMEOUT_MS
        ));
    }
}
