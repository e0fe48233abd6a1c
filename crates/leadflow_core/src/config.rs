//! Runtime settings for the distribution core.
//!
//! # Responsibility
//! - Hold database, logging and capacity-guard settings in one value.
//! - Load those settings from `LEADFLOW_*` environment variables.
//!
//! # Invariants
//! - Every field has a default; an empty environment yields `CoreConfig::default()`.
//! - Invalid values are rejected, never silently replaced by defaults.

use crate::db::{open_db, DbResult};
use crate::logging::{self, default_log_level, LoggingError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DATABASE_PATH: &str = "LEADFLOW_DATABASE_PATH";
pub const ENV_LOG_LEVEL: &str = "LEADFLOW_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LEADFLOW_LOG_DIR";
pub const ENV_CAPACITY_GUARD: &str = "LEADFLOW_CAPACITY_GUARD";

const DEFAULT_DATABASE_PATH: &str = "leadflow.sqlite3";

/// How contact creation protects operator capacity against concurrent writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityGuard {
    /// Count, select and insert inside one `BEGIN IMMEDIATE` transaction.
    #[default]
    Serialized,
    /// Autocommit statements; concurrent creations may overshoot `max_load`.
    BestEffort,
}

impl CapacityGuard {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Serialized => "serialized",
            Self::BestEffort => "best_effort",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "serialized" => Some(Self::Serialized),
            "best_effort" | "best-effort" => Some(Self::BestEffort),
            _ => None,
        }
    }
}

impl Display for CapacityGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while reading settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but blank.
    EmptyValue { key: &'static str },
    /// Variable holds a value outside its accepted set.
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue { key } => write!(f, "`{key}` is set but empty"),
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "`{key}` has invalid value `{value}`; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings consumed by callers that embed the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Logging stays disabled while this is `None`.
    pub log_dir: Option<PathBuf>,
    pub capacity_guard: CapacityGuard,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            capacity_guard: CapacityGuard::default(),
        }
    }
}

impl CoreConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = read_non_empty(&lookup, ENV_DATABASE_PATH)? {
            config.database_path = PathBuf::from(path);
        }
        if let Some(level) = read_non_empty(&lookup, ENV_LOG_LEVEL)? {
            let normalized =
                logging::normalize_level(&level).map_err(|_| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value: level.clone(),
                    expected: "trace|debug|info|warn|error",
                })?;
            config.log_level = normalized.to_string();
        }
        if let Some(dir) = read_non_empty(&lookup, ENV_LOG_DIR)? {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(guard) = read_non_empty(&lookup, ENV_CAPACITY_GUARD)? {
            config.capacity_guard =
                CapacityGuard::parse(&guard).ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_CAPACITY_GUARD,
                    value: guard.clone(),
                    expected: "serialized|best_effort",
                })?;
        }

        Ok(config)
    }

    /// Opens the configured database file with migrations applied.
    pub fn open_database(&self) -> DbResult<Connection> {
        open_db(&self.database_path)
    }

    /// Starts file logging when `log_dir` is configured.
    ///
    /// Returns `Ok(false)` when logging is disabled by configuration.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(log_dir) = self.log_dir.as_deref() else {
            return Ok(false);
        };
        logging::init_logging(&self.log_level, log_dir)?;
        Ok(true)
    }
}

fn read_non_empty<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue { key }),
        Some(value) => Ok(Some(value.trim().to_string())),
    }
}
