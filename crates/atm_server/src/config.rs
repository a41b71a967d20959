//! Process configuration from environment variables.
//!
//! | Variable        | Default                         |
//! |-----------------|---------------------------------|
//! | `ATM_BIND_ADDR` | `127.0.0.1:8080`                |
//! | `ATM_DB_PATH`   | `<tmp>/atm_inventory.sqlite3`   |
//! | `ATM_LOG_LEVEL` | `debug` (debug) / `info` (release) |
//! | `ATM_LOG_DIR`   | `<tmp>/atm-logs`                |
//!
//! Blank values fall back to the default.

use atm_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const BIND_ADDR_VAR: &str = "ATM_BIND_ADDR";
pub const DB_PATH_VAR: &str = "ATM_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "ATM_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "ATM_LOG_DIR";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DB_FILE_NAME: &str = "atm_inventory.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "atm-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBindAddr { value: String, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBindAddr { value, reason } => {
                write!(f, "invalid {BIND_ADDR_VAR} `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value_of = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_addr = value_of(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidBindAddr {
                value: raw_addr.clone(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            bind_addr,
            db_path: value_of(DB_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: value_of(LOG_LEVEL_VAR)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value_of(LOG_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
        })
    }
}
