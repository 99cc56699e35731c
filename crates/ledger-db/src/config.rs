//! # Ledger Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LEDGER_DB_PATH=/var/lib/ledger/ledger.db                           │
//! │     LEDGER_CLEANUP_GRACE_MINUTES=120                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/branch-ledger/ledger.toml (Linux)                        │
//! │     ~/Library/Application Support/com.branch.ledger/ledger.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./ledger.db"
//! max_connections = 5
//!
//! [ledger]
//! cleanup_grace_minutes = 120   # item-less headers older than this are purged
//! cleanup_interval_secs = 600   # background cleanup period
//! cleanup_after_writes = true   # also purge after header create/update
//! utc_offset_hours = 7          # local civil time for dates and day buckets
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;
use ledger_core::{SystemClock, DEFAULT_CLEANUP_GRACE_MINUTES, DEFAULT_UTC_OFFSET_HOURS};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ledger.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Age after which an item-less header counts as abandoned.
    #[serde(default = "default_grace_minutes")]
    pub cleanup_grace_minutes: i64,

    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    #[serde(default = "default_true")]
    pub cleanup_after_writes: bool,

    #[serde(default = "default_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_grace_minutes() -> i64 {
    DEFAULT_CLEANUP_GRACE_MINUTES
}

fn default_cleanup_interval() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_offset_hours() -> i32 {
    DEFAULT_UTC_OFFSET_HOURS
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            cleanup_grace_minutes: default_grace_minutes(),
            cleanup_interval_secs: default_cleanup_interval(),
            cleanup_after_writes: default_true(),
            utc_offset_hours: default_offset_hours(),
        }
    }
}

// =============================================================================
// LedgerConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,
}

impl LedgerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Arguments
    /// * `config_path` - Explicit file; `None` uses the platform config dir
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`load`](Self::load) but never fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.ledger.cleanup_grace_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "cleanup_grace_minutes must be greater than 0".into(),
            ));
        }

        if self.ledger.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cleanup_interval_secs must be greater than 0".into(),
            ));
        }

        if !(-14..=14).contains(&self.ledger.utc_offset_hours) {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_hours must be within ±14, got {}",
                self.ledger.utc_offset_hours
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `LEDGER_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("LEDGER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("LEDGER_MAX_CONNECTIONS") {
            match raw.parse() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %raw, "Ignoring invalid LEDGER_MAX_CONNECTIONS"),
            }
        }

        if let Some(raw) = lookup("LEDGER_CLEANUP_GRACE_MINUTES") {
            match raw.parse() {
                Ok(minutes) => self.ledger.cleanup_grace_minutes = minutes,
                Err(_) => warn!(value = %raw, "Ignoring invalid LEDGER_CLEANUP_GRACE_MINUTES"),
            }
        }

        if let Some(raw) = lookup("LEDGER_CLEANUP_INTERVAL_SECS") {
            match raw.parse() {
                Ok(secs) => self.ledger.cleanup_interval_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring invalid LEDGER_CLEANUP_INTERVAL_SECS"),
            }
        }

        if let Some(raw) = lookup("LEDGER_CLEANUP_AFTER_WRITES") {
            match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.ledger.cleanup_after_writes = true,
                "0" | "false" | "no" => self.ledger.cleanup_after_writes = false,
                _ => warn!(value = %raw, "Ignoring invalid LEDGER_CLEANUP_AFTER_WRITES"),
            }
        }

        if let Some(raw) = lookup("LEDGER_UTC_OFFSET_HOURS") {
            match raw.parse() {
                Ok(hours) => self.ledger.utc_offset_hours = hours,
                Err(_) => warn!(value = %raw, "Ignoring invalid LEDGER_UTC_OFFSET_HOURS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "branch", "ledger")
            .map(|dirs| dirs.config_dir().join("ledger.toml"))
    }

    // =========================================================================
    // Derived settings
    // =========================================================================

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }

    pub fn clock(&self) -> SystemClock {
        SystemClock::with_offset_hours(self.ledger.utc_offset_hours)
    }

    pub fn cleanup_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ledger.cleanup_grace_minutes)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.ledger.cleanup_interval_secs)
    }
}
