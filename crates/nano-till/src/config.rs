//! # Till Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     NANO_DB_PATH, NANO_DB_MAX_CONNECTIONS, NANO_CLOSE_RETRY_LIMIT      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/till.toml (Linux)                                    │
//! │     ~/Library/Application Support/com.nano.pos/till.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     the four gallery shops, retry limit 3                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # till.toml
//! [database]
//! path = "/var/lib/nano/nano.db"
//! max_connections = 5
//!
//! [till]
//! close_retry_limit = 3
//!
//! [[locations]]
//! id = 1
//! name = "Zapatería"
//!
//! [[locations]]
//! id = 2
//! name = "Ropa"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nano_core::{Location, LocationId};
use nano_db::DbConfig;

use crate::error::{TillError, TillResult};

pub const ENV_DB_PATH: &str = "NANO_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "NANO_DB_MAX_CONNECTIONS";
pub const ENV_CLOSE_RETRY_LIMIT: &str = "NANO_CLOSE_RETRY_LIMIT";

const CONFIG_FILE: &str = "till.toml";
const DATABASE_FILE: &str = "nano.db";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file shared by the gallery's terminals.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TillSettings {
    /// Attempts at a close whose guard keeps going stale before giving up.
    pub close_retry_limit: u32,
}

impl Default for TillSettings {
    fn default() -> Self {
        TillSettings {
            close_retry_limit: 3,
        }
    }
}

// =============================================================================
// TillConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TillConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub till: TillSettings,

    /// Shops in the gallery. The first one is where owners start.
    #[serde(default = "default_locations")]
    pub locations: Vec<Location>,
}

impl Default for TillConfig {
    fn default() -> Self {
        TillConfig {
            database: DatabaseSettings::default(),
            till: TillSettings::default(),
            locations: default_locations(),
        }
    }
}

impl TillConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> TillResult<Self> {
        let mut config = match config_path.or_else(default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> TillResult<Self> {
        info!(?path, "Loading till config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> TillResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// [`TillConfig::load`]). Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(%path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup(ENV_DB_MAX_CONNECTIONS).and_then(|v| v.parse().ok()) {
            self.database.max_connections = max;
        }

        if let Some(limit) = lookup(ENV_CLOSE_RETRY_LIMIT).and_then(|v| v.parse().ok()) {
            debug!(limit, "Overriding close retry limit from environment");
            self.till.close_retry_limit = limit;
        }
    }

    pub fn validate(&self) -> TillResult<()> {
        if self.locations.is_empty() {
            return Err(TillError::Config("at least one location is required".into()));
        }

        let mut seen = HashSet::new();
        for location in &self.locations {
            if !seen.insert(location.id) {
                return Err(TillError::Config(format!(
                    "location id {} is listed twice",
                    location.id
                )));
            }
            if location.name.trim().is_empty() {
                return Err(TillError::Config(format!(
                    "location {} has no name",
                    location.id
                )));
            }
        }

        if self.till.close_retry_limit == 0 {
            return Err(TillError::Config(
                "close_retry_limit must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(TillError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Connection settings for `nano_db`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }

    /// Where owners land before switching shop.
    pub fn default_location(&self) -> Option<LocationId> {
        self.locations.first().map(|l| l.id)
    }
}

/// The gallery's shops.
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new(1, "Zapatería"),
        Location::new(2, "Ropa"),
        Location::new(3, "Librería"),
        Location::new(4, "Regalería"),
    ]
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "nano", "pos").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "nano", "pos")
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}
