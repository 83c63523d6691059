//! Store configuration.
//!
//! Loaded via the `config` crate from `RBAC_*` environment variables.
//! The database location can also be supplied explicitly by the caller,
//! which takes precedence over the environment.

use crate::error::StoreError;
use rootcause::prelude::Report;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix for store settings.
pub const ENV_PREFIX: &str = "RBAC";

/// File name used when no database path is configured.
pub const DEFAULT_DB_FILE: &str = "rbac.db";

/// Authorization store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Location of the SQLite database file (`RBAC_DB_PATH`).
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Upper bound on pooled connections (`RBAC_MAX_CONNECTIONS`).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a connection waits on a locked database, in seconds
    /// (`RBAC_BUSY_TIMEOUT_SECS`).
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from `RBAC_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, Report<StoreError>> {
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(environment: config::Environment) -> Result<Self, Report<StoreError>> {
        let config = config::Config::builder()
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| StoreError::InvalidConfig {
                details: e.to_string(),
            })?;

        if config.max_connections == 0 {
            return Err(StoreError::InvalidConfig {
                details: "max_connections must be at least 1".to_string(),
            }
            .into());
        }

        Ok(config)
    }

    /// Returns a copy of this configuration pointing at `path`.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Resolves the absolute database path.
    ///
    /// Precedence: `explicit`, then the configured `db_path`, then
    /// `rbac.db` in the current working directory. Empty paths count as
    /// not supplied.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn resolve_db_path(&self, explicit: Option<&Path>) -> Result<PathBuf, Report<StoreError>> {
        let supplied = |path: &&Path| !path.as_os_str().is_empty();
        let chosen = explicit
            .filter(supplied)
            .or_else(|| self.db_path.as_deref().filter(supplied))
            .map(Path::to_path_buf);

        let resolved = match chosen {
            Some(path) => std::path::absolute(&path),
            None => std::env::current_dir().map(|dir| dir.join(DEFAULT_DB_FILE)),
        };

        resolved.map_err(|e| {
            StoreError::InvalidConfig {
                details: format!("cannot resolve database path: {e}"),
            }
            .into()
        })
    }
}
