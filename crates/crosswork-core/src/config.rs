//! Store configuration for crosswork
//!
//! The store is a directory holding `crosswork.db`, `config.toml`, and the
//! migration backup. All knobs live in an explicit [`Settings`] struct that
//! is passed to the migration runner and services at construction time; there
//! is no ambient global configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_FILE: &str = "crosswork.db";
const STORE_ENV_VAR: &str = "CROSSWORK_STORE";

/// Store settings, persisted as TOML at `<store>/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database filename inside the store directory
    #[serde(default = "default_db_file")]
    pub database_file: String,

    /// Copy the database file aside before applying migrations
    #[serde(default = "default_backup")]
    pub backup_before_migrate: bool,

    /// Override directory for migration SQL files (defaults to the set
    /// compiled into the binary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations_dir: Option<PathBuf>,
}

fn default_db_file() -> String {
    DEFAULT_DB_FILE.to_string()
}

fn default_backup() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_file: default_db_file(),
            backup_before_migrate: default_backup(),
            migrations_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from `<store>/config.toml`, falling back to defaults
    /// when the file does not exist
    pub fn load(store_root: &Path) -> Result<Self> {
        let path = store_root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            CoreError::Other(format!(
                "failed to read config from {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            CoreError::Other(format!(
                "failed to parse config from {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Write settings to `<store>/config.toml`
    pub fn save(&self, store_root: &Path) -> Result<()> {
        let path = store_root.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Other(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, content).map_err(|e| {
            CoreError::Other(format!(
                "failed to write config to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Absolute path of the database file for a given store root
    pub fn db_path(&self, store_root: &Path) -> PathBuf {
        store_root.join(&self.database_file)
    }
}

/// Resolve the store root: explicit flag first, then `CROSSWORK_STORE`,
/// then `./.crosswork` under the current directory
pub fn resolve_store_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_root) = std::env::var(STORE_ENV_VAR) {
        return Ok(PathBuf::from(env_root));
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(".crosswork"))
}
