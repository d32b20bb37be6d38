//! SQLite database module for crosswork
//!
//! A single `Connection` wrapped in [`Database`]; opening a store runs the
//! versioned migration set so schema management is explicit rather than
//! create-tables-on-every-startup.

mod assignments;
mod evaluations;
pub mod migrations;
mod submissions;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::config::Settings;
use crate::error::{CoreError, Result};

pub use assignments::{NewAssignment, UpdateAssignment};
pub use evaluations::{EvaluationResponse, NewEvaluation};
pub use migrations::{Migration, MigrationRunner};
pub use submissions::{NewSubmission, SubmitOutcome, UpdateSubmission};

/// SQLite database for crosswork
#[derive(Debug)]
pub struct Database {
    pub(crate) conn: Connection,
    migrations_applied: usize,
}

impl Database {
    /// Open or create the database under the given store root and bring
    /// its schema up to date
    pub fn open(store_root: &Path, settings: &Settings) -> Result<Self> {
        fs::create_dir_all(store_root).map_err(|e| {
            CoreError::Other(format!(
                "failed to create store directory {}: {}",
                store_root.display(),
                e
            ))
        })?;
        let db_path = settings.db_path(store_root);

        let mut conn = Connection::open(&db_path).map_err(|e| {
            CoreError::Other(format!(
                "failed to open database at {}: {}",
                db_path.display(),
                e
            ))
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CoreError::Other(format!("failed to enable WAL mode: {}", e)))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| CoreError::Other(format!("failed to enable foreign keys: {}", e)))?;

        let migrations = match &settings.migrations_dir {
            Some(dir) => Migration::load_dir(dir)?,
            None => Migration::builtin(),
        };

        let applied =
            MigrationRunner::new(settings).run(&mut conn, Some(&db_path), &migrations)?;
        if applied > 0 {
            tracing::info!(applied, "schema migrations applied");
        }

        Ok(Database {
            conn,
            migrations_applied: applied,
        })
    }

    /// How many migrations this open applied
    pub fn migrations_applied(&self) -> usize {
        self.migrations_applied
    }

    /// Versions recorded in the migration ledger, in applied order
    pub fn applied_versions(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")
            .map_err(|e| CoreError::db_operation("read migration ledger", e))?;
        let versions = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::db_operation("read migration ledger", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CoreError::db_operation("read migration ledger", e))?;
        Ok(versions)
    }

    pub fn assignment_count(&self) -> Result<i64> {
        self.count("assignments")
    }

    pub fn submission_count(&self) -> Result<i64> {
        self.count("submissions")
    }

    pub fn evaluation_count(&self) -> Result<i64> {
        self.count("evaluations")
    }

    fn count(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .map_err(|e| CoreError::db_operation(&format!("count {}", table), e))
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Checkpoint WAL so sequential short-lived commands see each
        // other's writes
        let _ = self.conn.pragma_update(None, "wal_checkpoint", "TRUNCATE");
    }
}

/// Current time as the RFC 3339 string stored in TEXT columns
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a stored RFC 3339 timestamp
pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::invalid_value("timestamp", format!("{}: {}", value, e)))
}

pub(crate) fn parse_datetime_opt(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_datetime).transpose()
}

/// Deserialize a JSON column, tolerating legacy garbage by falling back to
/// the type default
pub(crate) fn json_column<T: serde::de::DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}

pub(crate) fn to_json_string<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(CoreError::Json)
}

#[cfg(test)]
pub(crate) mod tests;
