//! Versioned SQL schema migrations
//!
//! Ordered, idempotent `NNN_description.sql` files are executed exactly
//! once each against a `schema_migrations` ledger, with the database file
//! copied aside before the first mutation. This replaces implicit
//! create-tables-on-startup schema management: a partially-applied file
//! leaves the ledger unmarked and is retried wholesale on the next run, so
//! migration authors guard additive statements with `IF NOT EXISTS` or rely
//! on the duplicate-column escape hatch.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::config::Settings;
use crate::error::{CoreError, Result};

const LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// One migration file: a sortable version token plus its SQL
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: String,
    pub name: String,
    pub sql: String,
}

impl Migration {
    /// The migration set compiled into the binary
    pub fn builtin() -> Vec<Migration> {
        let sources = [
            (
                "001_core_tables.sql",
                include_str!("../../migrations/001_core_tables.sql"),
            ),
            (
                "002_assignment_details.sql",
                include_str!("../../migrations/002_assignment_details.sql"),
            ),
            (
                "003_evaluation_scores.sql",
                include_str!("../../migrations/003_evaluation_scores.sql"),
            ),
        ];
        sources
            .iter()
            .filter_map(|(filename, sql)| Migration::from_filename(filename, sql.to_string()))
            .collect()
    }

    /// Read `*.sql` files from a directory in filename-sorted order.
    /// A missing directory means "nothing to apply," not an error.
    pub fn load_dir(dir: &Path) -> Result<Vec<Migration>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|e| CoreError::db_operation("read migrations directory", e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
            .collect();
        paths.sort();

        let mut migrations = Vec::new();
        for path in paths {
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string();
            let sql = fs::read_to_string(&path).map_err(|e| {
                CoreError::db_operation(&format!("read migration {}", path.display()), e)
            })?;
            if let Some(migration) = Migration::from_filename(&filename, sql) {
                migrations.push(migration);
            }
        }
        Ok(migrations)
    }

    /// Version token is the filename prefix before the first underscore
    fn from_filename(filename: &str, sql: String) -> Option<Migration> {
        let stem = filename.strip_suffix(".sql")?;
        let version = stem.split('_').next()?.to_string();
        if version.is_empty() {
            return None;
        }
        Some(Migration {
            version,
            name: stem.to_string(),
            sql,
        })
    }
}

/// Executes pending migrations against a live connection
pub struct MigrationRunner<'a> {
    settings: &'a Settings,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Bring the schema from any previously-applied state to the latest.
    ///
    /// Returns the number of migrations applied. `db_path` is the on-disk
    /// database file, used for the pre-run backup; pass `None` for
    /// in-memory databases.
    pub fn run(
        &self,
        conn: &mut Connection,
        db_path: Option<&Path>,
        migrations: &[Migration],
    ) -> Result<usize> {
        conn.execute(LEDGER_SQL, [])
            .map_err(|e| CoreError::db_operation("create migration ledger", e))?;

        let applied = self.applied_versions(conn)?;
        let pending: Vec<&Migration> = {
            let mut sorted: Vec<&Migration> = migrations
                .iter()
                .filter(|m| !applied.contains(&m.version))
                .collect();
            sorted.sort_by(|a, b| a.version.cmp(&b.version));
            sorted
        };

        if pending.is_empty() {
            return Ok(0);
        }

        if self.settings.backup_before_migrate {
            if let Some(path) = db_path {
                backup_db_file(path)?;
            }
        }

        for migration in &pending {
            self.apply(conn, migration)?;
            tracing::info!(version = %migration.version, name = %migration.name, "migration applied");
        }

        Ok(pending.len())
    }

    fn applied_versions(&self, conn: &Connection) -> Result<HashSet<String>> {
        let mut stmt = conn
            .prepare("SELECT version FROM schema_migrations")
            .map_err(|e| CoreError::db_operation("read migration ledger", e))?;
        let versions = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::db_operation("read migration ledger", e))?
            .collect::<std::result::Result<HashSet<_>, _>>()
            .map_err(|e| CoreError::db_operation("read migration ledger", e))?;
        Ok(versions)
    }

    /// Execute every statement of one file inside a single transaction and
    /// record the version in the same transaction. Errors indicating the
    /// target column/index/table already exists are logged and skipped; any
    /// other error aborts the run, leaving the ledger unmarked so the whole
    /// file is retried next time.
    fn apply(&self, conn: &mut Connection, migration: &Migration) -> Result<()> {
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::db_operation("begin migration transaction", e))?;

        for statement in split_sql(&migration.sql) {
            if let Err(e) = tx.execute_batch(statement) {
                if is_ignorable_sqlite_error(&e) {
                    tracing::warn!(
                        version = %migration.version,
                        error = %e,
                        "skipping statement, target already exists"
                    );
                    continue;
                }
                return Err(CoreError::MigrationFailed {
                    version: migration.version.clone(),
                    reason: e.to_string(),
                });
            }
        }

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [&migration.version],
        )
        .map_err(|e| CoreError::MigrationFailed {
            version: migration.version.clone(),
            reason: format!("failed to record version: {}", e),
        })?;

        tx.commit().map_err(|e| CoreError::MigrationFailed {
            version: migration.version.clone(),
            reason: format!("failed to commit: {}", e),
        })
    }
}

/// Split semicolon-separated SQL into individual statements, dropping
/// blank fragments
fn split_sql(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(stmt: &str) -> bool {
    stmt.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Re-entrant additive migrations trip over their own earlier runs; those
/// errors are safe to skip. Detection is message string-matching, which is
/// adequate for the single target engine (SQLite).
fn is_ignorable_sqlite_error(error: &rusqlite::Error) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("duplicate column name") || message.contains("already exists")
}

/// Copy the database file to `<file>.bak` before mutating; the backup is
/// the operator's recovery mechanism since migrations never roll back
fn backup_db_file(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Ok(());
    }
    let mut backup = db_path.as_os_str().to_os_string();
    backup.push(".bak");
    fs::copy(db_path, &backup)
        .map_err(|e| CoreError::db_operation("backup database before migration", e))?;
    tracing::debug!(backup = %Path::new(&backup).display(), "database backed up");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sql_drops_blanks_and_comments() {
        let sql = "-- header\nCREATE TABLE a (id INTEGER);\n\n-- note\nCREATE TABLE b (id INTEGER);\n;\n";
        let statements = split_sql(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE a"));
    }

    #[test]
    fn test_version_from_filename() {
        let m = Migration::from_filename("004_add_widgets.sql", String::new()).unwrap();
        assert_eq!(m.version, "004");
        assert_eq!(m.name, "004_add_widgets");
        assert!(Migration::from_filename("notes.txt", String::new()).is_none());
    }

    #[test]
    fn test_builtin_set_is_sorted_and_nonempty() {
        let migrations = Migration::builtin();
        assert!(migrations.len() >= 3);
        let versions: Vec<_> = migrations.iter().map(|m| m.version.clone()).collect();
        let mut sorted = versions.clone();
        sorted.sort();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn test_missing_dir_is_empty_set() {
        let migrations = Migration::load_dir(Path::new("/nonexistent/migrations")).unwrap();
        assert!(migrations.is_empty());
    }
}
