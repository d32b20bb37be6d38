//! `crosswork migrate` - apply pending schema migrations
//!
//! The compiled-in migration set is the default; `--dir` points at an
//! operator-provided directory of `NNN_description.sql` files instead.

use std::path::{Path, PathBuf};

use serde_json::json;

use crosswork_core::config::Settings;
use crosswork_core::db::Database;
use crosswork_core::error::{CoreError, Result};

use crate::cli::Cli;
use crate::commands::emit;

pub fn execute(cli: &Cli, store_root: &Path, dir: Option<PathBuf>) -> Result<()> {
    if !store_root.exists() {
        return Err(CoreError::StoreNotFound {
            search_root: store_root.to_path_buf(),
        });
    }

    let mut settings = Settings::load(store_root)?;
    if let Some(dir) = dir {
        settings.migrations_dir = Some(dir);
    }

    // Opening runs the migration runner against the configured set
    let db = Database::open(store_root, &settings)?;
    let applied = db.migrations_applied();
    let versions = db.applied_versions()?;

    let output = json!({
        "status": "ok",
        "applied": applied,
        "schema_versions": versions,
    });
    emit(cli, &output, |_| {
        if applied == 0 {
            println!("Schema up to date ({} versions applied)", versions.len());
        } else {
            println!("Applied {} migration(s), schema at {}", applied,
                versions.last().map(String::as_str).unwrap_or("none"));
        }
    })
}
