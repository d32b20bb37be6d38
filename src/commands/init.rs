//! `crosswork init` - create a new store
//!
//! Idempotent: re-running against an existing store reloads its config
//! and applies any pending migrations.

use std::path::Path;

use serde_json::json;

use crosswork_core::config::Settings;
use crosswork_core::db::Database;
use crosswork_core::error::Result;

use crate::cli::Cli;
use crate::commands::emit;

pub fn execute(cli: &Cli, store_root: &Path) -> Result<()> {
    let settings = Settings::load(store_root)?;

    // Opening creates the directory and database and applies migrations
    let db = Database::open(store_root, &settings)?;
    settings.save(store_root)?;
    let versions = db.applied_versions()?;

    let output = json!({
        "status": "ok",
        "store": store_root.display().to_string(),
        "schema_versions": versions,
    });
    emit(cli, &output, |_| {
        println!("Initialized crosswork store at {}", store_root.display());
        println!("Schema at version {}", versions.last().map(String::as_str).unwrap_or("none"));
    })
}
