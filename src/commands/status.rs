//! `crosswork status` - store health summary

use std::path::Path;

use serde::Serialize;

use crosswork_core::config::Settings;
use crosswork_core::db::Database;
use crosswork_core::error::Result;

use crate::cli::Cli;
use crate::commands::emit;

#[derive(Serialize)]
struct StatusReport {
    store: String,
    database_file: String,
    schema_versions: Vec<String>,
    assignments: i64,
    submissions: i64,
    evaluations: i64,
}

pub fn execute(cli: &Cli, store_root: &Path, settings: &Settings, db: &Database) -> Result<()> {
    let report = StatusReport {
        store: store_root.display().to_string(),
        database_file: settings.database_file.clone(),
        schema_versions: db.applied_versions()?,
        assignments: db.assignment_count()?,
        submissions: db.submission_count()?,
        evaluations: db.evaluation_count()?,
    };

    emit(cli, &report, |r| {
        println!("store: {}", r.store);
        println!("schema: {}", r.schema_versions.join(", "));
        println!("assignments: {}", r.assignments);
        println!("submissions: {}", r.submissions);
        println!("evaluations: {}", r.evaluations);
    })
}
