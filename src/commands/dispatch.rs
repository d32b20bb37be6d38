//! Command dispatch for crosswork

use std::path::Path;

use crosswork_core::config::{self, Settings};
use crosswork_core::db::Database;
use crosswork_core::error::{CoreError, Result};

use crate::cli::{Cli, Commands};
use crate::commands;

pub fn run(cli: &Cli) -> Result<()> {
    let store_root = config::resolve_store_root(cli.store.as_deref())?;

    match &cli.command {
        Commands::Init => commands::init::execute(cli, &store_root),

        Commands::Migrate { dir } => commands::migrate::execute(cli, &store_root, dir.clone()),

        Commands::Status => {
            let (settings, db) = open_store(&store_root)?;
            commands::status::execute(cli, &store_root, &settings, &db)
        }

        Commands::Assignment { command } => {
            let (_, db) = open_store(&store_root)?;
            commands::assignment::execute(cli, &db, command)
        }

        Commands::Submission { command } => {
            let (_, db) = open_store(&store_root)?;
            commands::submission::execute(cli, &db, command)
        }

        Commands::Evaluation { command } => {
            let (_, db) = open_store(&store_root)?;
            commands::evaluation::execute(cli, &db, command)
        }
    }
}

/// Open an existing store; unlike `init`, never creates one implicitly
fn open_store(store_root: &Path) -> Result<(Settings, Database)> {
    if !store_root.exists() {
        return Err(CoreError::StoreNotFound {
            search_root: store_root.to_path_buf(),
        });
    }
    let settings = Settings::load(store_root)?;
    let db = Database::open(store_root, &settings)?;
    Ok((settings, db))
}
