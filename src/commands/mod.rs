//! Command implementations for the crosswork CLI

pub mod dispatch;

mod assignment;
mod evaluation;
mod init;
mod migrate;
mod status;
mod submission;

use crosswork_core::error::Result;

use crate::cli::{Cli, OutputFormat};

/// Print a value as pretty JSON when `--format json` is selected,
/// otherwise run the human-readable printer
fn emit<T: serde::Serialize>(
    cli: &Cli,
    value: &T,
    human: impl FnOnce(&T),
) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                human(value);
            }
        }
    }
    Ok(())
}
