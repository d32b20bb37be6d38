//! Output format selection shared by every subcommand

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented output for people
    Human,
    /// Pretty-printed JSON for tooling
    Json,
}
