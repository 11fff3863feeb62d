//! CLI argument definitions for Pinpick.
//!
//! Uses `clap` derive macros. Each command corresponds to a handler in the
//! [`super::commands`] module.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pinpick",
    version,
    about = "Install compatible versions of the packages a Python project imports",
    long_about = "Pinpick scans a project for imports, picks the newest version of each \
                  third-party package that the configured compatibility rules allow, \
                  installs it, and records the outcome in a ledger file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan imports, then resolve and install compatible versions
    Check {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Resolve without installing or writing the ledger
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the version that would be selected for one package
    Resolve {
        /// Package or import name
        package: String,
    },

    /// List outdated packages among the project's imports
    Outdated,

    /// Print the loaded compatibility rules and aliases
    Rules,
}

pub fn parse() -> Cli {
    Cli::parse()
}
