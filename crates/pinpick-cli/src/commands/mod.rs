//! Command dispatch and handler modules.

mod check;
mod outdated;
mod resolve;
mod rules;

use std::path::PathBuf;

use miette::Result;

use pinpick_ops::project::Project;
use pinpick_util::errors::PinpickError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Check { yes, dry_run } => check::exec(yes, dry_run),
        Command::Resolve { package } => resolve::exec(&package),
        Command::Outdated => outdated::exec(),
        Command::Rules => rules::exec(),
    }
}

/// The project root for the current directory.
fn project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(PinpickError::Io)?;
    Ok(Project::find_root(&cwd))
}
