//! Operation: list outdated packages among the project's imports.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use pinpick_core::package::{normalize, AliasResolver};
use pinpick_util::errors::PinpickError;
use pinpick_util::process::CommandBuilder;
use pinpick_util::progress;

use crate::project::Project;

/// One row of `pip list --outdated --format=json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutdatedEntry {
    pub name: String,
    #[serde(rename = "version")]
    pub current: String,
    #[serde(rename = "latest_version")]
    pub latest: String,
}

/// Check the project's imported packages for newer releases and print a report.
pub fn outdated(project_root: &Path) -> miette::Result<Vec<OutdatedEntry>> {
    let project = Project::load(project_root)?;
    let imports = project.imports()?;

    let sp = progress::spinner("Checking for outdated packages...");
    let listed = pip_list_outdated(&project.config.python);
    sp.finish_and_clear();

    let entries = filter_to_imports(listed?, &imports, &project.aliases);
    if entries.is_empty() {
        progress::status("Outdated", "all imported packages are up to date");
        return Ok(entries);
    }

    println!("{:<30} {:<15} {:<15}", "Package", "Current", "Latest");
    println!("{}", "-".repeat(60));
    for entry in &entries {
        println!("{:<30} {:<15} {:<15}", entry.name, entry.current, entry.latest);
    }
    Ok(entries)
}

fn pip_list_outdated(python: &str) -> miette::Result<Vec<OutdatedEntry>> {
    let cmd = CommandBuilder::new(python)
        .args(["-m", "pip", "list", "--outdated", "--format=json"])
        .env("PIP_DISABLE_PIP_VERSION_CHECK", "1");
    let output = cmd.exec().map_err(|e| PinpickError::Interpreter {
        message: format!("Could not run '{python}': {e}"),
    })?;
    if !output.success {
        return Err(PinpickError::Registry {
            message: format!("`{}` failed:\n{}", cmd.display(), output.stderr.trim()),
        }
        .into());
    }
    let entries = parse_pip_outdated(&output.stdout).map_err(|e| PinpickError::Registry {
        message: format!("Unexpected output from `{}`: {e}", cmd.display()),
    })?;
    Ok(entries)
}

pub fn parse_pip_outdated(stdout: &str) -> Result<Vec<OutdatedEntry>, serde_json::Error> {
    serde_json::from_str(stdout.trim())
}

/// Keep entries whose distribution matches an import, directly or through an alias.
pub fn filter_to_imports(
    entries: Vec<OutdatedEntry>,
    imports: &BTreeSet<String>,
    aliases: &AliasResolver,
) -> Vec<OutdatedEntry> {
    let wanted: BTreeSet<String> = imports
        .iter()
        .map(|name| normalize(&aliases.canonicalize(name)))
        .collect();
    let mut kept: Vec<OutdatedEntry> = entries
        .into_iter()
        .filter(|entry| wanted.contains(&normalize(&entry.name)))
        .collect();
    kept.sort_by(|a, b| a.name.cmp(&b.name));
    kept
}
