//! Operation: scan, confirm, resolve and install every imported package.
//!
//! Writes the ledger twice: an all-`Unchecked` placeholder before asking for
//! confirmation, then the final snapshot once the pass has finished.

use std::path::Path;

use pinpick_core::ledger::{DependencyStatus, Ledger};
use pinpick_core::version::Version;
use pinpick_resolver::catalog::VersionCatalog;
use pinpick_resolver::installer::{InstallReport, Installer, PipInstaller, Provenance};
use pinpick_resolver::pass::{PassEvent, PassReport, ResolutionPass};
use pinpick_util::progress;

use crate::confirm::Confirm;
use crate::probe::{discover, ModuleProbe, PythonProbe};
use crate::project::Project;

pub const CONFIRM_PROMPT: &str =
    "Would you like to check for and install compatible versions of all used packages?";

/// Options for `pinpick check`.
#[derive(Debug, Default)]
pub struct CheckOptions {
    /// Resolve without installing or writing the ledger.
    pub dry_run: bool,
}

/// How a check run ended.
#[derive(Debug)]
pub enum CheckOutcome {
    NothingToCheck,
    Cancelled,
    Completed(PassReport),
}

/// Pretends every install succeeds.
pub struct DryRunInstaller;

impl Installer for DryRunInstaller {
    fn install(&self, package: &str, version: &Version) -> InstallReport {
        tracing::debug!("dry run: skipping install of {package}=={version}");
        InstallReport {
            success: true,
            ..InstallReport::default()
        }
    }
}

/// Run a full check with the real interpreter, registry and installer.
pub fn check(
    project_root: &Path,
    opts: &CheckOptions,
    confirm: &dyn Confirm,
) -> miette::Result<CheckOutcome> {
    let project = Project::load(project_root)?;
    let probe = PythonProbe::new(&project.config.python);
    let catalog = project.catalog()?;
    let installer: Box<dyn Installer> = if opts.dry_run {
        Box::new(DryRunInstaller)
    } else {
        Box::new(PipInstaller::new(&project.config.python))
    };
    run_check(
        &project,
        opts,
        confirm,
        &probe,
        catalog.as_ref(),
        installer.as_ref(),
    )
}

/// [`check`] with every collaborator supplied by the caller.
pub fn run_check(
    project: &Project,
    opts: &CheckOptions,
    confirm: &dyn Confirm,
    probe: &dyn ModuleProbe,
    catalog: &dyn VersionCatalog,
    installer: &dyn Installer,
) -> miette::Result<CheckOutcome> {
    let imports = project.imports()?;
    if imports.is_empty() {
        progress::status_info("Checked", "no imports found");
        return Ok(CheckOutcome::NothingToCheck);
    }
    progress::status(
        "Scanning",
        &format!("found {} imported module(s)", imports.len()),
    );

    let ledger_path = project.ledger_path();
    let placeholder = Ledger::placeholder(imports.iter().map(String::as_str));
    if opts.dry_run {
        progress::status_info("Dry run", "nothing will be installed or written");
    } else {
        placeholder.write_to(&ledger_path)?;
        if !confirm.confirm(CONFIRM_PROMPT)? {
            println!("Operation cancelled.");
            return Ok(CheckOutcome::Cancelled);
        }
    }

    let sp = progress::spinner("Inspecting imported modules...");
    let discovered = discover(&project.root, imports, probe);
    sp.finish_and_clear();
    let discovered = discovered?;

    let pass = ResolutionPass::new(catalog, installer, &project.rules, &project.aliases)
        .with_markers(project.config.deprecation_markers.clone());
    let dry_run = opts.dry_run;
    let report = pass.run(placeholder, &discovered, &mut |event| {
        print_event(event, dry_run)
    });

    if !opts.dry_run {
        report.ledger.write_to(&ledger_path)?;
        progress::status("Wrote", &ledger_path.display().to_string());
    }

    if !report.downgrades.is_empty() {
        print!("{}", report.downgrades);
    }
    if report
        .notices
        .iter()
        .any(|(_, notice)| notice.provenance == Provenance::Heuristic)
    {
        progress::status_warn(
            "Note",
            "deprecation was guessed from installer output and may be wrong",
        );
    }
    if opts.dry_run {
        println!("{}", dry_run_summary(&report.ledger));
    } else {
        println!("{}", completion_summary(&report.ledger));
    }

    Ok(CheckOutcome::Completed(report))
}

fn print_event(event: &PassEvent<'_>, dry_run: bool) {
    match event {
        PassEvent::Classified { package, status } => match status {
            DependencyStatus::AlreadyInstalled => {
                progress::status_info("Installed", &format!("{package} (left as is)"));
            }
            other => tracing::debug!("{package}: {other:?}"),
        },
        PassEvent::Resolving { package } => {
            tracing::debug!("Resolving {package}");
        }
        PassEvent::NoCompatibleVersion { package } => {
            progress::status_error(
                "No match",
                &format!("no compatible version found for {package}"),
            );
        }
        PassEvent::Installing { package, version } => {
            let label = if dry_run { "Would install" } else { "Installing" };
            progress::status(label, &format!("{}=={version}", package.canonical));
        }
        PassEvent::Installed { .. } => {}
        PassEvent::Deprecated {
            package,
            version,
            notice,
        } => {
            let hint = notice
                .successor
                .as_deref()
                .map(|s| format!("; use '{s}' instead"))
                .unwrap_or_default();
            progress::status_warn(
                "Deprecated",
                &format!("{package} {version} ({}){hint}", notice.provenance),
            );
        }
        PassEvent::Failed { package, version } => {
            progress::status_error("Failed", &format!("{}=={version}", package.canonical));
        }
    }
}

/// Text shown once a pass has finished.
pub fn completion_summary(ledger: &Ledger) -> String {
    let installed = ledger.installed_this_pass();
    if installed.is_empty() {
        "All packages are already installed correctly.".to_string()
    } else {
        format!("Dependencies Installed:\n{}", installed.join("\n"))
    }
}

fn dry_run_summary(ledger: &Ledger) -> String {
    let planned = ledger.installed_this_pass();
    if planned.is_empty() {
        "Nothing to install.".to_string()
    } else {
        format!("Would install:\n{}", planned.join("\n"))
    }
}
