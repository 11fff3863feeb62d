//! Operation: show which version the resolver would pick for one package.

use std::collections::BTreeMap;
use std::path::Path;

use pinpick_core::ledger::ResolvedVersions;
use pinpick_core::package::AliasResolver;
use pinpick_core::version::Version;
use pinpick_resolver::catalog::VersionCatalog;
use pinpick_resolver::pass::ModuleKind;
use pinpick_resolver::resolver::{active_rules, blocking_rules, select_version};
use pinpick_util::progress;

use crate::probe::{ModuleProbe, PythonProbe};
use crate::project::Project;

/// What the resolver decided for one package, and why.
#[derive(Debug)]
pub struct ResolvePlan {
    pub package: String,
    pub canonical: String,
    pub newest: Option<Version>,
    pub selected: Option<Version>,
    /// Rules whose dependent is currently installed.
    pub active: Vec<String>,
    /// Active rules that exclude the newest release.
    pub blocking: Vec<String>,
}

pub fn resolve(project_root: &Path, package: &str) -> miette::Result<ResolvePlan> {
    let project = Project::load(project_root)?;
    let probe = PythonProbe::new(&project.config.python);
    let catalog = project.catalog()?;

    let sp = progress::spinner(&format!("Resolving {package}..."));
    let plan = plan(&project, package, &probe, catalog.as_ref());
    sp.finish_and_clear();
    let plan = plan?;

    print_plan(&plan);
    Ok(plan)
}

/// Resolve `package` against the dependents that are installed right now.
pub fn plan(
    project: &Project,
    package: &str,
    probe: &dyn ModuleProbe,
    catalog: &dyn VersionCatalog,
) -> miette::Result<ResolvePlan> {
    let canonical = project.aliases.canonicalize(package);

    // rule dependents are distribution names; the probe only understands import names
    let mut lookups: BTreeMap<String, String> = BTreeMap::new();
    for rule in project.rules.rules_for(&canonical) {
        for name in import_names(&rule.dependent, &project.aliases) {
            lookups.entry(name).or_insert_with(|| rule.dependent.clone());
        }
    }
    let names: Vec<String> = lookups.keys().cloned().collect();

    let mut resolved = ResolvedVersions::new();
    for (name, kind) in probe.probe(&names)? {
        let (ModuleKind::Installed(version), Some(dependent)) = (kind, lookups.get(&name)) else {
            continue;
        };
        tracing::debug!("{dependent} is installed as module '{name}'");
        if !resolved.contains(dependent) || version.is_some() {
            resolved.insert(dependent, version);
        }
    }

    let candidates = catalog.available_versions(&canonical);
    let selected = select_version(&canonical, &candidates, &project.rules, &resolved);
    let newest = candidates.first().cloned();
    let blocking = newest
        .as_ref()
        .map(|v| blocking_rules(&canonical, v, &project.rules, &resolved))
        .unwrap_or_default()
        .iter()
        .map(|rule| rule.to_string())
        .collect();
    let active = active_rules(&canonical, &project.rules, &resolved)
        .iter()
        .map(|rule| rule.to_string())
        .collect();

    Ok(ResolvePlan {
        package: package.to_string(),
        canonical,
        newest,
        selected,
        active,
        blocking,
    })
}

/// Module names a distribution may be imported under: the name itself, its
/// underscore spelling, and every alias that maps to it.
fn import_names(distribution: &str, aliases: &AliasResolver) -> Vec<String> {
    let mut names = vec![
        distribution.to_string(),
        distribution.replace(['-', '.'], "_"),
    ];
    names.extend(aliases.aliases_of(distribution).into_iter().map(String::from));
    names.sort();
    names.dedup();
    names
}

fn print_plan(plan: &ResolvePlan) {
    if plan.canonical != plan.package {
        progress::status_info("Alias", &format!("{} -> {}", plan.package, plan.canonical));
    }
    for rule in &plan.active {
        progress::status_info("Rule", rule);
    }
    match (&plan.selected, &plan.newest) {
        (Some(selected), Some(newest)) if selected != newest => {
            progress::status(
                "Selected",
                &format!("{} {selected} (newest is {newest})", plan.canonical),
            );
            for rule in &plan.blocking {
                progress::status_warn("Held back", rule);
            }
        }
        (Some(selected), _) => {
            progress::status("Selected", &format!("{} {selected}", plan.canonical));
        }
        (None, None) => {
            progress::status_error(
                "No match",
                &format!("no versions of {} found", plan.canonical),
            );
        }
        (None, Some(_)) => {
            progress::status_error(
                "No match",
                &format!(
                    "every version of {} is excluded by the active rules",
                    plan.canonical
                ),
            );
        }
    }
}
