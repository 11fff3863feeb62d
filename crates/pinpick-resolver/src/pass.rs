//! One resolution pass over every discovered package.
//!
//! The pass owns the per-package state machine:
//!
//! ```text
//! Unchecked -> LocalModule | BuiltIn
//! Unchecked -> AlreadyInstalled            (installed, no rule constrains it)
//! Unchecked -> select_version -> None      -> NoCompatibleVersion
//! Unchecked -> select_version -> Some(v)   -> install(v) -> Installed | Deprecated | Failed
//! ```
//!
//! Packages are handled one at a time. The ledger is threaded through the
//! pass by value, and each selection sees the resolved view of everything
//! recorded before it. No per-package failure aborts the pass.

use std::collections::HashMap;

use pinpick_core::ledger::{DependencyStatus, Ledger, ResolvedDependency};
use pinpick_core::package::{normalize, AliasResolver};
use pinpick_core::rules::RuleSet;
use pinpick_core::version::Version;

use crate::catalog::VersionCatalog;
use crate::downgrade::{Downgrade, DowngradeReport};
use crate::graph::{resolution_order, PlannedPackage};
use crate::installer::{classify, DeprecationNotice, InstallOutcome, Installer};
use crate::resolver::{blocking_rules, select_version};

/// What the interpreter knows about an imported module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    /// Provided by the project itself.
    Local,
    /// Built into the interpreter or part of its standard library.
    BuiltIn,
    /// Importable from site-packages; version when one could be read.
    Installed(Option<Version>),
    Missing,
}

/// A module name found in the project together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPackage {
    pub observed: String,
    pub kind: ModuleKind,
}

impl DiscoveredPackage {
    pub fn new(observed: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            observed: observed.into(),
            kind,
        }
    }
}

/// Progress notifications emitted while the pass runs.
#[derive(Debug)]
pub enum PassEvent<'a> {
    /// Settled without touching the registry.
    Classified {
        package: &'a str,
        status: DependencyStatus,
    },
    /// About to query the catalog.
    Resolving { package: &'a PlannedPackage },
    NoCompatibleVersion { package: &'a PlannedPackage },
    Installing {
        package: &'a PlannedPackage,
        version: &'a Version,
    },
    Installed {
        package: &'a PlannedPackage,
        version: &'a Version,
    },
    Deprecated {
        package: &'a PlannedPackage,
        version: &'a Version,
        notice: &'a DeprecationNotice,
    },
    Failed {
        package: &'a PlannedPackage,
        version: &'a Version,
    },
}

/// Everything a finished pass produced.
#[derive(Debug)]
pub struct PassReport {
    pub ledger: Ledger,
    pub downgrades: DowngradeReport,
    /// Deprecation notices by observed package name.
    pub notices: Vec<(String, DeprecationNotice)>,
}

/// Drives selection and installation for one batch of discovered packages.
pub struct ResolutionPass<'a> {
    catalog: &'a dyn VersionCatalog,
    installer: &'a dyn Installer,
    rules: &'a RuleSet,
    aliases: &'a AliasResolver,
    markers: Vec<String>,
}

impl<'a> ResolutionPass<'a> {
    pub fn new(
        catalog: &'a dyn VersionCatalog,
        installer: &'a dyn Installer,
        rules: &'a RuleSet,
        aliases: &'a AliasResolver,
    ) -> Self {
        Self {
            catalog,
            installer,
            rules,
            aliases,
            markers: vec!["deprecated".to_string()],
        }
    }

    /// Replace the log markers used by the deprecation heuristic.
    pub fn with_markers(mut self, markers: Vec<String>) -> Self {
        self.markers = markers;
        self
    }

    /// Run the pass. Entries of `ledger` that are already terminal are left
    /// untouched; everything else in `discovered` ends in a terminal status.
    pub fn run(
        &self,
        mut ledger: Ledger,
        discovered: &[DiscoveredPackage],
        on_event: &mut dyn FnMut(&PassEvent<'_>),
    ) -> PassReport {
        let mut queue = Vec::new();
        for pkg in discovered {
            if ledger
                .get(&pkg.observed)
                .is_some_and(|dep| dep.status.is_terminal())
            {
                continue;
            }
            let canonical = self.aliases.canonicalize(&pkg.observed);
            let settled = match &pkg.kind {
                ModuleKind::Local => Some((None, DependencyStatus::LocalModule)),
                ModuleKind::BuiltIn => Some((None, DependencyStatus::BuiltIn)),
                ModuleKind::Installed(version) if !self.rules.is_constrained(&canonical) => {
                    Some((version.clone(), DependencyStatus::AlreadyInstalled))
                }
                ModuleKind::Installed(_) | ModuleKind::Missing => None,
            };
            match settled {
                Some((version, status)) => {
                    ledger.record(
                        &pkg.observed,
                        ResolvedDependency::new(canonical, version, status),
                    );
                    on_event(&PassEvent::Classified {
                        package: &pkg.observed,
                        status,
                    });
                }
                None => queue.push(PlannedPackage {
                    observed: pkg.observed.clone(),
                    canonical,
                }),
            }
        }

        let mut downgrades = DowngradeReport::new();
        let mut notices = Vec::new();
        // outcome per canonical identity, so aliases of one package install once
        let mut settled: HashMap<String, ResolvedDependency> = HashMap::new();

        for planned in resolution_order(queue, self.rules) {
            if let Some(previous) = settled.get(&normalize(&planned.canonical)) {
                tracing::debug!("{planned} already handled in this pass");
                ledger.record(&planned.observed, previous.clone());
                continue;
            }
            let dep = self.resolve_one(&planned, &ledger, &mut downgrades, &mut notices, on_event);
            settled.insert(normalize(&planned.canonical), dep.clone());
            ledger.record(&planned.observed, dep);
        }

        PassReport {
            ledger,
            downgrades,
            notices,
        }
    }

    fn resolve_one(
        &self,
        planned: &PlannedPackage,
        ledger: &Ledger,
        downgrades: &mut DowngradeReport,
        notices: &mut Vec<(String, DeprecationNotice)>,
        on_event: &mut dyn FnMut(&PassEvent<'_>),
    ) -> ResolvedDependency {
        on_event(&PassEvent::Resolving { package: planned });
        let canonical = planned.canonical.as_str();
        let resolved = ledger.resolved_versions();
        let candidates = self.catalog.available_versions(canonical);

        let Some(version) = select_version(canonical, &candidates, self.rules, &resolved) else {
            tracing::info!("No compatible version of {planned}");
            on_event(&PassEvent::NoCompatibleVersion { package: planned });
            return ResolvedDependency::new(canonical, None, DependencyStatus::NoCompatibleVersion);
        };

        if let Some(newest) = candidates.first().filter(|newest| **newest != version) {
            downgrades.add(Downgrade {
                package: planned.observed.clone(),
                newest: newest.clone(),
                chosen: version.clone(),
                blocked_by: blocking_rules(canonical, newest, self.rules, &resolved)
                    .iter()
                    .map(|rule| rule.to_string())
                    .collect(),
            });
        }

        on_event(&PassEvent::Installing {
            package: planned,
            version: &version,
        });
        let report = self.installer.install(canonical, &version);
        let status = match classify(&report, &self.markers) {
            InstallOutcome::Success => {
                on_event(&PassEvent::Installed {
                    package: planned,
                    version: &version,
                });
                DependencyStatus::Installed
            }
            InstallOutcome::Deprecated(notice) => {
                tracing::info!(
                    "{planned} looks deprecated ({}): {}",
                    notice.provenance,
                    notice.evidence
                );
                on_event(&PassEvent::Deprecated {
                    package: planned,
                    version: &version,
                    notice: &notice,
                });
                notices.push((planned.observed.clone(), notice));
                DependencyStatus::Deprecated
            }
            InstallOutcome::Failed => {
                tracing::debug!("install log for {planned}:\n{}", report.log);
                on_event(&PassEvent::Failed {
                    package: planned,
                    version: &version,
                });
                DependencyStatus::Failed
            }
        };
        ResolvedDependency::new(canonical, Some(version), status)
    }
}
