use std::cell::RefCell;
use std::collections::BTreeMap;

use pinpick_core::ledger::{DependencyStatus, Ledger};
use pinpick_core::package::AliasResolver;
use pinpick_core::rules::RuleSet;
use pinpick_core::version::Version;
use pinpick_resolver::catalog::VersionCatalog;
use pinpick_resolver::installer::{InstallReport, Installer, Provenance};
use pinpick_resolver::pass::{DiscoveredPackage, ModuleKind, PassEvent, ResolutionPass};

struct FakeCatalog {
    versions: BTreeMap<String, Vec<Version>>,
}

impl FakeCatalog {
    fn new(entries: &[(&str, &[&str])]) -> Self {
        let versions = entries
            .iter()
            .map(|(name, raw)| {
                let parsed = raw.iter().map(|s| Version::parse(s).unwrap()).collect();
                (name.to_string(), parsed)
            })
            .collect();
        Self { versions }
    }
}

impl VersionCatalog for FakeCatalog {
    fn available_versions(&self, package: &str) -> Vec<Version> {
        self.versions.get(package).cloned().unwrap_or_default()
    }
}

#[derive(Default)]
struct FakeInstaller {
    failing: Vec<&'static str>,
    logs: BTreeMap<&'static str, &'static str>,
    calls: RefCell<Vec<String>>,
}

impl Installer for FakeInstaller {
    fn install(&self, package: &str, version: &Version) -> InstallReport {
        self.calls.borrow_mut().push(format!("{package}=={version}"));
        InstallReport {
            success: !self.failing.iter().any(|f| *f == package),
            log: self.logs.get(package).copied().unwrap_or("").to_string(),
            notice: None,
        }
    }
}

fn numpy_rules() -> RuleSet {
    let table = BTreeMap::from([(
        "numpy".to_string(),
        BTreeMap::from([
            ("scipy".to_string(), "1.27.0".to_string()),
            ("pandas".to_string(), "3.0.0".to_string()),
            ("scikit-learn".to_string(), "1.4.0".to_string()),
        ]),
    )]);
    RuleSet::from_table(&table).unwrap()
}

fn sklearn_alias() -> AliasResolver {
    AliasResolver::new(&BTreeMap::from([(
        "sklearn".to_string(),
        "scikit-learn".to_string(),
    )]))
    .unwrap()
}

fn status_of(ledger: &Ledger, name: &str) -> String {
    ledger.get(name).unwrap().to_string()
}

#[test]
fn classifies_without_touching_the_registry() {
    let catalog = FakeCatalog::new(&[]);
    let installer = FakeInstaller::default();
    let rules = numpy_rules();
    let aliases = sklearn_alias();
    let pass = ResolutionPass::new(&catalog, &installer, &rules, &aliases);

    let discovered = vec![
        DiscoveredPackage::new("helpers", ModuleKind::Local),
        DiscoveredPackage::new("os", ModuleKind::BuiltIn),
        DiscoveredPackage::new(
            "requests",
            ModuleKind::Installed(Version::parse("2.31.0").ok()),
        ),
    ];
    let report = pass.run(Ledger::new(), &discovered, &mut |_| {});

    assert_eq!(status_of(&report.ledger, "helpers"), "Local Module");
    assert_eq!(status_of(&report.ledger, "os"), "Built-in");
    assert_eq!(status_of(&report.ledger, "requests"), "2.31.0");
    assert!(installer.calls.borrow().is_empty());
}

#[test]
fn dependent_installed_first_caps_constrained_package() {
    let catalog = FakeCatalog::new(&[
        ("numpy", &["2.1.3", "1.26.4", "1.25.2"]),
        ("scipy", &["1.14.1"]),
    ]);
    let installer = FakeInstaller::default();
    let rules = numpy_rules();
    let aliases = sklearn_alias();
    let pass = ResolutionPass::new(&catalog, &installer, &rules, &aliases);

    let discovered = vec![
        DiscoveredPackage::new("numpy", ModuleKind::Missing),
        DiscoveredPackage::new("scipy", ModuleKind::Missing),
    ];
    let report = pass.run(Ledger::new(), &discovered, &mut |_| {});

    assert_eq!(
        *installer.calls.borrow(),
        vec!["scipy==1.14.1".to_string(), "numpy==1.26.4".to_string()]
    );
    assert_eq!(status_of(&report.ledger, "numpy"), "1.26.4 --COMPATIBLE");
    assert_eq!(status_of(&report.ledger, "scipy"), "1.14.1 --COMPATIBLE");
    assert_eq!(report.downgrades.len(), 1);
    let downgrade = &report.downgrades.downgrades[0];
    assert_eq!(downgrade.newest.as_str(), "2.1.3");
    assert_eq!(downgrade.chosen.as_str(), "1.26.4");
    assert_eq!(downgrade.blocked_by.len(), 1);
}

#[test]
fn preinstalled_dependent_counts_as_resolved() {
    let catalog = FakeCatalog::new(&[("numpy", &["2.1.3", "1.26.4"])]);
    let installer = FakeInstaller::default();
    let rules = numpy_rules();
    let aliases = sklearn_alias();
    let pass = ResolutionPass::new(&catalog, &installer, &rules, &aliases);

    let discovered = vec![
        DiscoveredPackage::new("numpy", ModuleKind::Missing),
        DiscoveredPackage::new("pandas", ModuleKind::Installed(Version::parse("2.2.0").ok())),
        DiscoveredPackage::new("scipy", ModuleKind::Installed(None)),
    ];
    let report = pass.run(Ledger::new(), &discovered, &mut |_| {});

    assert_eq!(status_of(&report.ledger, "scipy"), "unknown version");
    assert_eq!(status_of(&report.ledger, "numpy"), "1.26.4 --COMPATIBLE");
}

#[test]
fn exhausted_and_empty_catalogs_do_not_abort() {
    let catalog = FakeCatalog::new(&[
        ("numpy", &["3.0.0", "2.5.0"]),
        ("scipy", &["1.14.1"]),
        ("requests", &["2.32.3"]),
    ]);
    let installer = FakeInstaller::default();
    let table = BTreeMap::from([(
        "numpy".to_string(),
        BTreeMap::from([("scipy".to_string(), "2.0.0".to_string())]),
    )]);
    let rules = RuleSet::from_table(&table).unwrap();
    let aliases = AliasResolver::default();
    let pass = ResolutionPass::new(&catalog, &installer, &rules, &aliases);

    let discovered = vec![
        DiscoveredPackage::new("ghost", ModuleKind::Missing),
        DiscoveredPackage::new("numpy", ModuleKind::Missing),
        DiscoveredPackage::new("requests", ModuleKind::Missing),
        DiscoveredPackage::new("scipy", ModuleKind::Missing),
    ];
    let mut misses = Vec::new();
    let report = pass.run(Ledger::new(), &discovered, &mut |event| {
        if let PassEvent::NoCompatibleVersion { package } = event {
            misses.push(package.observed.clone());
        }
    });

    assert_eq!(status_of(&report.ledger, "ghost"), "Unknown --NO_COMPAT_VERSION");
    assert_eq!(status_of(&report.ledger, "numpy"), "Unknown --NO_COMPAT_VERSION");
    assert_eq!(status_of(&report.ledger, "requests"), "2.32.3 --COMPATIBLE");
    assert_eq!(misses, vec!["ghost".to_string(), "numpy".to_string()]);
}

#[test]
fn alias_is_installed_under_canonical_name_and_reported_under_observed() {
    let catalog = FakeCatalog::new(&[("scikit-learn", &["1.5.2"])]);
    let installer = FakeInstaller::default();
    let rules = numpy_rules();
    let aliases = sklearn_alias();
    let pass = ResolutionPass::new(&catalog, &installer, &rules, &aliases);

    let discovered = vec![
        DiscoveredPackage::new("sklearn", ModuleKind::Missing),
        DiscoveredPackage::new("scikit-learn", ModuleKind::Missing),
    ];
    let report = pass.run(Ledger::new(), &discovered, &mut |_| {});

    assert_eq!(*installer.calls.borrow(), vec!["scikit-learn==1.5.2".to_string()]);
    assert_eq!(status_of(&report.ledger, "sklearn"), "1.5.2 --COMPATIBLE");
    assert_eq!(status_of(&report.ledger, "scikit-learn"), "1.5.2 --COMPATIBLE");
    assert_eq!(report.ledger.get("sklearn").unwrap().canonical, "scikit-learn");
}

#[test]
fn deprecation_and_failure_are_recorded() {
    let catalog = FakeCatalog::new(&[("oldpkg", &["0.0.1"]), ("broken", &["1.0.0"])]);
    let installer = FakeInstaller {
        failing: vec!["broken", "oldpkg"],
        logs: BTreeMap::from([(
            "oldpkg",
            "this package has been deprecated; use 'successor-pkg' instead",
        )]),
        ..FakeInstaller::default()
    };
    let rules = RuleSet::default();
    let aliases = AliasResolver::default();
    let pass = ResolutionPass::new(&catalog, &installer, &rules, &aliases);

    let discovered = vec![
        DiscoveredPackage::new("oldpkg", ModuleKind::Missing),
        DiscoveredPackage::new("broken", ModuleKind::Missing),
    ];
    let report = pass.run(Ledger::new(), &discovered, &mut |_| {});

    assert_eq!(status_of(&report.ledger, "oldpkg"), "0.0.1 --DEPRECATED");
    assert_eq!(status_of(&report.ledger, "broken"), "1.0.0 --FAILED");
    assert_eq!(report.notices.len(), 1);
    let (name, notice) = &report.notices[0];
    assert_eq!(name, "oldpkg");
    assert_eq!(notice.provenance, Provenance::Heuristic);
    assert_eq!(notice.successor.as_deref(), Some("successor-pkg"));
}

#[test]
fn terminal_entries_are_not_rewritten() {
    let catalog = FakeCatalog::new(&[("requests", &["2.32.3"])]);
    let installer = FakeInstaller::default();
    let rules = RuleSet::default();
    let aliases = AliasResolver::default();
    let pass = ResolutionPass::new(&catalog, &installer, &rules, &aliases);

    let discovered = vec![DiscoveredPackage::new("requests", ModuleKind::Missing)];
    let first = pass.run(Ledger::placeholder(["requests"]), &discovered, &mut |_| {});
    assert_eq!(
        first.ledger.get("requests").unwrap().status,
        DependencyStatus::Installed
    );

    let second = pass.run(first.ledger, &discovered, &mut |_| {});
    assert_eq!(installer.calls.borrow().len(), 1);
    assert_eq!(status_of(&second.ledger, "requests"), "2.32.3 --COMPATIBLE");
}
