//! Per-package resolution outcomes and their persisted YAML form.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use pinpick_util::errors::PinpickError;

use crate::package::normalize;
use crate::version::Version;

/// Where a package ended up after a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    /// Discovered, not yet looked at.
    Unchecked,
    /// Importable from the project itself.
    LocalModule,
    /// Part of the interpreter or its standard library.
    BuiltIn,
    /// Present before the pass and not constrained by any rule; left alone.
    AlreadyInstalled,
    /// Installed at the version the resolver picked.
    Installed,
    /// No published version satisfied the active rules.
    NoCompatibleVersion,
    /// Installed, but the installer says the package is deprecated or renamed.
    Deprecated,
    /// The installer exited unsuccessfully.
    Failed,
}

impl DependencyStatus {
    /// Anything but `Unchecked` is final for the current pass.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Unchecked)
    }

    /// Whether a package in this state makes rules naming it as dependent enforceable.
    pub fn counts_as_resolved(self) -> bool {
        matches!(
            self,
            Self::AlreadyInstalled | Self::Installed | Self::Deprecated
        )
    }
}

/// The final record for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// Canonical name the resolver and installer used.
    pub canonical: String,
    pub version: Option<Version>,
    pub status: DependencyStatus,
}

impl ResolvedDependency {
    pub fn unchecked(canonical: impl Into<String>) -> Self {
        Self::new(canonical, None, DependencyStatus::Unchecked)
    }

    pub fn new(
        canonical: impl Into<String>,
        version: Option<Version>,
        status: DependencyStatus,
    ) -> Self {
        Self {
            canonical: canonical.into(),
            version,
            status,
        }
    }
}

/// Renders the persisted status string, e.g. `1.26.4 --COMPATIBLE`.
impl fmt::Display for ResolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self
            .version
            .as_ref()
            .map(Version::as_str)
            .unwrap_or("Unknown");
        match self.status {
            DependencyStatus::Unchecked => f.write_str("Unchecked"),
            DependencyStatus::LocalModule => f.write_str("Local Module"),
            DependencyStatus::BuiltIn => f.write_str("Built-in"),
            DependencyStatus::AlreadyInstalled => match &self.version {
                Some(v) => write!(f, "{v}"),
                None => f.write_str("unknown version"),
            },
            DependencyStatus::Installed => write!(f, "{version} --COMPATIBLE"),
            DependencyStatus::Deprecated => write!(f, "{version} --DEPRECATED"),
            DependencyStatus::Failed => write!(f, "{version} --FAILED"),
            DependencyStatus::NoCompatibleVersion => f.write_str("Unknown --NO_COMPAT_VERSION"),
        }
    }
}

/// Read-only view of packages that count as resolved, keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct ResolvedVersions {
    entries: BTreeMap<String, Option<Version>>,
}

impl ResolvedVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: &str, version: Option<Version>) {
        self.entries.insert(normalize(package), version);
    }

    /// Builder-style [`insert`](Self::insert), handy in tests and fixtures.
    pub fn with(mut self, package: &str, version: Option<Version>) -> Self {
        self.insert(package, version);
        self
    }

    pub fn contains(&self, package: &str) -> bool {
        self.entries.contains_key(&normalize(package))
    }

    pub fn version_of(&self, package: &str) -> Option<&Version> {
        self.entries.get(&normalize(package)).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulated outcome per observed package name. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: BTreeMap<String, ResolvedDependency>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger with every name `Unchecked`, used for the placeholder snapshot.
    pub fn placeholder<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut ledger = Self::new();
        for name in names {
            ledger.record(name, ResolvedDependency::unchecked(name));
        }
        ledger
    }

    pub fn record(&mut self, package: &str, dependency: ResolvedDependency) {
        tracing::debug!("ledger: {package} -> {dependency}");
        self.entries.insert(package.to_string(), dependency);
    }

    pub fn get(&self, package: &str) -> Option<&ResolvedDependency> {
        self.entries.get(package)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedDependency)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical names whose status makes them visible to later resolutions.
    pub fn resolved_versions(&self) -> ResolvedVersions {
        let mut resolved = ResolvedVersions::new();
        for dep in self.entries.values() {
            if dep.status.counts_as_resolved() {
                resolved.insert(&dep.canonical, dep.version.clone());
            }
        }
        resolved
    }

    /// `name: version` for every package installed in this pass.
    pub fn installed_this_pass(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, dep)| dep.status == DependencyStatus::Installed)
            .map(|(name, dep)| match &dep.version {
                Some(v) => format!("{name}: {v}"),
                None => name.to_string(),
            })
            .collect()
    }

    /// Package name to status string, sorted by name.
    pub fn final_snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(name, dep)| (name.clone(), dep.to_string()))
            .collect()
    }

    pub fn to_yaml(&self) -> Result<String, PinpickError> {
        serde_yaml::to_string(&self.final_snapshot()).map_err(|e| PinpickError::Ledger {
            message: format!("Failed to serialize ledger: {e}"),
        })
    }

    /// Write the snapshot to `path`, replacing any previous snapshot.
    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let yaml = self.to_yaml()?;
        pinpick_util::fs::ensure_parent_dir(path).map_err(PinpickError::Io)?;
        std::fs::write(path, yaml).map_err(|e| PinpickError::Ledger {
            message: format!("Failed to write {}: {e}", path.display()),
        })?;
        Ok(())
    }

    /// Read a previously written snapshot back as raw status strings.
    pub fn read_snapshot(path: &Path) -> miette::Result<BTreeMap<String, String>> {
        let content = std::fs::read_to_string(path).map_err(|e| PinpickError::Ledger {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            PinpickError::Ledger {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }
}
