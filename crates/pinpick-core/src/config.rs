use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pinpick_util::errors::PinpickError;

use crate::package::AliasResolver;
use crate::rules::RuleSet;

/// File name of the optional project configuration.
pub const CONFIG_FILE: &str = "Pinpick.toml";

/// Project configuration loaded from `Pinpick.toml`.
///
/// Every field has a default, so a missing file behaves like an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Interpreter used for probing modules and running pip.
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default)]
    pub catalog: CatalogKind,

    /// Base URL of the package index, used by the `pypi` catalog.
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Ledger output path, relative to the project root.
    #[serde(default = "default_ledger")]
    pub ledger: String,

    /// Glob patterns skipped while scanning for imports.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Case-insensitive substrings in installer output that flag a deprecated package.
    #[serde(default = "default_deprecation_markers")]
    pub deprecation_markers: Vec<String>,

    /// Consider pre-release versions as candidates.
    #[serde(default)]
    pub prereleases: bool,

    /// Deprecated name -> canonical name.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,

    /// Constrained package -> { dependent package -> exclusive upper bound }.
    #[serde(default = "default_rules")]
    pub rules: BTreeMap<String, BTreeMap<String, String>>,
}

/// Which registry backend answers version queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// `python -m pip index versions`
    #[default]
    Pip,
    /// The index JSON API over HTTP.
    Pypi,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            python: default_python(),
            catalog: CatalogKind::default(),
            index_url: default_index_url(),
            ledger: default_ledger(),
            exclude: default_exclude(),
            deprecation_markers: default_deprecation_markers(),
            prereleases: false,
            aliases: default_aliases(),
            rules: default_rules(),
        }
    }
}

fn default_python() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}

fn default_index_url() -> String {
    "https://pypi.org".to_string()
}

fn default_ledger() -> String {
    "Dependencies.yaml".to_string()
}

fn default_exclude() -> Vec<String> {
    [".git/**", ".venv/**", "venv/**", "**/__pycache__/**", "**/site-packages/**"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_deprecation_markers() -> Vec<String> {
    vec!["deprecated".to_string()]
}

fn default_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([("sklearn".to_string(), "scikit-learn".to_string())])
}

fn default_rules() -> BTreeMap<String, BTreeMap<String, String>> {
    let numpy = BTreeMap::from([
        ("scipy".to_string(), "1.27.0".to_string()),
        ("pandas".to_string(), "3.0.0".to_string()),
        ("scikit-learn".to_string(), "1.4.0".to_string()),
    ]);
    BTreeMap::from([("numpy".to_string(), numpy)])
}

impl Config {
    /// Load `Pinpick.toml` from `project_root`, or return defaults if the file doesn't exist.
    pub fn load(project_root: &Path) -> miette::Result<Self> {
        let path = Self::path_in(project_root);
        if !path.is_file() {
            tracing::debug!("No {CONFIG_FILE} in {}, using defaults", project_root.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| PinpickError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| PinpickError::Config {
            message: format!("Failed to parse {CONFIG_FILE}: {e}"),
        })?;
        // surface bad bounds and alias cycles at load time, not mid-pass
        config.rule_set()?;
        config.alias_resolver()?;
        Ok(config)
    }

    pub fn path_in(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_FILE)
    }

    pub fn ledger_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.ledger)
    }

    pub fn rule_set(&self) -> Result<RuleSet, PinpickError> {
        RuleSet::from_table(&self.rules)
    }

    pub fn alias_resolver(&self) -> Result<AliasResolver, PinpickError> {
        AliasResolver::new(&self.aliases)
    }
}
