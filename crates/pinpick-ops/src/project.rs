//! Project context shared by every operation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pinpick_core::config::{CatalogKind, Config, CONFIG_FILE};
use pinpick_core::package::AliasResolver;
use pinpick_core::rules::RuleSet;
use pinpick_resolver::catalog::{PipIndexCatalog, PypiJsonCatalog, VersionCatalog};

use crate::scan::ImportScanner;

/// A project root with its configuration and the tables derived from it.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub rules: RuleSet,
    pub aliases: AliasResolver,
}

impl Project {
    pub fn load(root: &Path) -> miette::Result<Self> {
        let config = Config::load(root)?;
        let rules = config.rule_set()?;
        let aliases = config.alias_resolver()?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            rules,
            aliases,
        })
    }

    /// The nearest ancestor of `start` holding a `Pinpick.toml`, else `start`.
    pub fn find_root(start: &Path) -> PathBuf {
        pinpick_util::fs::find_ancestor_with(start, CONFIG_FILE)
            .unwrap_or_else(|| start.to_path_buf())
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.config.ledger_path(&self.root)
    }

    /// Top-level module names imported by the project's sources.
    pub fn imports(&self) -> miette::Result<BTreeSet<String>> {
        let scanner = ImportScanner::new(&self.root, &self.config.exclude)?;
        Ok(scanner.scan())
    }

    pub fn catalog(&self) -> miette::Result<Box<dyn VersionCatalog>> {
        let prereleases = self.config.prereleases;
        let catalog: Box<dyn VersionCatalog> = match self.config.catalog {
            CatalogKind::Pip => Box::new(PipIndexCatalog::new(&self.config.python, prereleases)),
            CatalogKind::Pypi => Box::new(PypiJsonCatalog::new(
                self.config.index_url.clone(),
                prereleases,
            )?),
        };
        Ok(catalog)
    }
}
