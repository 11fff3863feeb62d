//! The fixed two-level compatibility table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use pinpick_util::errors::PinpickError;

use crate::package::normalize;
use crate::version::Version;

/// "If `dependent` is already resolved, `constrained` must stay strictly below `upper_bound`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityRule {
    pub constrained: String,
    pub dependent: String,
    pub upper_bound: Version,
}

impl CompatibilityRule {
    pub fn allows(&self, candidate: &Version) -> bool {
        candidate < &self.upper_bound
    }
}

impl fmt::Display for CompatibilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} < {} when {} is resolved",
            self.constrained, self.upper_bound, self.dependent
        )
    }
}

/// Immutable set of compatibility rules, keyed by normalized constrained package.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, Vec<CompatibilityRule>>,
}

impl RuleSet {
    /// Build from a `constrained -> { dependent -> bound }` table.
    pub fn from_table(
        table: &BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<Self, PinpickError> {
        let mut rules: BTreeMap<String, Vec<CompatibilityRule>> = BTreeMap::new();
        for (constrained, bounds) in table {
            for (dependent, bound) in bounds {
                let upper_bound = Version::parse(bound).map_err(|e| PinpickError::Config {
                    message: format!("rule {constrained} -> {dependent}: {e}"),
                })?;
                rules
                    .entry(normalize(constrained))
                    .or_default()
                    .push(CompatibilityRule {
                        constrained: constrained.clone(),
                        dependent: dependent.clone(),
                        upper_bound,
                    });
            }
        }
        Ok(Self { rules })
    }

    /// Rules constraining `package`; empty when it is unconstrained.
    pub fn rules_for(&self, package: &str) -> &[CompatibilityRule] {
        self.rules
            .get(&normalize(package))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_constrained(&self, package: &str) -> bool {
        !self.rules_for(package).is_empty()
    }

    /// Every package that appears as a dependent in some rule, normalized.
    pub fn dependents(&self) -> BTreeSet<String> {
        self.iter().map(|r| normalize(&r.dependent)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompatibilityRule> {
        self.rules.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
