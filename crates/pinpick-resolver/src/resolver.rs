//! Version selection: the newest candidate that every enforceable rule allows.
//!
//! Selection is a best-effort downgrade. When the newest release breaks a rule
//! whose dependent is already resolved, the resolver walks down the list until
//! something fits. Rules whose dependent has not been resolved yet are skipped,
//! which is why the pass orders packages with [`crate::graph::resolution_order`].

use pinpick_core::ledger::ResolvedVersions;
use pinpick_core::rules::{CompatibilityRule, RuleSet};
use pinpick_core::version::Version;

/// Pick the first version in `candidates` (sorted newest first) that satisfies
/// every rule on `package` whose dependent appears in `resolved`.
///
/// Returns `None` for an empty catalog or when every candidate is excluded.
pub fn select_version(
    package: &str,
    candidates: &[Version],
    rules: &RuleSet,
    resolved: &ResolvedVersions,
) -> Option<Version> {
    let selected = candidates
        .iter()
        .find(|candidate| {
            let blocking = blocking_rules(package, candidate, rules, resolved);
            for rule in &blocking {
                tracing::debug!("{package} {candidate} rejected: {rule}");
            }
            blocking.is_empty()
        })
        .cloned();
    if selected.is_none() && !candidates.is_empty() {
        tracing::debug!(
            "{package}: all {} candidate(s) excluded by active rules",
            candidates.len()
        );
    }
    selected
}

/// Enforceable rules on `package` that exclude `candidate`.
pub fn blocking_rules<'r>(
    package: &str,
    candidate: &Version,
    rules: &'r RuleSet,
    resolved: &ResolvedVersions,
) -> Vec<&'r CompatibilityRule> {
    rules
        .rules_for(package)
        .iter()
        .filter(|rule| resolved.contains(&rule.dependent) && !rule.allows(candidate))
        .collect()
}

/// Rules on `package` whose dependent is already resolved.
pub fn active_rules<'r>(
    package: &str,
    rules: &'r RuleSet,
    resolved: &ResolvedVersions,
) -> Vec<&'r CompatibilityRule> {
    rules
        .rules_for(package)
        .iter()
        .filter(|rule| resolved.contains(&rule.dependent))
        .collect()
}
