//! Package identities: name normalization and deprecated alias mapping.

use std::collections::BTreeMap;

use pinpick_util::errors::PinpickError;

/// Normalize a distribution name the way the Python package index does:
/// lowercase, with runs of `-`, `_` and `.` collapsed to a single `-`.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.push(ch.to_ascii_lowercase());
    }
    out
}

/// Maps deprecated or renamed package identities to their canonical name.
///
/// Chains (`a -> b`, `b -> c`) are flattened at construction, so
/// canonicalizing an already-canonical name returns it unchanged.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    aliases: BTreeMap<String, String>,
}

impl AliasResolver {
    pub fn new(table: &BTreeMap<String, String>) -> Result<Self, PinpickError> {
        let direct: BTreeMap<String, String> = table
            .iter()
            .map(|(alias, canonical)| (normalize(alias), canonical.trim().to_string()))
            .collect();

        let mut aliases = BTreeMap::new();
        for (alias, first) in &direct {
            let mut target = first.clone();
            let mut hops = 0;
            while let Some(next) = direct.get(&normalize(&target)) {
                hops += 1;
                if hops > direct.len() {
                    return Err(PinpickError::Config {
                        message: format!("alias cycle involving '{alias}'"),
                    });
                }
                target = next.clone();
            }
            if normalize(&target) != *alias {
                aliases.insert(alias.clone(), target);
            }
        }
        Ok(Self { aliases })
    }

    /// Canonical name for `name`; names without an alias map to themselves.
    pub fn canonicalize(&self, name: &str) -> String {
        self.aliases
            .get(&normalize(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(&normalize(name))
    }

    /// Every alias that canonicalizes to `canonical`, sorted.
    pub fn aliases_of(&self, canonical: &str) -> Vec<&str> {
        let wanted = normalize(canonical);
        self.aliases
            .iter()
            .filter(|(_, target)| normalize(target) == wanted)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    /// `(alias, canonical)` pairs, sorted by alias.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }
}
