//! Reporting packages that were held below their newest release.

use std::fmt;

use pinpick_core::version::Version;

/// Every package the pass installed below its newest published version.
#[derive(Debug, Default)]
pub struct DowngradeReport {
    pub downgrades: Vec<Downgrade>,
}

/// A package whose newest version was excluded by at least one rule.
#[derive(Debug, Clone)]
pub struct Downgrade {
    pub package: String,
    pub newest: Version,
    pub chosen: Version,
    /// Rendered rules that excluded `newest`.
    pub blocked_by: Vec<String>,
}

impl DowngradeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, downgrade: Downgrade) {
        self.downgrades.push(downgrade);
    }

    pub fn is_empty(&self) -> bool {
        self.downgrades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.downgrades.len()
    }
}

impl fmt::Display for DowngradeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.downgrades.is_empty() {
            return write!(f, "No downgrades.");
        }
        writeln!(f, "Downgrades ({}):", self.downgrades.len())?;
        for d in &self.downgrades {
            writeln!(f, "  {d}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Downgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.package, self.newest, self.chosen)?;
        if !self.blocked_by.is_empty() {
            write!(f, " ({})", self.blocked_by.join("; "))?;
        }
        Ok(())
    }
}
