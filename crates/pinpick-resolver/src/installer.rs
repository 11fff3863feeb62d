//! Applying a selection and classifying the result.
//!
//! An installer returns an [`InstallReport`]. If the installer knows for a fact
//! that the package is deprecated it says so in [`InstallReport::notice`] and
//! that notice is used as-is. Otherwise [`classify`] falls back to scanning the
//! raw log for deprecation wording. That scan is approximate: a package can be
//! retired without the expected wording (missed), and unrelated warnings can
//! contain a marker (false alarm). Heuristic results are tagged
//! [`Provenance::Heuristic`] so callers can present them as such.

use std::fmt;

use pinpick_core::version::Version;
use pinpick_util::process::CommandBuilder;

/// How a deprecation verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Stated by the installer itself.
    Reported,
    /// Guessed from free-text log output.
    Heuristic,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reported => f.write_str("reported by installer"),
            Self::Heuristic => f.write_str("detected in installer output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationNotice {
    pub provenance: Provenance,
    /// Replacement package, when the message names one.
    pub successor: Option<String>,
    /// The log line or message that triggered the verdict.
    pub evidence: String,
}

/// Raw result of one install attempt.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub success: bool,
    pub log: String,
    pub notice: Option<DeprecationNotice>,
}

/// Final verdict for one install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Success,
    Deprecated(DeprecationNotice),
    Failed,
}

/// Installs one exact version of a package. Blocking.
pub trait Installer {
    fn install(&self, package: &str, version: &Version) -> InstallReport;
}

/// Turn a report into an outcome. Deprecation wins over the exit status.
pub fn classify(report: &InstallReport, markers: &[String]) -> InstallOutcome {
    if let Some(notice) = &report.notice {
        return InstallOutcome::Deprecated(notice.clone());
    }
    if let Some(notice) = detect_deprecation(&report.log, markers) {
        return InstallOutcome::Deprecated(notice);
    }
    if report.success {
        InstallOutcome::Success
    } else {
        InstallOutcome::Failed
    }
}

/// Best-effort scan of installer output for deprecation wording.
///
/// A line matches when it contains one of `markers` (case-insensitive) or
/// says `use '<name>' instead` / `use '<name>' rather than`.
pub fn detect_deprecation(log: &str, markers: &[String]) -> Option<DeprecationNotice> {
    let markers: Vec<String> = markers
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| m.to_ascii_lowercase())
        .collect();

    let mut hit: Option<&str> = None;
    let mut successor: Option<String> = None;
    for line in log.lines() {
        let lowered = line.to_ascii_lowercase();
        let named = successor_in(line);
        let redirect = named.as_ref().is_some_and(|_| {
            lowered.contains("instead") || lowered.contains("rather than")
        });
        let marked = markers.iter().any(|m| lowered.contains(m.as_str()));
        if marked || redirect {
            if hit.is_none() {
                hit = Some(line.trim());
            }
            if successor.is_none() {
                successor = named;
            }
        }
    }

    hit.map(|evidence| DeprecationNotice {
        provenance: Provenance::Heuristic,
        successor,
        evidence: evidence.to_string(),
    })
}

/// The quoted name in `use 'name'` or `use "name"`, if the line has one.
fn successor_in(line: &str) -> Option<String> {
    let lowered = line.to_ascii_lowercase();
    for quote in ['\'', '"'] {
        let needle = format!("use {quote}");
        if let Some(start) = lowered.find(&needle) {
            let rest = &line[start + needle.len()..];
            if let Some(end) = rest.find(quote) {
                let name = rest[..end].trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

/// Installs through `python -m pip install <package>==<version>`.
///
/// pip has no structured deprecation channel, so reports never carry a notice.
pub struct PipInstaller {
    python: String,
}

impl PipInstaller {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl Installer for PipInstaller {
    fn install(&self, package: &str, version: &Version) -> InstallReport {
        let cmd = CommandBuilder::new(&self.python)
            .args(["-m", "pip", "install"])
            .arg(format!("{package}=={version}"))
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
            .env("PIP_NO_INPUT", "1");
        match cmd.exec() {
            Ok(output) => InstallReport {
                success: output.success,
                log: output.combined(),
                notice: None,
            },
            Err(e) => {
                tracing::warn!("Could not run `{}`: {e}", cmd.display());
                InstallReport {
                    success: false,
                    log: e.to_string(),
                    notice: None,
                }
            }
        }
    }
}
