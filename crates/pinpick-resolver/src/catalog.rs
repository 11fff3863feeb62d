//! Version catalogs: where the list of published versions comes from.
//!
//! Every catalog swallows transport and parse failures and answers with an
//! empty list, which the pass records as "no compatible version".

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use pinpick_core::version::Version;
use pinpick_util::errors::PinpickError;
use pinpick_util::process::CommandBuilder;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of published versions for a package.
pub trait VersionCatalog {
    /// Versions of `package` sorted descending by precedence; empty on any failure.
    fn available_versions(&self, package: &str) -> Vec<Version>;
}

/// Parse raw registry strings, drop what does not parse, sort newest first.
///
/// Pre-releases are dropped unless `prereleases` is set.
pub fn sort_descending<S: AsRef<str>>(raw: &[S], prereleases: bool) -> Vec<Version> {
    let mut versions: Vec<Version> = raw
        .iter()
        .filter_map(|s| match Version::parse(s.as_ref()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("Skipping unparseable version: {e}");
                None
            }
        })
        .filter(|v| prereleases || !v.is_prerelease())
        .collect();
    versions.sort_by(|a, b| b.cmp(a));
    versions.dedup();
    versions
}

/// Queries `python -m pip index versions <package>`.
pub struct PipIndexCatalog {
    python: String,
    prereleases: bool,
}

impl PipIndexCatalog {
    pub fn new(python: impl Into<String>, prereleases: bool) -> Self {
        Self {
            python: python.into(),
            prereleases,
        }
    }

    fn query(&self, package: &str) -> Result<Vec<String>, PinpickError> {
        let mut cmd = CommandBuilder::new(&self.python)
            .args(["-m", "pip", "index", "versions", package])
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
            .env("PIP_NO_INPUT", "1");
        if self.prereleases {
            cmd = cmd.arg("--pre");
        }
        let output = cmd.exec().map_err(|e| PinpickError::Registry {
            message: format!("Failed to run `{}`: {e}", cmd.display()),
        })?;
        if !output.success {
            return Err(PinpickError::Registry {
                message: format!("`{}` exited with {:?}", cmd.display(), output.code),
            });
        }
        Ok(parse_pip_index_output(package, &output.stdout))
    }
}

impl VersionCatalog for PipIndexCatalog {
    fn available_versions(&self, package: &str) -> Vec<Version> {
        match self.query(package) {
            Ok(raw) => sort_descending(&raw, self.prereleases),
            Err(e) => {
                tracing::warn!("No versions for {package}: {e}");
                Vec::new()
            }
        }
    }
}

/// Extract version strings from `pip index versions` output.
///
/// Prefers the `Available versions:` line; falls back to the `name (latest)`
/// header. Only entries starting with a digit are kept.
pub fn parse_pip_index_output(package: &str, stdout: &str) -> Vec<String> {
    let listed = stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Available versions:"))
        .map(|rest| rest.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>());

    let raw = listed.unwrap_or_else(|| {
        let header = format!("{} (", package.to_ascii_lowercase());
        stdout
            .lines()
            .map(str::trim)
            .find(|line| line.to_ascii_lowercase().starts_with(&header))
            .and_then(|line| {
                let open = line.find('(')?;
                let close = line[open..].find(')')? + open;
                Some(vec![line[open + 1..close].trim().to_string()])
            })
            .unwrap_or_default()
    });

    raw.into_iter()
        .filter(|v| v.starts_with(|c: char| c.is_ascii_digit()))
        .collect()
}

/// Queries the index JSON API (`<index>/pypi/<package>/json`).
pub struct PypiJsonCatalog {
    client: reqwest::blocking::Client,
    index_url: String,
    prereleases: bool,
}

#[derive(Deserialize)]
struct ProjectJson {
    #[serde(default)]
    releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    yanked: bool,
}

impl PypiJsonCatalog {
    pub fn new(index_url: impl Into<String>, prereleases: bool) -> miette::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pinpick/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PinpickError::Registry {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            index_url: index_url.into(),
            prereleases,
        })
    }

    pub fn project_url(&self, package: &str) -> String {
        format!(
            "{}/pypi/{}/json",
            self.index_url.trim_end_matches('/'),
            package
        )
    }

    fn query(&self, package: &str) -> Result<Vec<String>, PinpickError> {
        let url = self.project_url(package);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| PinpickError::Registry {
                message: format!("Request to {url} failed: {e}"),
            })?;
        if !resp.status().is_success() {
            return Err(PinpickError::Registry {
                message: format!("HTTP {} for {url}", resp.status()),
            });
        }
        let body = resp.text().map_err(|e| PinpickError::Registry {
            message: format!("Failed to read response from {url}: {e}"),
        })?;
        parse_pypi_json(&body).map_err(|e| PinpickError::Registry {
            message: format!("Malformed JSON from {url}: {e}"),
        })
    }
}

impl VersionCatalog for PypiJsonCatalog {
    fn available_versions(&self, package: &str) -> Vec<Version> {
        match self.query(package) {
            Ok(raw) => sort_descending(&raw, self.prereleases),
            Err(e) => {
                tracing::warn!("No versions for {package}: {e}");
                Vec::new()
            }
        }
    }
}

/// Release keys from a project JSON document, skipping releases with no
/// files or only yanked files.
pub fn parse_pypi_json(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let project: ProjectJson = serde_json::from_str(body)?;
    Ok(project
        .releases
        .into_iter()
        .filter(|(_, files)| files.iter().any(|f| !f.yanked))
        .map(|(version, _)| version)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIP_OUTPUT: &str = "\
numpy (2.1.3)
Available versions: 2.1.3, 2.0.2, 1.26.4, 1.9.0, 1.10.0
  INSTALLED: 1.26.4
  LATEST:    2.1.3
";

    #[test]
    fn parses_available_versions_line() {
        let raw = parse_pip_index_output("numpy", PIP_OUTPUT);
        assert_eq!(raw, vec!["2.1.3", "2.0.2", "1.26.4", "1.9.0", "1.10.0"]);
    }

    #[test]
    fn falls_back_to_header() {
        let raw = parse_pip_index_output("NumPy", "numpy (2.1.3)\n");
        assert_eq!(raw, vec!["2.1.3"]);
    }

    #[test]
    fn unrelated_output_yields_nothing() {
        assert!(
            parse_pip_index_output("numpy", "ERROR: No matching distribution found").is_empty()
        );
    }

    #[test]
    fn sorts_by_precedence_not_text() {
        let raw = parse_pip_index_output("numpy", PIP_OUTPUT);
        let sorted: Vec<String> = sort_descending(&raw, false)
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(sorted, vec!["2.1.3", "2.0.2", "1.26.4", "1.10.0", "1.9.0"]);
    }

    #[test]
    fn drops_prereleases_and_garbage_by_default() {
        let raw = ["2.0.0rc1", "1.5.0", "nightly"];
        let sorted = sort_descending(&raw, false);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].as_str(), "1.5.0");

        let with_pre = sort_descending(&raw, true);
        assert_eq!(with_pre[0].as_str(), "2.0.0rc1");
    }

    #[test]
    fn pypi_json_skips_empty_and_yanked_releases() {
        let body = r#"{
            "info": {"name": "demo"},
            "releases": {
                "1.0.0": [{"yanked": false}],
                "1.1.0": [{"yanked": true}],
                "1.2.0": [],
                "1.3.0": [{"yanked": true}, {"yanked": false}]
            }
        }"#;
        let raw = parse_pypi_json(body).unwrap();
        assert_eq!(raw, vec!["1.0.0".to_string(), "1.3.0".to_string()]);
    }

    #[test]
    fn pypi_json_rejects_non_json() {
        assert!(parse_pypi_json("<html>").is_err());
    }

    #[test]
    fn project_url_trims_trailing_slash() {
        let catalog = PypiJsonCatalog::new("https://pypi.org/", false).unwrap();
        assert_eq!(
            catalog.project_url("numpy"),
            "https://pypi.org/pypi/numpy/json"
        );
    }
}
