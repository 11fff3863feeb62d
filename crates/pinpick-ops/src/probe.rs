//! Classify imported module names against the project and the interpreter.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use pinpick_core::version::Version;
use pinpick_resolver::pass::{DiscoveredPackage, ModuleKind};
use pinpick_util::errors::PinpickError;
use pinpick_util::process::CommandBuilder;

/// Classifies module names that are not part of the project.
pub trait ModuleProbe {
    /// One entry per name the probe knows about; absent names count as missing.
    fn probe(&self, names: &[String]) -> miette::Result<BTreeMap<String, ModuleKind>>;
}

/// Asks the configured interpreter, in a single call, what each name is.
///
/// Modules are located with `importlib.util.find_spec`, never imported.
pub struct PythonProbe {
    python: String,
}

const PROBE_SCRIPT: &str = r#"
import importlib.util, json, sys, sysconfig
try:
    from importlib import metadata
except ImportError:
    metadata = None

names = json.loads(sys.argv[1])
std = set(sys.builtin_module_names) | set(getattr(sys, "stdlib_module_names", ()))
stdlib_dir = sysconfig.get_paths().get("stdlib") or ""

def dist_version(name):
    if metadata is None:
        return None
    try:
        return metadata.version(name)
    except Exception:
        pass
    try:
        for dist in metadata.packages_distributions().get(name, []):
            return metadata.version(dist)
    except Exception:
        pass
    return None

out = {}
for name in names:
    if name in std:
        out[name] = {"kind": "builtin"}
        continue
    try:
        spec = importlib.util.find_spec(name)
    except Exception:
        spec = None
    if spec is None:
        out[name] = {"kind": "missing"}
        continue
    origin = spec.origin or ""
    if origin in ("built-in", "frozen") or (
        stdlib_dir and origin.startswith(stdlib_dir) and "site-packages" not in origin
    ):
        out[name] = {"kind": "builtin"}
        continue
    out[name] = {"kind": "installed", "version": dist_version(name)}

print(json.dumps(out))
"#;

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ProbeEntry {
    Builtin,
    Missing,
    Installed {
        #[serde(default)]
        version: Option<String>,
    },
}

impl PythonProbe {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl ModuleProbe for PythonProbe {
    fn probe(&self, names: &[String]) -> miette::Result<BTreeMap<String, ModuleKind>> {
        if names.is_empty() {
            return Ok(BTreeMap::new());
        }
        let payload = serde_json::to_string(names).map_err(|e| PinpickError::Generic {
            message: format!("Failed to encode module names: {e}"),
        })?;
        // `-c` puts the working directory on sys.path; keep project files out of it
        let cmd = CommandBuilder::new(&self.python)
            .arg("-c")
            .arg(PROBE_SCRIPT)
            .arg(payload)
            .cwd(std::env::temp_dir());
        let output = cmd.exec().map_err(|e| PinpickError::Interpreter {
            message: format!("Could not run '{}': {e}", self.python),
        })?;
        if !output.success {
            return Err(PinpickError::Interpreter {
                message: format!(
                    "'{}' exited with {:?} while probing modules:\n{}",
                    self.python,
                    output.code,
                    output.stderr.trim()
                ),
            }
            .into());
        }
        let parsed = parse_probe_output(&output.stdout).map_err(|e| PinpickError::Interpreter {
            message: format!("Unexpected probe output from '{}': {e}", self.python),
        })?;
        Ok(parsed)
    }
}

/// Decode the probe's JSON. Installed versions that do not parse become `None`.
pub fn parse_probe_output(stdout: &str) -> Result<BTreeMap<String, ModuleKind>, serde_json::Error> {
    let raw: BTreeMap<String, ProbeEntry> = serde_json::from_str(stdout.trim())?;
    Ok(raw
        .into_iter()
        .map(|(name, entry)| {
            let kind = match entry {
                ProbeEntry::Builtin => ModuleKind::BuiltIn,
                ProbeEntry::Missing => ModuleKind::Missing,
                ProbeEntry::Installed { version } => {
                    ModuleKind::Installed(version.and_then(|v| Version::parse(&v).ok()))
                }
            };
            (name, kind)
        })
        .collect())
}

/// `<name>.py` or `<name>/` directly in the project root.
pub fn is_local_module(project_root: &Path, name: &str) -> bool {
    project_root.join(format!("{name}.py")).is_file() || project_root.join(name).is_dir()
}

/// Classify every imported name: project-local first, then the probe.
pub fn discover(
    project_root: &Path,
    names: impl IntoIterator<Item = String>,
    probe: &dyn ModuleProbe,
) -> miette::Result<Vec<DiscoveredPackage>> {
    let (local, external): (Vec<String>, Vec<String>) = names
        .into_iter()
        .partition(|name| is_local_module(project_root, name));

    let mut kinds = probe.probe(&external)?;
    let mut discovered: Vec<DiscoveredPackage> = local
        .into_iter()
        .map(|name| DiscoveredPackage::new(name, ModuleKind::Local))
        .collect();
    for name in external {
        let kind = kinds.remove(&name).unwrap_or(ModuleKind::Missing);
        discovered.push(DiscoveredPackage::new(name, kind));
    }
    discovered.sort_by(|a, b| a.observed.cmp(&b.observed));
    Ok(discovered)
}
