//! Discover the top-level modules a project imports.
//!
//! Scanning is line-based: `import a.b, c as d` contributes `a` and `c`,
//! `from a.b import x` contributes `a`. Relative imports are skipped.
//! Imports inside string literals or continued across lines are not seen.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use pinpick_util::errors::PinpickError;

/// Walks a project tree for `.py` files outside the excluded globs.
pub struct ImportScanner {
    root: PathBuf,
    exclude: GlobSet,
}

impl ImportScanner {
    pub fn new(root: &Path, exclude: &[String]) -> miette::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude {
            let glob = Glob::new(pattern).map_err(|e| PinpickError::Config {
                message: format!("Invalid exclude pattern '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|e| PinpickError::Config {
            message: format!("Failed to compile exclude patterns: {e}"),
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            exclude,
        })
    }

    /// Every Python source file under the root, sorted.
    pub fn python_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        self.collect(&self.root, &mut files);
        files.sort();
        files
    }

    fn collect(&self, dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            // symlinks are not followed, so a link back up the tree cannot loop
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let is_dir = file_type.is_dir();
            if self.is_excluded(&path, is_dir) {
                tracing::debug!("Skipping excluded path {}", path.display());
                continue;
            }
            if is_dir {
                self.collect(&path, out);
            } else if file_type.is_symlink() && path.is_dir() {
                tracing::debug!("Not following symlinked directory {}", path.display());
            } else if path.extension().is_some_and(|ext| ext == "py") {
                out.push(path);
            }
        }
    }

    fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        // directory globs such as `.venv/**` match entries below it, so test a child path too
        self.exclude.is_match(relative) || (is_dir && self.exclude.is_match(relative.join("_")))
    }

    /// Top-level module names imported anywhere in the project.
    pub fn scan(&self) -> BTreeSet<String> {
        let mut modules = BTreeSet::new();
        for file in self.python_files() {
            match std::fs::read_to_string(&file) {
                Ok(source) => modules.extend(imports_in(&source)),
                Err(e) => tracing::warn!("Could not read {}: {e}", file.display()),
            }
        }
        tracing::debug!("Found {} imported module(s)", modules.len());
        modules
    }
}

/// Top-level module names imported by one source text.
pub fn imports_in(source: &str) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();
    for line in source.lines() {
        let code = line.split('#').next().unwrap_or("");
        for statement in code.split(';') {
            let mut words = statement.split_whitespace();
            match words.next() {
                Some("import") => {
                    let rest: String = words.collect::<Vec<_>>().join(" ");
                    for item in rest.split(',') {
                        if let Some(name) = item.split_whitespace().next().and_then(top_level) {
                            modules.insert(name);
                        }
                    }
                }
                Some("from") => {
                    let target = words.next();
                    let is_import = words.next() == Some("import");
                    if let (Some(target), true) = (target, is_import) {
                        if let Some(name) = top_level(target) {
                            modules.insert(name);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    modules
}

/// First dotted component, or `None` for relative or malformed names.
fn top_level(dotted: &str) -> Option<String> {
    if dotted.starts_with('.') {
        return None;
    }
    let head = dotted.split('.').next()?.trim_matches(|c| c == '(' || c == ')');
    let valid = head
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && head.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| head.to_string())
}
