use std::fs;

use pinpick_ops::probe::{discover, is_local_module, ModuleProbe};
use pinpick_ops::scan::ImportScanner;
use pinpick_resolver::pass::ModuleKind;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn default_excludes() -> Vec<String> {
    pinpick_core::config::Config::default().exclude
}

#[test]
fn walks_nested_sources_and_skips_excluded_dirs() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("app/sub")).unwrap();
    fs::create_dir_all(tmp.path().join(".venv/lib")).unwrap();
    fs::write(tmp.path().join("app/sub/mod.py"), "import yaml\n").unwrap();
    fs::write(tmp.path().join("run.py"), "from flask import Flask\n").unwrap();
    fs::write(tmp.path().join(".venv/lib/site.py"), "import should_not_appear\n").unwrap();
    fs::write(tmp.path().join("notes.txt"), "import nope\n").unwrap();

    let scanner = ImportScanner::new(tmp.path(), &default_excludes()).unwrap();
    let files = scanner.python_files();
    assert_eq!(files.len(), 2);

    let modules: Vec<String> = scanner.scan().into_iter().collect();
    assert_eq!(modules, vec!["flask".to_string(), "yaml".to_string()]);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("pkg")).unwrap();
    fs::write(tmp.path().join("pkg/mod.py"), "import yaml\n").unwrap();
    std::os::unix::fs::symlink("..", tmp.path().join("pkg/loop")).unwrap();

    let scanner = ImportScanner::new(tmp.path(), &default_excludes()).unwrap();
    assert_eq!(scanner.python_files(), vec![tmp.path().join("pkg/mod.py")]);
}

#[test]
fn invalid_exclude_pattern_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    let err = ImportScanner::new(tmp.path(), &["a/[".to_string()])
        .err()
        .unwrap();
    assert!(format!("{err}").contains("Config error"));
}

struct NothingInstalled;

impl ModuleProbe for NothingInstalled {
    fn probe(&self, names: &[String]) -> miette::Result<BTreeMap<String, ModuleKind>> {
        assert!(!names.contains(&"helpers".to_string()));
        assert!(!names.contains(&"pkg".to_string()));
        Ok(BTreeMap::new())
    }
}

#[test]
fn local_modules_are_never_probed() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("helpers.py"), "").unwrap();
    fs::create_dir(tmp.path().join("pkg")).unwrap();
    assert!(is_local_module(tmp.path(), "helpers"));
    assert!(is_local_module(tmp.path(), "pkg"));
    assert!(!is_local_module(tmp.path(), "numpy"));

    let names = ["helpers", "numpy", "pkg"].map(String::from);
    let discovered = discover(tmp.path(), names, &NothingInstalled).unwrap();
    let kinds: Vec<(&str, &ModuleKind)> = discovered
        .iter()
        .map(|d| (d.observed.as_str(), &d.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("helpers", &ModuleKind::Local),
            ("numpy", &ModuleKind::Missing),
            ("pkg", &ModuleKind::Local),
        ]
    );
}
