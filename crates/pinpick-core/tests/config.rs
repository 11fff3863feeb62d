use pinpick_core::config::{CatalogKind, Config, CONFIG_FILE};
use tempfile::TempDir;

#[test]
fn test_default_config_reproduces_builtin_tables() {
    let config = Config::default();
    assert_eq!(config.aliases.get("sklearn").map(String::as_str), Some("scikit-learn"));
    let numpy = config.rules.get("numpy").unwrap();
    assert_eq!(numpy.get("scipy").map(String::as_str), Some("1.27.0"));
    assert_eq!(numpy.get("pandas").map(String::as_str), Some("3.0.0"));
    assert_eq!(numpy.get("scikit-learn").map(String::as_str), Some("1.4.0"));
}

#[test]
fn test_default_catalog_is_pip() {
    assert_eq!(Config::default().catalog, CatalogKind::Pip);
}

#[test]
fn test_empty_toml_gives_defaults() {
    let config = Config::parse_toml("").unwrap();
    assert_eq!(config.ledger, "Dependencies.yaml");
    assert_eq!(config.deprecation_markers, vec!["deprecated".to_string()]);
    assert!(!config.prereleases);
    assert!(config.rule_set().unwrap().is_constrained("numpy"));
}

#[test]
fn test_parse_full_config() {
    let toml = r#"
python = "/opt/py312/bin/python"
catalog = "pypi"
index-url = "https://mirror.example.org"
ledger = "reports/deps.yaml"
exclude = ["build/**"]
deprecation-markers = ["deprecated", "no longer maintained"]
prereleases = true

[aliases]
cv2 = "opencv-python"

[rules.tensorflow]
numpy = "2.0.0"
"#;
    let config = Config::parse_toml(toml).unwrap();
    assert_eq!(config.python, "/opt/py312/bin/python");
    assert_eq!(config.catalog, CatalogKind::Pypi);
    assert_eq!(config.index_url, "https://mirror.example.org");
    assert_eq!(config.exclude, vec!["build/**".to_string()]);
    assert_eq!(config.deprecation_markers.len(), 2);
    assert!(config.prereleases);

    let aliases = config.alias_resolver().unwrap();
    assert_eq!(aliases.canonicalize("cv2"), "opencv-python");
    // an explicit table replaces the default one
    assert_eq!(aliases.canonicalize("sklearn"), "sklearn");

    let rules = config.rule_set().unwrap();
    assert!(rules.is_constrained("tensorflow"));
    assert!(!rules.is_constrained("numpy"));
}

#[test]
fn test_invalid_bound_rejected_at_load() {
    let toml = r#"
[rules.numpy]
scipy = "not-a-version"
"#;
    let err = Config::parse_toml(toml).unwrap_err();
    assert!(err.to_string().contains("Config error"), "got: {err}");
}

#[test]
fn test_alias_cycle_rejected_at_load() {
    let toml = r#"
[aliases]
a = "b"
b = "a"
"#;
    assert!(Config::parse_toml(toml).is_err());
}

#[test]
fn test_load_missing_file_returns_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load(tmp.path()).unwrap();
    assert_eq!(config.ledger, "Dependencies.yaml");
}

#[test]
fn test_load_reads_project_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(CONFIG_FILE), "ledger = \"out.yaml\"\n").unwrap();
    let config = Config::load(tmp.path()).unwrap();
    assert_eq!(config.ledger_path(tmp.path()), tmp.path().join("out.yaml"));
}
