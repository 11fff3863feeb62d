use std::collections::BTreeMap;

use pinpick_core::rules::RuleSet;
use pinpick_core::version::Version;

fn numpy_rules() -> RuleSet {
    let table = BTreeMap::from([(
        "numpy".to_string(),
        BTreeMap::from([
            ("scipy".to_string(), "1.27.0".to_string()),
            ("pandas".to_string(), "3.0.0".to_string()),
        ]),
    )]);
    RuleSet::from_table(&table).unwrap()
}

#[test]
fn rules_for_constrained_package() {
    let rules = numpy_rules();
    let numpy = rules.rules_for("numpy");
    assert_eq!(numpy.len(), 2);
    assert!(numpy.iter().any(|r| r.dependent == "scipy"));
}

#[test]
fn absent_entry_is_unconstrained() {
    let rules = numpy_rules();
    assert!(rules.rules_for("scipy").is_empty());
    assert!(!rules.is_constrained("requests"));
}

#[test]
fn lookup_is_normalized() {
    let rules = numpy_rules();
    assert_eq!(rules.rules_for("NumPy").len(), 2);
}

#[test]
fn bound_is_exclusive() {
    let rules = numpy_rules();
    let scipy_rule = rules
        .rules_for("numpy")
        .iter()
        .find(|r| r.dependent == "scipy")
        .unwrap();
    assert!(scipy_rule.allows(&Version::parse("1.26.4").unwrap()));
    assert!(!scipy_rule.allows(&Version::parse("1.27.0").unwrap()));
    assert!(!scipy_rule.allows(&Version::parse("2.0.0").unwrap()));
}

#[test]
fn dependents_lists_every_dependent() {
    let rules = numpy_rules();
    let dependents: Vec<String> = rules.dependents().into_iter().collect();
    assert_eq!(dependents, vec!["pandas".to_string(), "scipy".to_string()]);
}

#[test]
fn display_reads_as_sentence() {
    let rules = numpy_rules();
    let text = rules.rules_for("numpy")[0].to_string();
    assert_eq!(text, "numpy < 3.0.0 when pandas is resolved");
}

#[test]
fn bad_bound_is_config_error() {
    let table = BTreeMap::from([(
        "numpy".to_string(),
        BTreeMap::from([("scipy".to_string(), "soon".to_string())]),
    )]);
    let err = RuleSet::from_table(&table).unwrap_err();
    assert!(err.to_string().starts_with("Config error"));
}
