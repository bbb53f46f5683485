//! Scenario: Unused config keys
//!
//! Validates:
//! 1) Unused keys are reported under Warn without error.
//! 2) Unused keys fail under Fail.
//! 3) Every key the service reads is covered by the registry.
//! 4) Unused pointers are sorted.

use cw_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const FULL_YAML: &str = r#"
server:
  bind_addr: "127.0.0.1:8080"
database:
  url_env: "CW_DATABASE_URL"
  max_connections: 5
metrics:
  unfinished_lookback_secs: 7200
  stale_lookback_secs: 7200
  stale_min_age_secs: 3600
sweep:
  enabled: true
  interval_secs: 30
"#;

#[test]
fn every_read_key_is_consumed() {
    let loaded = load_layered_yaml_from_strings(&[FULL_YAML]).unwrap();

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect("a config of only known keys must pass under Fail");
    assert!(report.is_clean());
}

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let overlay = r#"
metrics:
  stale_min_age_sec: 60
legacy:
  port: 3000
"#;
    let loaded = load_layered_yaml_from_strings(&[FULL_YAML, overlay]).unwrap();

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/legacy/port".to_string(),
            "/metrics/stale_min_age_sec".to_string(),
        ],
        "typo'd and unknown keys reported, sorted"
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&["server:\n  port: 8080\n"]).unwrap();

    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    let msg = format!("{err:?}");
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("/server/port"), "got: {msg}");
}

#[test]
fn empty_config_is_clean() {
    let loaded = load_layered_yaml_from_strings(&[]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}
