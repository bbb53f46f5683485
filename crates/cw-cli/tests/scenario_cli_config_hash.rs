use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

/// `cw config-hash` prints a stable hash + canonical JSON, refuses secret
/// literals, and under `--strict` refuses keys the service never reads.

fn write_yaml(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
    let p = dir.path().join(name);
    fs::write(&p, body).unwrap();
    p.to_string_lossy().to_string()
}

#[test]
fn prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_yaml(&dir, "base.yaml", "sweep:\n  interval_secs: 30\n");

    Command::cargo_bin("cw")
        .unwrap()
        .args(["config-hash", &base])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_hash="))
        .stdout(predicate::str::contains(r#"{"sweep":{"interval_secs":30}}"#));
}

#[test]
fn refuses_secret_literal() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_yaml(
        &dir,
        "bad.yaml",
        "database:\n  url_env: \"postgres://cw:hunter2@db/calls\"\n",
    );

    Command::cargo_bin("cw")
        .unwrap()
        .args(["config-hash", &bad])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("hunter2").not());
}

#[test]
fn strict_refuses_unused_keys_but_default_only_warns() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_yaml(&dir, "cfg.yaml", "server:\n  port: 3000\n");

    Command::cargo_bin("cw")
        .unwrap()
        .args(["config-hash", &cfg])
        .assert()
        .success()
        .stderr(predicate::str::contains("unused=/server/port"));

    Command::cargo_bin("cw")
        .unwrap()
        .args(["config-hash", "--strict", &cfg])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn requires_at_least_one_path() {
    Command::cargo_bin("cw")
        .unwrap()
        .arg("config-hash")
        .assert()
        .failure();
}
