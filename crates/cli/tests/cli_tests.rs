//! Command-line behaviour that is decided before any request is made.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn mayors() -> assert_cmd::Command {
    cargo_bin_cmd!("mayors")
}

#[test]
fn test_unknown_format_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("mayors.csv");

    mayors()
        .arg(&out)
        .args(["--format", "xml", "--state", "AK"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("xml"));

    assert!(!out.exists());
}

#[test]
fn test_unrecognized_extension_fails_before_fetching() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("mayors.txt");

    mayors()
        .arg(&out)
        .args(["--state", "AK"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--format"));

    assert!(!out.exists());
}

#[test]
fn test_unknown_state_code_fails_before_fetching() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("mayors.json");

    mayors()
        .arg(&out)
        .args(["--state", "AK", "ZZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown state code: ZZ"));

    assert!(!out.exists());
}

#[test]
fn test_append_requires_csv_file() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("mayors.json");

    mayors()
        .arg(&out)
        .args(["--append", "--state", "AK"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--append"));

    assert!(!out.exists());
}

#[test]
fn test_bad_config_file_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("mayors.toml");
    fs::write(&config, "[source]\nsearch_url = 42\n").unwrap();

    mayors()
        .arg(tmp.path().join("mayors.csv"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing config"));
}

#[test]
fn test_states_lists_every_subdivision() {
    let assert = mayors()
        .arg("states")
        .assert()
        .success()
        .stdout(predicate::str::contains("AK,Alaska"))
        .stdout(predicate::str::contains("MP,N. Mariana Islands"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 56);
}

#[test]
fn test_schema_export_writes_record_schema() {
    let tmp = TempDir::new().unwrap();
    let out_dir = tmp.path().join("schemas");

    mayors()
        .args(["schema", "export", "--out-dir"])
        .arg(&out_dir)
        .assert()
        .success();

    let schema = fs::read_to_string(out_dir.join("MayorRecord.schema.json")).unwrap();
    assert!(schema.contains("\"MayorRecord\""));
    assert!(schema.contains("next_election"));
}
