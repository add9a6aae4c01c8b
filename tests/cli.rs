//! Command line behaviour and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;

fn bundler() -> Command {
    Command::cargo_bin("kodegen_bundler_package").unwrap()
}

#[test]
fn help_lists_the_main_options() {
    bundler()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--retain-working-dir"));
}

#[test]
fn list_prints_bundlers_as_json() {
    let output = bundler().arg("--list").assert().success().get_output().clone();
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["rpm", "deb", "dmg", "exe"]);
    assert!(listing[0]["parameters"].as_array().unwrap().len() > 5);
}

#[test]
fn output_dir_is_required_for_bundling() {
    bundler()
        .args(["--format", "rpm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output-dir"));
}

#[test]
fn unknown_format_fails_with_a_hint() {
    let dir = tempfile::tempdir().unwrap();
    bundler()
        .args(["--format", "msi", "--output-dir"])
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown bundle format: msi"))
        .stderr(predicate::str::contains("hint: Choose one of: rpm, deb, dmg, exe."));
}

#[test]
fn validation_failures_are_reported_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = bundler()
        .args(["--format", "rpm", "--json", "--set", "appName=Hello", "--output-dir"])
        .arg(dir.path().join("out"))
        .arg("--build-root")
        .arg(dir.path().join("build"))
        .assert()
        .code(1)
        .get_output()
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcomes"][0]["format"], "rpm");
    assert_eq!(report["outcomes"][0]["status"], "failed");
    assert_eq!(report["outcomes"][0]["error"]["kind"], "configuration");
    assert!(!dir.path().join("build").exists());
}

#[test]
fn set_and_unset_of_the_same_key_conflict() {
    let dir = tempfile::tempdir().unwrap();
    bundler()
        .args(["--set", "runtime=/opt/jre", "--unset", "runtime", "--output-dir"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Conflicting arguments"))
        .stderr(predicate::str::contains("hint: Pass each parameter"));
}

#[test]
fn bad_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("package.toml");
    std::fs::write(&config, "[params\nappName = 1").unwrap();
    bundler()
        .arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TOML error"));
}
