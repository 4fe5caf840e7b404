//! Integration tests for the CLI skeleton: help, version and argument parsing.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::project::ecsbase;

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    ecsbase().assert().code(2).stderr(predicate::str::contains(
        "Synthesize the ECS workshop base stack",
    ));
}

#[test]
fn test_cli_help_lists_commands() {
    ecsbase()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("resources"))
        .stdout(predicate::str::contains("exports"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    ecsbase()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ecsbase"));
}

#[test]
fn test_version_command_shows_version() {
    ecsbase()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ecsbase 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = ecsbase()
        .args(["version", "--json"])
        .output()
        .expect("run ecsbase");
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["version"], "0.1.0");
}

#[test]
fn test_cli_unknown_command_fails() {
    ecsbase()
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_synth_rejects_unknown_format() {
    ecsbase()
        .args(["synth", "--format", "toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_exports_rejects_unknown_export_name() {
    ecsbase()
        .args(["exports", "--name", "VpcId"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
