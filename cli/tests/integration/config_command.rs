//! Integration tests for `ecsbase config`.
//!
//! Each test points `ECSBASE_CONFIG` at a temp project so nothing outside
//! the temp directory is read or written.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::project::Project;

// ---------------------------------------------------------------------------
// `ecsbase config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_help_shows_show_and_set_subcommands() {
    Project::new()
        .ecsbase()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    let project = Project::new();
    project
        .ecsbase()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ecsworkshop-base"))
        .stdout(predicate::str::contains("10.0.0.0/24"))
        .stdout(predicate::str::contains("container-demo"));
    assert!(!project.config_path().exists(), "show must not create the file");
}

#[test]
fn test_config_show_json_includes_path_and_config() {
    let project = Project::new();
    let output = project
        .ecsbase()
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["path"],
        project.config_path().display().to_string().as_str()
    );
    assert_eq!(json["config"]["mesh"]["name"], "ecs-mesh");
    assert_eq!(json["config"]["network"]["max_azs"], 2);
}

#[test]
fn test_config_flag_overrides_environment() {
    let project = Project::new();
    let other = Project::new();
    project
        .ecsbase()
        .arg("--config")
        .arg(other.config_path())
        .args(["config", "set", "cluster.name", "flag-cluster"])
        .assert()
        .success();
    assert!(other.config_path().exists());
    assert!(!project.config_path().exists());
}

// ---------------------------------------------------------------------------
// `ecsbase config set`
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_writes_yaml_and_show_reads_it_back() {
    let project = Project::new();
    project
        .ecsbase()
        .args(["config", "set", "mesh.tracing", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set mesh.tracing = false"));

    let content = std::fs::read_to_string(project.config_path()).unwrap();
    assert!(content.contains("tracing: false"), "got: {content}");

    project
        .ecsbase()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"mesh\.tracing:\s+false").unwrap());
}

#[cfg(unix)]
#[test]
fn test_config_set_creates_owner_only_file() {
    use std::os::unix::fs::PermissionsExt as _;

    let project = Project::new();
    project.set("cluster.name", "private");
    let mode = std::fs::metadata(project.config_path())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_config_set_unknown_key_fails_and_lists_valid_keys() {
    let project = Project::new();
    project
        .ecsbase()
        .args(["config", "set", "capacity.spot", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"))
        .stderr(predicate::str::contains("network.cidr"));
    assert!(!project.config_path().exists());
}

#[test]
fn test_config_set_keeps_hand_written_unknown_sections() {
    let project = Project::new();
    std::fs::write(project.config_path(), "capacity:\n  spot: true\n").unwrap();
    project.set("cluster.name", "other");

    let content = std::fs::read_to_string(project.config_path()).unwrap();
    assert!(content.contains("capacity:"), "got: {content}");
    assert!(content.contains("spot: true"), "got: {content}");
    assert!(content.contains("name: other"), "got: {content}");
}

#[test]
fn test_config_set_invalid_value_fails() {
    let project = Project::new();
    project
        .ecsbase()
        .args(["config", "set", "network.max_azs", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for network.max_azs"));
}

#[test]
fn test_config_set_invalid_value_json_error_object() {
    let project = Project::new();
    let output = project
        .ecsbase()
        .args(["config", "set", "mesh.enabled", "maybe", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"], true);
    assert_eq!(json["code"], "INVALID_CONFIG");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("Invalid value for mesh.enabled")
    );
}

#[test]
fn test_config_malformed_file_is_reported() {
    let project = Project::new();
    std::fs::write(project.config_path(), "network: [unclosed\n").unwrap();
    project
        .ecsbase()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ecsbase.yaml"));
}
