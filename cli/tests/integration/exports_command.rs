//! Integration tests for `ecsbase exports`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use serde_json::Value;

use crate::project::Project;

fn exports_json(project: &Project, extra: &[&str]) -> Vec<Value> {
    let output = project
        .ecsbase()
        .args(["exports", "--json"])
        .args(extra)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "exports failed: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn export_names(rows: &[Value]) -> Vec<String> {
    let mut names: Vec<_> = rows
        .iter()
        .filter_map(|r| r["export"].as_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

#[test]
fn test_exports_default_publishes_all_twelve() {
    let rows = exports_json(&Project::new(), &["--exported-only"]);
    assert_eq!(
        export_names(&rows),
        [
            "ECSClusterName",
            "MeshArn",
            "MeshEnvoyServiceArn",
            "MeshGwNlbDns",
            "MeshName",
            "MeshVGWArn",
            "MeshVGWName",
            "NSARN",
            "NSID",
            "NSNAME",
            "SecGrpId",
            "ServicesSecGrp",
        ]
    );
}

#[test]
fn test_exports_include_unexported_stress_tool_outputs() {
    let rows = exports_json(&Project::new(), &[]);
    let unexported: Vec<_> = rows
        .iter()
        .filter(|r| r["export"].is_null())
        .map(|r| r["output"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(unexported, ["StressToolEc2Id", "StressToolEc2Ip"]);
}

#[test]
fn test_exports_mesh_disabled_leaves_base_exports() {
    let project = Project::new();
    project.set("mesh.enabled", "false");
    let rows = exports_json(&project, &["--exported-only"]);
    assert_eq!(
        export_names(&rows),
        [
            "ECSClusterName",
            "NSARN",
            "NSID",
            "NSNAME",
            "SecGrpId",
            "ServicesSecGrp",
        ]
    );
}

#[test]
fn test_exports_name_selects_one_export() {
    let rows = exports_json(&Project::new(), &["--name", "ECSClusterName"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["export"], "ECSClusterName");
    assert!(rows[0]["value"]["Ref"].is_string());
}

#[test]
fn test_exports_name_for_disabled_mesh_explains_why() {
    let project = Project::new();
    project.set("mesh.enabled", "false");
    project
        .ecsbase()
        .args(["exports", "--name", "MeshArn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mesh.enabled is false"));
}

#[test]
fn test_exports_human_output_shows_export_names() {
    Project::new()
        .ecsbase()
        .arg("exports")
        .assert()
        .success()
        .stdout(predicate::str::contains("MeshGwNlbDns"))
        .stdout(predicate::str::contains("NSARN"));
}
