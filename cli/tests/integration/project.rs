//! Temporary project directories for driving the binary.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const USER_DATA: &str = "#!/bin/bash\nyum install -y stress-ng\n";

/// A temp directory holding the boot script; `ecsbase.yaml` is created on
/// first `config set`.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("stresstool_user_data.sh"), USER_DATA)
            .expect("write user data");
        Self { dir }
    }

    /// A project without a boot script.
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("ecsbase.yaml")
    }

    /// The binary, pointed at this project and isolated from the caller's
    /// AWS environment.
    pub fn ecsbase(&self) -> Command {
        let mut cmd = ecsbase();
        cmd.env("ECSBASE_CONFIG", self.config_path());
        cmd
    }

    /// Run `config set key value` and require success.
    pub fn set(&self, key: &str, value: &str) {
        self.ecsbase()
            .args(["config", "set", key, value])
            .assert()
            .success();
    }
}

pub fn ecsbase() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ecsbase"));
    cmd.env("NO_COLOR", "1")
        .env_remove("ECSBASE_CONFIG")
        .env_remove("AWS_ACCOUNT_ID")
        .env_remove("AWS_DEFAULT_REGION")
        .env_remove("RUST_LOG");
    cmd
}
