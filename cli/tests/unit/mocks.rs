//! Shared in-memory port implementations for unit tests.
//!
//! Each fake records what the service did with it so tests can assert on
//! side effects without touching the filesystem or the process environment.

#![allow(clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ecsbase_cli::application::ports::{
    ConfigStore, EnvironmentSource, ProgressReporter, TemplateWriter, UserDataSource,
};
use ecsbase_cli::domain::config::StackConfig;
use ecsbase_cli::domain::stack::DeployEnvironment;

pub const PROJECT_DIR: &str = "/project";
pub const USER_DATA: &str = "#!/bin/bash\nyum install -y stress-ng\n";

/// Path the default config resolves its boot script to.
pub fn default_user_data_path() -> PathBuf {
    Path::new(PROJECT_DIR).join("stresstool_user_data.sh")
}

// ── Config store ──────────────────────────────────────────────────────────────

pub struct MemoryConfigStore {
    config: RefCell<StackConfig>,
    path: PathBuf,
    pub saves: Cell<usize>,
}

impl MemoryConfigStore {
    pub fn new(config: StackConfig) -> Self {
        Self {
            config: RefCell::new(config),
            path: Path::new(PROJECT_DIR).join("ecsbase.yaml"),
            saves: Cell::new(0),
        }
    }

    pub fn current(&self) -> StackConfig {
        self.config.borrow().clone()
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new(StackConfig::default())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<StackConfig> {
        Ok(self.current())
    }

    fn save(&self, config: &StackConfig) -> Result<()> {
        *self.config.borrow_mut() = config.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(self.path.clone())
    }
}

// ── Environment ───────────────────────────────────────────────────────────────

pub struct FixedEnvironment(pub DeployEnvironment);

impl FixedEnvironment {
    pub fn agnostic() -> Self {
        Self(DeployEnvironment::default())
    }

    pub fn in_region(region: &str) -> Self {
        Self(DeployEnvironment {
            account: Some("123456789012".to_string()),
            region: Some(region.to_string()),
        })
    }
}

impl EnvironmentSource for FixedEnvironment {
    fn deploy_environment(&self) -> Result<DeployEnvironment> {
        Ok(self.0.clone())
    }
}

// ── Files ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryFiles {
    files: RefCell<BTreeMap<PathBuf, String>>,
}

impl MemoryFiles {
    /// A file set holding the default boot script.
    pub fn with_user_data() -> Self {
        let files = Self::default();
        files.put(&default_user_data_path(), USER_DATA);
        files
    }

    pub fn put(&self, path: &Path, content: &str) {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }
}

impl UserDataSource for MemoryFiles {
    fn read_user_data(&self, path: &Path) -> Result<String> {
        match self.get(path) {
            Some(content) => Ok(content),
            None => anyhow::bail!("No such file or directory"),
        }
    }
}

impl TemplateWriter for MemoryFiles {
    fn write_template(&self, path: &Path, content: &str) -> Result<()> {
        self.put(path, content);
        Ok(())
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub steps: RefCell<Vec<String>>,
    pub successes: RefCell<Vec<String>>,
    pub warnings: RefCell<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.borrow_mut().push(message.to_string());
    }

    fn success(&self, message: &str) {
        self.successes.borrow_mut().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}
