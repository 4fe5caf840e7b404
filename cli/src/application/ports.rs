//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::config::StackConfig;
use crate::domain::stack::DeployEnvironment;

// ── Configuration Ports ───────────────────────────────────────────────────────

/// Abstracts persistence of the project configuration file.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when no file exists.
    fn load(&self) -> Result<StackConfig>;
    /// Persist the configuration.
    fn save(&self, config: &StackConfig) -> Result<()>;
    /// Path of the configuration file (which may not exist yet).
    fn path(&self) -> Result<PathBuf>;
}

/// Abstracts where the account and region come from.
pub trait EnvironmentSource {
    /// The target environment; unset fields leave the stack environment-agnostic.
    fn deploy_environment(&self) -> Result<DeployEnvironment>;
}

// ── Filesystem Ports ──────────────────────────────────────────────────────────

/// Reads the bastion boot script.
pub trait UserDataSource {
    /// Read the script verbatim.
    fn read_user_data(&self, path: &Path) -> Result<String>;
}

/// Writes synthesized templates.
pub trait TemplateWriter {
    /// Write `content` to `path` so that readers never observe a partial file.
    fn write_template(&self, path: &Path, content: &str) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
