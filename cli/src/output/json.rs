//! JSON output helpers.
//!
//! Provides the renderer behind `--json` and the error-object formatter used
//! by all `--json` code paths when a command fails.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::domain::config::StackConfig;
use crate::domain::error::{CidrError, ConfigError, SynthError};
use crate::domain::stack::{Output, Resource};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable `code` for the JSON error object, from the root domain error.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<SynthError>().is_some() {
        "SYNTH_ERROR"
    } else if err.downcast_ref::<CidrError>().is_some() {
        "INVALID_CIDR"
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "INVALID_CONFIG"
    } else {
        "ERROR"
    }
}

fn print(value: &serde_json::Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Machine-readable renderer. Every method prints one JSON document.
pub struct JsonRenderer;

impl JsonRenderer {
    /// `[{"logical_id", "type", "path"}]`
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_resources(&self, resources: &[Resource]) -> Result<()> {
        let rows: Vec<_> = resources
            .iter()
            .map(|r| {
                json!({
                    "logical_id": r.logical_id,
                    "type": r.kind,
                    "path": r.path,
                })
            })
            .collect();
        print(&json!(rows))
    }

    /// `[{"output", "export", "value"}]`; `value` is the template fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_exports(&self, outputs: &[&Output]) -> Result<()> {
        let rows: Vec<_> = outputs
            .iter()
            .map(|o| {
                json!({
                    "output": o.logical_id,
                    "export": o.export_name,
                    "value": o.value,
                })
            })
            .collect();
        print(&json!(rows))
    }

    /// `{"path", "config"}`
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &StackConfig, path: &Path) -> Result<()> {
        print(&json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// `{"version"}`
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }
}
