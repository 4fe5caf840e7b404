//! Application service: synthesize the base stack into a template.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{
    ConfigStore, EnvironmentSource, ProgressReporter, TemplateWriter, UserDataSource,
};
use crate::application::services::config_service;
use crate::domain::compose::{BaseStack, compose_base_stack};
use crate::domain::config::StackConfig;
use crate::domain::stack::Template;

/// Serialization of the synthesized template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

impl TemplateFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            TemplateFormat::Json => "json",
            TemplateFormat::Yaml => "yaml",
        }
    }
}

/// Result of one synthesis pass.
#[derive(Debug)]
pub struct Synthesis {
    pub config: StackConfig,
    pub base: BaseStack,
    pub template: Template,
}

/// Load config, environment and boot script, then compose the stack.
///
/// # Errors
///
/// Returns an error if any input cannot be loaded, if a configured value is
/// out of range, or if composing the stack fails (bad CIDR, construct-tree invariant violation).
pub fn synthesize(
    store: &impl ConfigStore,
    environment: &impl EnvironmentSource,
    user_data: &impl UserDataSource,
    reporter: &impl ProgressReporter,
) -> Result<Synthesis> {
    let config = store.load()?;
    config.validate().with_context(|| match store.path() {
        Ok(path) => format!("invalid configuration in {}", path.display()),
        Err(_) => "invalid configuration".to_string(),
    })?;
    let env = environment.deploy_environment()?;
    if env.region.is_none() {
        reporter.warn("AWS_DEFAULT_REGION not set; synthesizing an environment-agnostic stack");
    }

    let script_path = config_service::user_data_path(store, &config)?;
    let script = user_data
        .read_user_data(&script_path)
        .with_context(|| format!("cannot read user data {}", script_path.display()))?;

    reporter.step(&format!("Composing stack {}", config.stack.name));
    let base = compose_base_stack(&config, env, &script)?;
    let template = base.stack.to_template();
    tracing::info!(
        stack = %config.stack.name,
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "synthesis complete"
    );
    Ok(Synthesis {
        config,
        base,
        template,
    })
}

/// Render a template in the requested format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(template: &Template, format: TemplateFormat) -> Result<String> {
    match format {
        TemplateFormat::Json => {
            let mut body =
                serde_json::to_string_pretty(template).context("JSON serialization failed")?;
            body.push('\n');
            Ok(body)
        }
        TemplateFormat::Yaml => {
            serde_yaml::to_string(template).context("YAML serialization failed")
        }
    }
}

/// `<stack>.template.<ext>`
#[must_use]
pub fn template_file_name(stack_name: &str, format: TemplateFormat) -> String {
    format!("{stack_name}.template.{}", format.extension())
}

/// Write a rendered template into `dir`, returning the file path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write(
    writer: &impl TemplateWriter,
    dir: &Path,
    stack_name: &str,
    format: TemplateFormat,
    body: &str,
) -> Result<PathBuf> {
    let path = dir.join(template_file_name(stack_name, format));
    writer.write_template(&path, body)?;
    Ok(path)
}
