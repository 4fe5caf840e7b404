//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::domain::config::StackConfig;
use crate::domain::stack::{Output, Resource};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("ecsbase {version}");
    }

    /// Render one line per declared resource: logical ID, type, construct path.
    pub fn render_resources(&self, resources: &[Resource]) {
        let width = resources
            .iter()
            .map(|r| r.logical_id.as_str().len())
            .max()
            .unwrap_or(0);
        let kind_width = resources.iter().map(|r| r.kind.len()).max().unwrap_or(0);
        for r in resources {
            println!(
                "{}  {}  {}",
                format!("{:<width$}", r.logical_id.as_str()).style(self.ctx.styles.identifier),
                format!("{:<kind_width$}", r.kind),
                r.path.style(self.ctx.styles.dim),
            );
        }
        if !self.ctx.quiet {
            println!();
            self.ctx.info(&format!("{} resources", resources.len()));
        }
    }

    /// Render the outputs: output ID, export name (or `-`), value expression.
    pub fn render_exports(&self, outputs: &[&Output]) {
        let width = outputs
            .iter()
            .map(|o| o.logical_id.as_str().len())
            .max()
            .unwrap_or(0);
        let export_width = outputs
            .iter()
            .map(|o| o.export_name.as_deref().map_or(1, str::len))
            .max()
            .unwrap_or(0);
        for o in outputs {
            println!(
                "{}  {}  {}",
                format!("{:<width$}", o.logical_id.as_str()),
                format!("{:<export_width$}", o.export_name.as_deref().unwrap_or("-"))
                    .style(self.ctx.styles.identifier),
                o.value,
            );
        }
    }

    /// Render the effective configuration.
    pub fn render_config(&self, config: &StackConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        let rows = [
            ("stack.name:", config.stack.name.clone()),
            ("network.cidr:", config.network.cidr.clone()),
            ("network.max_azs:", config.network.max_azs.to_string()),
            ("cluster.name:", config.cluster.name.clone()),
            ("mesh.enabled:", config.mesh.enabled.to_string()),
            ("mesh.tracing:", config.mesh.tracing.to_string()),
            ("bastion.instance_type:", config.bastion.instance_type.clone()),
            ("bastion.user_data:", config.bastion.user_data.clone()),
        ];
        for (key, value) in rows {
            println!("  {key:<24} {value}");
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["ECSBASE_CONFIG", "AWS_ACCOUNT_ID", "AWS_DEFAULT_REGION", "NO_COLOR"] {
            println!(
                "    {:<22} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}
