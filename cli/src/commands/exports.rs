//! `ecsbase exports`: list the stack outputs and their export names.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use ecsbase_common::ExportName;

use crate::app::AppContext;
use crate::application::services::synth_service;
use crate::infra::environment::ProcessEnvironment;
use crate::infra::fs::LocalFs;

/// Arguments for the exports command.
#[derive(Args)]
pub struct ExportsArgs {
    /// Show only this export
    #[arg(long, value_enum)]
    pub name: Option<ExportName>,

    /// Hide outputs that are not exported
    #[arg(long)]
    pub exported_only: bool,
}

/// Run the exports command.
///
/// # Errors
///
/// Returns an error if synthesis fails, or if `--name` asks for an export
/// this configuration does not publish.
pub fn run(app: &AppContext, args: &ExportsArgs) -> Result<ExitCode> {
    let synthesis = synth_service::synthesize(
        &app.config_store,
        &ProcessEnvironment,
        &LocalFs,
        &app.reporter(),
    )?;
    let stack = &synthesis.base.stack;

    let outputs: Vec<_> = match args.name {
        Some(name) => {
            let Some(output) = stack.export(name.as_str()) else {
                if name.is_mesh() && !synthesis.config.mesh.enabled {
                    anyhow::bail!("Export {name} is not published: mesh.enabled is false");
                }
                anyhow::bail!("Export {name} is not published by this stack");
            };
            vec![output]
        }
        None => stack
            .outputs()
            .iter()
            .filter(|o| !args.exported_only || o.export_name.is_some())
            .collect(),
    };
    app.renderer().render_exports(&outputs)?;
    Ok(ExitCode::SUCCESS)
}
