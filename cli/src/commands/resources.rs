//! `ecsbase resources`: list the declared resources.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::synth_service;
use crate::infra::environment::ProcessEnvironment;
use crate::infra::fs::LocalFs;

/// Run the resources command.
///
/// # Errors
///
/// Returns an error if synthesis fails.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let synthesis = synth_service::synthesize(
        &app.config_store,
        &ProcessEnvironment,
        &LocalFs,
        &app.reporter(),
    )?;
    app.renderer()
        .render_resources(synthesis.base.stack.resources())?;
    Ok(ExitCode::SUCCESS)
}
