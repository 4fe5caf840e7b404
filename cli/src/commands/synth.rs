//! `ecsbase synth`: print or write the CloudFormation template.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter as _;
use crate::application::services::synth_service::{self, TemplateFormat};
use crate::infra::environment::ProcessEnvironment;
use crate::infra::fs::LocalFs;

/// Template serialization.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Yaml,
}

impl From<FormatArg> for TemplateFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => TemplateFormat::Json,
            FormatArg::Yaml => TemplateFormat::Yaml,
        }
    }
}

/// Arguments for the synth command.
#[derive(Args)]
pub struct SynthArgs {
    /// Template format
    #[arg(long, value_enum, default_value_t)]
    pub format: FormatArg,

    /// Write `<stack>.template.<ext>` into this directory instead of stdout
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

/// Run the synth command.
///
/// # Errors
///
/// Returns an error if synthesis fails or the template cannot be written.
pub fn run(app: &AppContext, args: &SynthArgs) -> Result<ExitCode> {
    let reporter = app.reporter();
    let synthesis = synth_service::synthesize(
        &app.config_store,
        &ProcessEnvironment,
        &LocalFs,
        &reporter,
    )?;
    let format = TemplateFormat::from(args.format);
    let body = synth_service::render(&synthesis.template, format)?;

    match &args.out {
        Some(dir) => {
            let path = synth_service::write(
                &LocalFs,
                dir,
                &synthesis.config.stack.name,
                format,
                &body,
            )?;
            reporter.success(&format!(
                "Wrote {} ({} resources)",
                path.display(),
                synthesis.template.resources.len()
            ));
        }
        None => print!("{body}"),
    }
    Ok(ExitCode::SUCCESS)
}
