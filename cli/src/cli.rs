//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::infra::config::DEFAULT_CONFIG_FILE;

/// Synthesize the ECS workshop base stack: VPC, ECS cluster and App Mesh gateway
#[derive(Parser)]
#[command(
    name = "ecsbase",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Project configuration file
    #[arg(long, global = true, env = "ECSBASE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Synthesize the CloudFormation template
    Synth(commands::synth::SynthArgs),

    /// List declared resources
    Resources,

    /// List stack outputs and their export names
    Exports(commands::exports::ExportsArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            config,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            no_color,
            quiet,
            json,
            config,
        });
        match command {
            Command::Synth(args) => commands::synth::run(&app, &args),
            Command::Resources => commands::resources::run(&app),
            Command::Exports(args) => commands::exports::run(&app, &args),
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
