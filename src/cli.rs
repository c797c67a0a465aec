//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::vars::parse_var;
use crate::model::DesiredState;

/// Top-level CLI entry point for the quadlet deployment engine.
#[derive(Parser, Debug)]
#[command(
    name = "quadlet-app",
    about = "Deploy podman quadlet applications as namespaced systemd services",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Print results and failures as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Settings file (default: /etc/quadlet-app/config.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append a debug-level log to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy an application and bring it to the desired state
    Deploy(DeployOpts),
    /// Check the structure of an application source tree
    Validate(SourceOpts),
    /// Print the files a deployment would write
    Render(RenderOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Source tree and application name.
#[derive(Args, Debug, Clone)]
pub struct SourceOpts {
    /// Application source directory
    #[arg(value_name = "SRC")]
    pub src: PathBuf,

    /// Application name (default: basename of SRC, lowercased)
    #[arg(long)]
    pub name: Option<String>,
}

/// Deployment roots overriding the settings file.
#[derive(Args, Debug, Clone, Default)]
pub struct PathOpts {
    /// Directory quadlet units are written to
    #[arg(long, value_name = "DIR")]
    pub unit_dir: Option<PathBuf>,

    /// Parent directory of per-application init/config data
    #[arg(long, value_name = "DIR")]
    pub app_base: Option<PathBuf>,
}

/// Template variable sources.
#[derive(Args, Debug, Clone, Default)]
pub struct VarOpts {
    /// Template variable, repeatable; overrides --vars-file
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Flat TOML table of template variables
    #[arg(long, value_name = "PATH")]
    pub vars_file: Option<PathBuf>,
}

/// Options for the `deploy` subcommand.
#[derive(Args, Debug, Clone)]
pub struct DeployOpts {
    /// Source tree and name.
    #[command(flatten)]
    pub source: SourceOpts,

    /// Desired end state
    #[arg(long, value_enum, default_value_t = DesiredState::Installed)]
    pub state: DesiredState,

    /// Treat every file as changed
    #[arg(long)]
    pub force: bool,

    /// Seconds allowed for daemon-reload, start and restart
    #[arg(long, value_name = "SECS")]
    pub systemctl_timeout: Option<u64>,

    /// Deployment roots.
    #[command(flatten)]
    pub paths: PathOpts,

    /// Template variables.
    #[command(flatten)]
    pub vars: VarOpts,
}

/// Options for the `render` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RenderOpts {
    /// Source tree and name.
    #[command(flatten)]
    pub source: SourceOpts,

    /// Deployment roots.
    #[command(flatten)]
    pub paths: PathOpts,

    /// Template variables.
    #[command(flatten)]
    pub vars: VarOpts,
}

/// Options for the `completions` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
