//! CLI definition.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use shipmate_config::ProviderKind;

use crate::commands;

/// Semantic release automation for GitHub and GitLab repositories.
#[derive(Debug, Parser)]
#[command(name = "shipmate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short = 'C', long, global = true, env = "SHIPMATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the configured connection.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// API token
    #[arg(long, global = true, env = "SHIPMATE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Hosting provider (github or gitlab)
    #[arg(long, global = true, env = "SHIPMATE_PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// REST API base URL
    #[arg(long, global = true, env = "SHIPMATE_API_URL")]
    pub api_url: Option<String>,

    /// Web URL of the project
    #[arg(long, global = true, env = "SHIPMATE_PROJECT_URL")]
    pub project_url: Option<String>,

    /// GitLab project id
    #[arg(long, global = true, env = "SHIPMATE_PROJECT_ID")]
    pub project_id: Option<u64>,

    /// GitHub repository (owner/name)
    #[arg(long, global = true, env = "SHIPMATE_REPOSITORY")]
    pub repository: Option<String>,

    /// User name for git over HTTPS
    #[arg(long, global = true, env = "SHIPMATE_USER_ID")]
    pub user_id: Option<String>,

    /// Branch releases target
    #[arg(long, global = true, env = "SHIPMATE_TARGET_BRANCH")]
    pub target_branch: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the release manifest and a default configuration
    Init(commands::init::InitArgs),

    /// Compute the next version and prepare its release branch and pull request
    Update(commands::update::UpdateArgs),

    /// Print the changelog since a release
    Changelog(commands::changelog::ChangelogArgs),

    /// Update tagged lines in files and open a pull request
    UpdateFiles(commands::update_files::UpdateFilesArgs),

    /// Publish a release for the manifest version
    Release(commands::release::ReleaseArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        let global = commands::Global {
            config: self.config,
            connection: self.connection,
        };
        match self.command {
            Commands::Init(args) => commands::init::run(&global, &args),
            Commands::Update(args) => commands::update::run(&global, &args),
            Commands::Changelog(args) => commands::changelog::run(&global, &args),
            Commands::UpdateFiles(args) => commands::update_files::run(&global, &args),
            Commands::Release(args) => commands::release::run(&global, &args),
        }
    }
}
