//! Update-files command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use shipmate_config::ExecutionMode;
use shipmate_core::{UpdateRequest, update_tagged_files};

use super::Global;

/// Arguments for the update-files command.
#[derive(Debug, Args)]
pub struct UpdateFilesArgs {
    /// Marker tag of the lines to rewrite
    #[arg(long)]
    pub tag: String,

    /// Files containing tagged lines
    #[arg(long, required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Branch to commit on
    #[arg(long)]
    pub branch: Option<String>,

    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Runs the update-files command.
pub fn run(global: &Global, args: &UpdateFilesArgs) -> Result<()> {
    let mut ctx = global.context()?;
    ctx.require_token()?;
    let version = ctx.manifest_version()?;
    let provider = ctx.provider()?;

    let request = UpdateRequest {
        tag: &args.tag,
        files: &args.files,
        version: &version,
        branch: args.branch.as_deref(),
        target: &ctx.config.target_branch,
    };
    let outcomes = update_tagged_files(
        provider.as_ref(),
        &request,
        ExecutionMode::from_dry_run(args.dry_run),
    )?;

    for outcome in &outcomes {
        println!("{outcome}");
    }
    Ok(())
}
