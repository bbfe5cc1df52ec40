//! Release command.

use anyhow::{Result, bail};
use clap::Args;
use shipmate_changelog::render;
use shipmate_config::ExecutionMode;
use shipmate_versioning::VersionDecision;
use tracing::info;

use super::Global;

/// Arguments for the release command.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Release notes (defaults to the changelog since the previous release)
    #[arg(long)]
    pub description: Option<String>,

    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Runs the release command.
pub fn run(global: &Global, args: &ReleaseArgs) -> Result<()> {
    let mut ctx = global.context()?;
    ctx.require_token()?;
    let version = ctx.manifest_version()?;
    if version.is_zero() {
        bail!("the release manifest holds no version to release");
    }
    let provider = ctx.provider()?;

    let description = match &args.description {
        Some(text) => text.clone(),
        None => {
            let previous = provider.highest_release()?;
            render(
                &provider.commits_since_release(&previous.to_string())?,
                &ctx.config.project_url,
            )
        }
    };

    info!(%version, "creating release");
    let decision = VersionDecision::unchanged(version);
    let outcomes = provider.create_release(
        &ctx.config.target_branch,
        &decision,
        &description,
        ExecutionMode::from_dry_run(args.dry_run),
    )?;

    for outcome in &outcomes {
        println!("{outcome}");
    }
    Ok(())
}
