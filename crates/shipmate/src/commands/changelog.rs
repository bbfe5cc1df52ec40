//! Changelog command.

use anyhow::Result;
use clap::Args;
use shipmate_changelog::render;
use shipmate_versioning::Version;
use tracing::debug;

use super::Global;

/// Arguments for the changelog command.
#[derive(Debug, Args)]
pub struct ChangelogArgs {
    /// Version to list changes since (defaults to the latest release)
    #[arg(long)]
    pub since: Option<String>,
}

/// Runs the changelog command.
pub fn run(global: &Global, args: &ChangelogArgs) -> Result<()> {
    let mut ctx = global.context()?;
    let provider = ctx.provider()?;

    let since = match &args.since {
        Some(since) => Version::parse(since)?.to_string(),
        None => provider.highest_release()?.to_string(),
    };
    debug!(%since, "rendering changelog");

    let commits = provider.commits_since_release(&since)?;
    let changelog = render(&commits, &ctx.config.project_url);
    if changelog.is_empty() {
        println!("No changes since {}", display_since(&since));
    } else {
        print!("{changelog}");
    }
    Ok(())
}

fn display_since(since: &str) -> &str {
    if since.is_empty() { "the beginning" } else { since }
}
