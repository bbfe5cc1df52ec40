//! Initialize command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use shipmate_config::{AccessToken, write_default_config};
use shipmate_git::{Credentials, LocalWorkspace, Workspace};
use shipmate_versioning::ReleaseManifest;
use tracing::info;

use super::Global;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Runs the init command.
pub fn run(global: &Global, args: &InitArgs) -> Result<()> {
    let root = repository_root()?;

    match write_default_config(&root, args.force)? {
        Some(path) => println!("Created {}", path.display()),
        None => println!("Configuration already exists, use --force to overwrite"),
    }

    let config = global.load_config()?;
    let prefix = &config.versioning.version_prefix;
    match ReleaseManifest::initialize(&root, prefix)? {
        Some(manifest) => {
            info!(version = %manifest.version, "initialized release manifest");
            println!(
                "Created {} at version {}",
                ReleaseManifest::path_in(&root).display(),
                manifest.version
            );
        }
        None => println!("Release manifest already exists"),
    }

    Ok(())
}

/// Top of the enclosing git repository, or the current directory outside one.
fn repository_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let credentials = Credentials::new(String::new(), AccessToken::default());
    Ok(LocalWorkspace::open(&cwd, credentials)
        .map_or(cwd, |workspace| workspace.root().to_path_buf()))
}
