//! CLI commands.

pub mod changelog;
pub mod init;
pub mod release;
pub mod update;
pub mod update_files;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use shipmate_config::{
    AccessToken, Config, ConfigError, ProviderConfig, find_and_load_config, load_config,
};
use shipmate_core::{build_provider, connection_for};
use shipmate_git::{Credentials, LocalWorkspace, Workspace};
use shipmate_provider::{Provider, ReqwestTransport, WorkingTree};
use shipmate_versioning::{ReleaseManifest, Version, VersioningError};
use tracing::{debug, warn};

use crate::cli::ConnectionArgs;

/// Options shared by every command.
#[derive(Debug)]
pub struct Global {
    pub config: Option<PathBuf>,
    pub connection: ConnectionArgs,
}

impl Global {
    /// Loads the configuration and applies connection flags.
    ///
    /// Without `-C` a missing configuration file falls back to defaults.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => match find_and_load_config() {
                Ok(config) => config,
                Err(ConfigError::NotFound(_)) => {
                    debug!("no configuration file found, using defaults");
                    Config::default()
                }
                Err(err) => return Err(err.into()),
            },
        };
        self.apply_overrides(&mut config)?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        let args = &self.connection;

        if let Some(kind) = args.provider
            && kind != config.provider.kind()
        {
            config.provider = ProviderConfig::of_kind(kind);
        }
        if let Some(url) = &args.api_url {
            config.provider.set_api_url(url.clone());
        }
        match &mut config.provider {
            ProviderConfig::GitHub { repository, .. } => {
                if args.project_id.is_some() {
                    bail!("--project-id only applies to the gitlab provider");
                }
                if let Some(slug) = &args.repository {
                    repository.clone_from(slug);
                }
            }
            ProviderConfig::GitLab { project_id, .. } => {
                if args.repository.is_some() {
                    bail!("--repository only applies to the github provider");
                }
                if let Some(id) = args.project_id {
                    *project_id = id;
                }
            }
        }
        if let Some(url) = &args.project_url {
            config.project_url.clone_from(url);
        }
        if let Some(user) = &args.user_id {
            config.user_id.clone_from(user);
        }
        if let Some(branch) = &args.target_branch {
            config.target_branch.clone_from(branch);
        }
        Ok(())
    }

    /// Builds the context for commands talking to the hosting provider.
    pub fn context(&self) -> Result<Context> {
        let config = self.load_config()?;
        config.validate().context("invalid configuration")?;

        let token = self
            .connection
            .token
            .as_deref()
            .map(AccessToken::new)
            .unwrap_or_default();
        let credentials = Credentials::new(config.user_id.clone(), token.clone());
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let workspace = LocalWorkspace::open(&cwd, credentials)
            .context("shipmate must run inside a git repository")?;

        Ok(Context {
            root: workspace.root().to_path_buf(),
            workspace: Some(workspace),
            config,
            token,
        })
    }
}

/// Loaded configuration and local repository.
pub struct Context {
    pub config: Config,
    pub root: PathBuf,
    token: AccessToken,
    workspace: Option<LocalWorkspace>,
}

impl Context {
    /// Returns the token, failing if none was given.
    pub fn require_token(&self) -> Result<&AccessToken> {
        if self.token.is_empty() {
            bail!("an API token is required; pass --token or set SHIPMATE_TOKEN");
        }
        Ok(&self.token)
    }

    /// Builds the configured provider, committing through the local repository.
    pub fn provider(&mut self) -> Result<Box<dyn Provider>> {
        let transport = Arc::new(ReqwestTransport::new()?);
        let worktree = self.workspace.take().map(WorkingTree::new);
        Ok(build_provider(
            &self.config.provider,
            connection_for(&self.config, &self.token),
            transport,
            worktree,
        ))
    }

    /// Reads the manifest version.
    pub fn manifest_version(&self) -> Result<Version> {
        read_manifest_version(&self.root, &self.config.versioning.version_prefix)
    }
}

/// Reads the manifest under `root`, falling back to the zero version.
fn read_manifest_version(root: &Path, prefix: &str) -> Result<Version> {
    match ReleaseManifest::read_from(root) {
        Ok(manifest) => Ok(manifest.version),
        Err(VersioningError::ManifestMissing(path)) => {
            warn!(?path, "no release manifest, assuming zero version");
            Ok(Version::zero(prefix))
        }
        Err(err) => Err(err.into()),
    }
}
