//! Provider construction from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use shipmate_config::{AccessToken, Config, ConfigUpdate, ProviderConfig};
use shipmate_git::{Credentials, LocalWorkspace};
use shipmate_github::GitHubProvider;
use shipmate_gitlab::GitLabProvider;
use shipmate_provider::{Connection, Provider, ReqwestTransport, Transport, WorkingTree};
use tempfile::TempDir;
use tracing::debug;

use crate::CoreResult;

/// Builds the adapter for `provider`.
///
/// The backend is picked here, once; callers only see [`Provider`].
pub fn build_provider(
    provider: &ProviderConfig,
    connection: Connection,
    transport: Arc<dyn Transport>,
    worktree: Option<WorkingTree>,
) -> Box<dyn Provider> {
    debug!(kind = %provider.kind(), api_url = provider.api_url(), "building provider");
    match provider {
        ProviderConfig::GitHub {
            repository,
            api_url,
        } => {
            let adapter = GitHubProvider::new(repository.clone(), api_url.clone(), connection, transport);
            match worktree {
                Some(tree) => Box::new(adapter.with_worktree(tree)),
                None => Box::new(adapter),
            }
        }
        ProviderConfig::GitLab {
            project_id,
            api_url,
        } => {
            let adapter = GitLabProvider::new(*project_id, api_url.clone(), connection, transport);
            match worktree {
                Some(tree) => Box::new(adapter.with_worktree(tree)),
                None => Box::new(adapter),
            }
        }
    }
}

/// Connection settings of the primary repository.
pub fn connection_for(config: &Config, token: &AccessToken) -> Connection {
    Connection {
        token: token.clone(),
        project_url: config.project_url.clone(),
        propagation_targets: config.propagation_targets.clone(),
    }
}

/// Opens providers for config-update repositories.
pub trait Connector {
    /// Returns a provider for `update` backed by a fresh clone.
    ///
    /// # Errors
    ///
    /// Returns an error if the update does not identify a repository or the
    /// clone fails.
    fn connect(&self, update: &ConfigUpdate) -> CoreResult<Box<dyn Provider>>;
}

/// [`Connector`] cloning over HTTPS into a temporary directory.
///
/// Clones live until the connector is dropped.
pub struct RemoteConnector {
    provider: ProviderConfig,
    token: AccessToken,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    scratch: TempDir,
}

impl RemoteConnector {
    /// Creates a connector sharing the primary provider kind and credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory or HTTP client cannot be created.
    pub fn new(config: &Config, token: &AccessToken) -> CoreResult<Self> {
        Ok(Self {
            provider: config.provider.clone(),
            token: token.clone(),
            credentials: Credentials::new(config.user_id.clone(), token.clone()),
            transport: Arc::new(ReqwestTransport::new()?),
            scratch: TempDir::with_prefix("shipmate-")?,
        })
    }

    fn checkout_dir(&self, update: &ConfigUpdate) -> PathBuf {
        let name: String = update
            .repository
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("repository")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let mut dir = self.scratch.path().join(&name);
        let mut suffix = 1;
        while dir.exists() {
            suffix += 1;
            dir = self.scratch.path().join(format!("{name}-{suffix}"));
        }
        dir
    }
}

impl Connector for RemoteConnector {
    fn connect(&self, update: &ConfigUpdate) -> CoreResult<Box<dyn Provider>> {
        let provider = self.provider.for_update(update)?;
        let dir = self.checkout_dir(update);
        let workspace = LocalWorkspace::clone_into(&update.repository, &dir, self.credentials.clone())?;

        let connection = Connection {
            token: self.token.clone(),
            project_url: update.repository.clone(),
            propagation_targets: Vec::new(),
        };
        Ok(build_provider(
            &provider,
            connection,
            Arc::clone(&self.transport),
            Some(WorkingTree::new(workspace)),
        ))
    }
}
