//! Configuration schema.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Default GitHub REST endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default GitLab REST endpoint.
pub const DEFAULT_GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Branch that release pull requests target and releases are cut from.
    #[serde(default = "default_target_branch")]
    pub target_branch: String,

    /// Prefix of release branch names (`<prefix>-<version>`).
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Web URL of the project, used for commit links and clones.
    #[serde(default)]
    pub project_url: String,

    /// User name for HTTPS git authentication.
    #[serde(default)]
    pub user_id: String,

    /// Hosting backend.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Files whose version annotations follow the manifest.
    #[serde(default)]
    pub extra_files: Vec<ExtraFileConfig>,

    /// Secondary repositories receiving the same release.
    #[serde(default)]
    pub propagation_targets: Vec<PropagationTarget>,

    /// Tagged-line updates pushed to other repositories on release.
    #[serde(default)]
    pub config_updates: Vec<ConfigUpdate>,

    /// Versioning policy.
    #[serde(default)]
    pub versioning: VersioningConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_branch: default_target_branch(),
            branch_prefix: default_branch_prefix(),
            project_url: String::new(),
            user_id: String::new(),
            provider: ProviderConfig::default(),
            extra_files: Vec::new(),
            propagation_targets: Vec::new(),
            config_updates: Vec::new(),
            versioning: VersioningConfig::default(),
        }
    }
}

impl Config {
    /// Checks values that cannot be expressed through serde defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.target_branch.trim().is_empty() {
            return Err(ConfigError::Invalid("target_branch must not be empty".into()));
        }
        self.provider.validate()?;

        for target in &self.propagation_targets {
            if target.target.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "propagation target must name a repository".into(),
                ));
            }
            if self.provider.kind() == ProviderKind::GitLab && target.target.parse::<u64>().is_err()
            {
                return Err(ConfigError::Invalid(format!(
                    "gitlab propagation target `{}` is not a project id",
                    target.target
                )));
            }
        }

        for update in &self.config_updates {
            if update.search_tag.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "config update search_tag must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

fn default_target_branch() -> String {
    "main".to_string()
}

fn default_branch_prefix() -> String {
    "release".to_string()
}

/// Discriminant of [`ProviderConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// github.com or GitHub Enterprise.
    GitHub,
    /// gitlab.com or self-managed GitLab.
    GitLab,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => write!(f, "github"),
            Self::GitLab => write!(f, "gitlab"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            other => Err(ConfigError::Invalid(format!("unknown provider `{other}`"))),
        }
    }
}

/// Per-backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProviderConfig {
    /// GitHub repository addressed by `owner/name`.
    #[serde(rename = "github")]
    GitHub {
        /// Repository slug, `owner/name`.
        #[serde(default)]
        repository: String,

        /// REST API base URL.
        #[serde(default = "default_github_api_url")]
        api_url: String,
    },

    /// GitLab project addressed by numeric id.
    #[serde(rename = "gitlab")]
    GitLab {
        /// Numeric project id.
        #[serde(default)]
        project_id: u64,

        /// REST API base URL.
        #[serde(default = "default_gitlab_api_url")]
        api_url: String,
    },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::GitHub {
            repository: String::new(),
            api_url: default_github_api_url(),
        }
    }
}

impl ProviderConfig {
    /// Builds an empty configuration of the given kind with default API URL.
    #[must_use]
    pub fn of_kind(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::GitHub => Self::default(),
            ProviderKind::GitLab => Self::GitLab {
                project_id: 0,
                api_url: default_gitlab_api_url(),
            },
        }
    }

    /// Returns the backend kind.
    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::GitHub { .. } => ProviderKind::GitHub,
            Self::GitLab { .. } => ProviderKind::GitLab,
        }
    }

    /// Returns the REST API base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        match self {
            Self::GitHub { api_url, .. } | Self::GitLab { api_url, .. } => api_url,
        }
    }

    /// Replaces the REST API base URL.
    pub fn set_api_url(&mut self, url: impl Into<String>) {
        match self {
            Self::GitHub { api_url, .. } | Self::GitLab { api_url, .. } => *api_url = url.into(),
        }
    }

    /// Checks that the project identifier is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the identifier is missing or malformed.
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Self::GitHub { repository, .. } => {
                let mut parts = repository.split('/');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                        Ok(())
                    }
                    _ => Err(ConfigError::Invalid(format!(
                        "github repository `{repository}` must be `owner/name`"
                    ))),
                }
            }
            Self::GitLab { project_id, .. } => {
                if *project_id == 0 {
                    Err(ConfigError::Invalid("gitlab project_id must be set".into()))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Derives the settings for a config-update job on another repository.
    ///
    /// The API URL is inherited. GitHub jobs take the slug from the last two
    /// path segments of the update's repository URL; GitLab jobs require a
    /// project id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the update does not identify a repository.
    pub fn for_update(&self, update: &ConfigUpdate) -> ConfigResult<Self> {
        let derived = match self {
            Self::GitHub { api_url, .. } => Self::GitHub {
                repository: slug_from_url(&update.repository).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "cannot derive owner/name from `{}`",
                        update.repository
                    ))
                })?,
                api_url: api_url.clone(),
            },
            Self::GitLab { api_url, .. } => Self::GitLab {
                project_id: update.project_id.ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "config update for `{}` needs a project_id",
                        update.repository
                    ))
                })?,
                api_url: api_url.clone(),
            },
        };
        derived.validate()?;
        Ok(derived)
    }
}

fn slug_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    let mut segments = trimmed.rsplit('/');
    let name = segments.next().filter(|s| !s.is_empty())?;
    let owner = segments.next().filter(|s| !s.is_empty() && !s.contains(':'))?;
    Some(format!("{owner}/{name}"))
}

fn default_github_api_url() -> String {
    DEFAULT_GITHUB_API_URL.to_string()
}

fn default_gitlab_api_url() -> String {
    DEFAULT_GITLAB_API_URL.to_string()
}

/// A file outside the manifest carrying version annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFileConfig {
    /// Path relative to the repository root.
    pub path: PathBuf,

    /// Optional human-readable label.
    #[serde(default)]
    pub label: String,
}

/// A secondary repository that receives the same release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationTarget {
    /// `owner/name` on GitHub, numeric project id on GitLab.
    pub target: String,

    /// Branch to tag; empty means the primary base branch.
    #[serde(default)]
    pub target_branch: String,

    /// Free-form note, logged when propagating.
    #[serde(default)]
    pub description: String,
}

impl PropagationTarget {
    /// Returns the branch to release from, falling back to `base`.
    #[must_use]
    pub fn branch_or<'a>(&'a self, base: &'a str) -> &'a str {
        if self.target_branch.is_empty() {
            base
        } else {
            &self.target_branch
        }
    }
}

/// Tagged-line update applied to another repository when a release is cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// Web URL of the repository to update.
    pub repository: String,

    /// GitLab project id of that repository.
    #[serde(default)]
    pub project_id: Option<u64>,

    /// Marker tag, matched as `# x-shipmate:<tag>`.
    pub search_tag: String,

    /// Files to rewrite, relative to the repository root.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Commit classification strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// `type(scope)!: subject` messages.
    #[default]
    Conventional,
    /// Configurable literal prefixes.
    Simple,
}

/// Versioning policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Classification strategy.
    #[serde(default)]
    pub strategy: Strategy,

    /// Display prefix of version strings (e.g. `v`).
    #[serde(default)]
    pub version_prefix: String,

    /// Before 1.0.0, features bump the patch component.
    #[serde(default)]
    pub bump_minor_pre_major: bool,

    /// Before 1.0.0, breaking changes bump the minor component.
    #[serde(default)]
    pub bump_patch_minor_pre_major: bool,

    /// Prefix tables of the simple strategy.
    #[serde(default)]
    pub simple_commit_types: SimpleCommitTypes,
}

/// Literal prefix lists of the simple strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleCommitTypes {
    /// Prefixes marking breaking changes.
    #[serde(default)]
    pub major: Vec<String>,

    /// Prefixes marking features.
    #[serde(default)]
    pub minor: Vec<String>,

    /// Prefixes marking fixes.
    #[serde(default)]
    pub patch: Vec<String>,

    /// Bump the patch component when nothing else matched.
    #[serde(default)]
    pub default_patch: bool,
}
