//! Core error types.

use std::fmt::{self, Write};

use shipmate_provider::ProviderError;
use thiserror::Error;

/// Orchestration step, used to tell the operator where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reading commit history.
    History,
    /// Checking whether the current version is released.
    ReleaseCheck,
    /// Creating the release and propagating it.
    Release,
    /// Ensuring the release branch.
    Branch,
    /// Committing the manifest.
    Commit,
    /// Ensuring the release pull request.
    PullRequest,
    /// Updating tagged lines in another repository.
    ConfigUpdate,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::History => "history",
            Self::ReleaseCheck => "release_check",
            Self::Release => "release",
            Self::Branch => "branch",
            Self::Commit => "commit",
            Self::PullRequest => "pull_request",
            Self::ConfigUpdate => "config_update",
        };
        f.write_str(name)
    }
}

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A provider call failed; the run stopped at `step`.
    #[error("{step} step failed: {source}")]
    Step {
        /// Failed step.
        step: Step,
        /// Provider error.
        #[source]
        source: ProviderError,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] shipmate_config::ConfigError),

    /// Manifest or version error.
    #[error("versioning error: {0}")]
    Versioning(#[from] shipmate_versioning::VersioningError),

    /// Local git error.
    #[error("git error: {0}")]
    Git(#[from] shipmate_git::GitError),

    /// Provider setup error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Some config-update jobs failed; the others still ran.
    #[error("{}", update_failures(failures))]
    ConfigUpdates {
        /// Repository URL and error of each failed job.
        failures: Vec<(String, CoreError)>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn update_failures(failures: &[(String, CoreError)]) -> String {
    let mut message = format!("{} config update(s) failed", failures.len());
    for (repository, err) in failures {
        _ = write!(message, "; {repository}: {err}");
    }
    message
}

impl CoreError {
    /// Returns a mapper tagging provider errors with `step`.
    pub fn at(step: Step) -> impl FnOnce(ProviderError) -> Self {
        move |source| Self::Step { step, source }
    }

    /// Returns the failed step, if the error came from one.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Step { step, .. } => Some(*step),
            Self::ConfigUpdates { .. } => Some(Step::ConfigUpdate),
            _ => None,
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_names_step() {
        let err = CoreError::at(Step::PullRequest)(ProviderError::NoWorkingTree);
        assert_eq!(
            err.to_string(),
            "pull_request step failed: no local working tree configured for commits"
        );
        assert_eq!(err.step(), Some(Step::PullRequest));
    }

    #[test]
    fn test_config_updates_lists_repositories() {
        let err = CoreError::ConfigUpdates {
            failures: vec![(
                "https://github.com/acme/deploy".into(),
                CoreError::at(Step::Commit)(ProviderError::NoWorkingTree),
            )],
        };
        let message = err.to_string();
        assert!(message.starts_with("1 config update(s) failed"));
        assert!(message.contains("acme/deploy: commit step failed"));
    }
}
