//! The provider capability.

use std::path::PathBuf;

use shipmate_commit::RawCommit;
use shipmate_config::{AccessToken, ExecutionMode, ExtraFileConfig, PropagationTarget};
use shipmate_versioning::{ReleaseManifest, Version, VersionDecision};
use tracing::{error, info};

use crate::{Outcome, ProviderError, ProviderResult};

/// Connection settings shared by every adapter.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    /// API token.
    pub token: AccessToken,
    /// Web URL of the project, used for changelog links.
    pub project_url: String,
    /// Repositories that receive the same release.
    pub propagation_targets: Vec<PropagationTarget>,
}

/// Result of [`Provider::check_or_create_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredBranch {
    /// Branch name.
    pub name: String,
    /// Whether it was created.
    pub outcome: Outcome,
}

/// Operations the release orchestrator needs from a hosting backend.
///
/// Mutating operations take an [`ExecutionMode`]; in dry-run mode they
/// perform reads only and return [`Outcome::Planned`].
pub trait Provider {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Ensures the release branch for `version` exists, creating it from
    /// the tip of `base` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch lookup or creation fails.
    fn check_or_create_branch(
        &self,
        base: &str,
        version: &Version,
        prefix: &str,
        mode: ExecutionMode,
    ) -> ProviderResult<EnsuredBranch>;

    /// Commits the manifest and annotated extra files to `branch`.
    ///
    /// A diverged remote branch is recovered from once.
    ///
    /// # Errors
    ///
    /// Returns an error if no working tree is configured, an extra file is
    /// missing, or the push fails after recovery.
    fn commit_manifest(
        &self,
        branch: &str,
        manifest: &ReleaseManifest,
        decision: &VersionDecision,
        extra_files: &[ExtraFileConfig],
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome>;

    /// Ensures exactly one open release request from `source` into `target`
    /// and closes stale release requests.
    ///
    /// # Errors
    ///
    /// Returns an error if any request call fails.
    fn check_create_release_pull_request(
        &self,
        source: &str,
        target: &str,
        decision: &VersionDecision,
        mode: ExecutionMode,
    ) -> ProviderResult<Vec<Outcome>>;

    /// Tags and publishes the current version, then the same tag in every
    /// propagation target.
    ///
    /// # Errors
    ///
    /// Returns the primary failure directly. Target failures are collected
    /// into [`ProviderError::Propagation`] after every target was tried.
    fn create_release(
        &self,
        base: &str,
        decision: &VersionDecision,
        description: &str,
        mode: ExecutionMode,
    ) -> ProviderResult<Vec<Outcome>>;

    /// Returns true if a tag named after the current version exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag listing fails.
    fn check_release(&self, decision: &VersionDecision) -> ProviderResult<bool>;

    /// Returns commits after the commit `tag` points at, newest first.
    ///
    /// An empty or zero tag, or one that does not exist, yields the full history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    fn commits_since_release(&self, tag: &str) -> ProviderResult<Vec<RawCommit>>;

    /// Returns the highest version among tags, or zero without any.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag listing fails.
    fn highest_release(&self) -> ProviderResult<Version>;

    /// Rewrites `# x-shipmate:<tag>` lines in `files` and commits them on `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if no working tree is configured, a file is missing,
    /// or the push fails after recovery.
    fn commit_tagged_lines(
        &self,
        branch: &str,
        tag: &str,
        version: &Version,
        files: &[PathBuf],
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome>;

    /// Ensures an open request for a tagged-line update. Stale release
    /// requests are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if any request call fails.
    fn check_create_file_pull_request(
        &self,
        source: &str,
        target: &str,
        tag: &str,
        version: &Version,
        mode: ExecutionMode,
    ) -> ProviderResult<Vec<Outcome>>;
}

/// Runs `release` for every target, collecting failures.
///
/// `completed` holds outcomes already produced for the primary repository.
///
/// # Errors
///
/// Returns [`ProviderError::Propagation`] if any target failed.
pub fn propagate<F>(
    mut completed: Vec<Outcome>,
    targets: &[PropagationTarget],
    base: &str,
    mut release: F,
) -> ProviderResult<Vec<Outcome>>
where
    F: FnMut(&PropagationTarget, &str) -> ProviderResult<Outcome>,
{
    let mut failures = Vec::new();

    for target in targets {
        let branch = target.branch_or(base);
        info!(target = %target.target, branch, description = %target.description, "propagating release");
        match release(target, branch) {
            Ok(outcome) => completed.push(outcome),
            Err(err) => {
                error!(target = %target.target, error = %err, "propagation failed");
                failures.push((target.target.clone(), err));
            }
        }
    }

    if failures.is_empty() {
        Ok(completed)
    } else {
        Err(ProviderError::Propagation {
            completed,
            failures,
        })
    }
}
