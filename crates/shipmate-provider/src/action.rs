//! Remote mutations and their outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use shipmate_config::ExecutionMode;
use tracing::info;

use crate::ProviderResult;

/// A mutation a provider performs or, in dry-run mode, would perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Create a branch from another branch's tip.
    CreateBranch {
        /// Repository identifier.
        repository: String,
        /// New branch.
        branch: String,
        /// Branch it starts from.
        from: String,
    },
    /// Commit and push local edits.
    Commit {
        /// Branch committed on.
        branch: String,
        /// Commit message.
        message: String,
        /// Changed files, relative to the repository root.
        files: Vec<PathBuf>,
    },
    /// Open a pull/merge request.
    CreatePullRequest {
        /// Source branch.
        source: String,
        /// Target branch.
        target: String,
        /// Title.
        title: String,
    },
    /// Refresh the title and body of an open request.
    UpdatePullRequest {
        /// Request number (GitHub) or iid (GitLab).
        number: u64,
        /// Source branch.
        source: String,
        /// Title.
        title: String,
    },
    /// Close a stale release request.
    ClosePullRequest {
        /// Request number.
        number: u64,
        /// Source branch.
        source: String,
    },
    /// Delete a branch.
    DeleteBranch {
        /// Branch name.
        branch: String,
    },
    /// Tag and publish a release.
    CreateRelease {
        /// Repository identifier.
        repository: String,
        /// Tag name.
        tag: String,
        /// Branch the tag points at.
        target: String,
    },
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateBranch {
                repository,
                branch,
                from,
            } => write!(f, "create branch `{branch}` from `{from}` in {repository}"),
            Self::Commit { branch, files, .. } => {
                write!(f, "commit {} file(s) to `{branch}`", files.len())
            }
            Self::CreatePullRequest {
                source,
                target,
                title,
            } => write!(f, "open request \"{title}\" ({source} -> {target})"),
            Self::UpdatePullRequest { number, title, .. } => {
                write!(f, "update request #{number} to \"{title}\"")
            }
            Self::ClosePullRequest { number, source } => {
                write!(f, "close stale request #{number} ({source})")
            }
            Self::DeleteBranch { branch } => write!(f, "delete branch `{branch}`"),
            Self::CreateRelease {
                repository,
                tag,
                target,
            } => write!(f, "release {tag} from `{target}` in {repository}"),
        }
    }
}

/// What a provider call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// The remote already had the desired state.
    Unchanged,
    /// The mutation was performed.
    Applied(PlannedAction),
    /// Dry run: the mutation would have been performed.
    Planned(PlannedAction),
}

impl Outcome {
    /// Returns the action, if any.
    #[must_use]
    pub fn action(&self) -> Option<&PlannedAction> {
        match self {
            Self::Unchanged => None,
            Self::Applied(action) | Self::Planned(action) => Some(action),
        }
    }

    /// Returns true if the remote was changed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Applied(action) => write!(f, "{action}"),
            Self::Planned(action) => write!(f, "would {action}"),
        }
    }
}

/// Runs `perform` unless `mode` is dry-run.
///
/// Every remote mutation goes through here.
///
/// # Errors
///
/// Returns the error from `perform`.
pub fn execute<F>(mode: ExecutionMode, action: PlannedAction, perform: F) -> ProviderResult<Outcome>
where
    F: FnOnce() -> ProviderResult<()>,
{
    if mode.is_dry_run() {
        info!(%action, "dry run: skipping");
        return Ok(Outcome::Planned(action));
    }

    perform()?;
    info!(%action, "done");
    Ok(Outcome::Applied(action))
}
