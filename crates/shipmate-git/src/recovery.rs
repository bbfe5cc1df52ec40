//! Push with one-shot conflict recovery.

use tracing::{info, warn};

use crate::{GitError, GitResult, Workspace};

/// How a branch reached the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The first push was accepted.
    Pushed,
    /// The remote had diverged; the change was rebuilt on its tip as
    /// `commit` and force-pushed.
    Recovered {
        /// Commit that reached the remote.
        commit: String,
    },
    /// The diverged remote already held the change; nothing was pushed.
    UpToDate,
}

/// Pushes `branch`, recovering once from a diverged remote.
///
/// On [`GitError::PushConflict`] the remote branch is fetched and the local
/// branch hard-reset to it, discarding the local commit. `rebuild` then
/// re-applies the change on the remote tip and commits it, returning the new
/// commit id, or `None` when the remote tip already contains the change.
/// A rebuilt commit is force-pushed once. Any failure during the retry is
/// returned as-is; other push errors are never retried.
///
/// # Errors
///
/// Returns the first non-conflict error, or any error from the retry.
pub fn push_with_recovery<F>(
    workspace: &mut dyn Workspace,
    branch: &str,
    rebuild: F,
) -> GitResult<PushOutcome>
where
    F: FnOnce(&mut dyn Workspace) -> GitResult<Option<String>>,
{
    match workspace.push(branch, false) {
        Ok(()) => Ok(PushOutcome::Pushed),
        Err(GitError::PushConflict { .. }) => {
            warn!(branch, "remote branch diverged, rebuilding on the remote tip");
            workspace.fetch(branch)?;
            workspace.reset_to_remote(branch)?;
            match rebuild(&mut *workspace)? {
                Some(commit) => {
                    workspace.push(branch, true)?;
                    Ok(PushOutcome::Recovered { commit })
                }
                None => {
                    info!(branch, "remote branch already holds the change");
                    Ok(PushOutcome::UpToDate)
                }
            }
        }
        Err(err) => Err(err),
    }
}
