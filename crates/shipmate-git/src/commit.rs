//! Release commits: apply edits, then commit and push.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::annotations::{update_annotated_file, update_tagged_file};
use crate::{GitError, GitResult, PushOutcome, Workspace, push_with_recovery};

/// A file modification, with the path relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the whole file.
    Write {
        /// File path.
        path: PathBuf,
        /// New content.
        contents: String,
    },
    /// Rewrite line and block version markers.
    Annotations {
        /// File path.
        path: PathBuf,
        /// Version literal to write.
        version: String,
    },
    /// Rewrite `# x-shipmate:<tag>` lines.
    TaggedLines {
        /// File path.
        path: PathBuf,
        /// Marker tag.
        tag: String,
        /// Version literal to write.
        version: String,
    },
}

impl Edit {
    /// Returns the edited path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Write { path, .. }
            | Self::Annotations { path, .. }
            | Self::TaggedLines { path, .. } => path,
        }
    }
}

/// Edits applied and staged on a branch, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommit {
    /// Branch the edits were applied on.
    pub branch: String,
    /// Staged paths.
    pub paths: Vec<PathBuf>,
    /// Edits, kept to replay them on a diverged remote.
    pub edits: Vec<Edit>,
}

/// A commit that reached the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedCommit {
    /// Branch pushed.
    pub branch: String,
    /// Id of the commit now at the remote tip.
    pub commit: String,
    /// Whether conflict recovery was needed.
    pub push: PushOutcome,
}

/// Checks out `branch`, applies `edits` and stages them.
///
/// The remote branch is fetched first when it exists, so a new local
/// branch starts from the remote tip.
///
/// # Errors
///
/// Returns an error if checkout fails, an edited file is missing, or
/// staging fails.
pub fn prepare(workspace: &mut dyn Workspace, branch: &str, edits: &[Edit]) -> GitResult<PreparedCommit> {
    if let Err(err) = workspace.fetch(branch) {
        debug!(branch, error = %err, "remote branch not fetched");
    }
    workspace.checkout_branch(branch)?;
    let paths = apply_and_stage(workspace, edits)?;

    Ok(PreparedCommit {
        branch: branch.to_string(),
        paths,
        edits: edits.to_vec(),
    })
}

fn apply_and_stage(workspace: &mut dyn Workspace, edits: &[Edit]) -> GitResult<Vec<PathBuf>> {
    let root = workspace.root().to_path_buf();
    let mut paths = Vec::with_capacity(edits.len());

    for edit in edits {
        let absolute = root.join(edit.path());
        match edit {
            Edit::Write { contents, .. } => {
                std::fs::write(&absolute, contents)?;
            }
            Edit::Annotations { version, .. } => {
                let changed = update_annotated_file(&absolute, version)?;
                debug!(path = ?edit.path(), changed, "rewrote version annotations");
            }
            Edit::TaggedLines { tag, version, .. } => {
                let changed = update_tagged_file(&absolute, tag, version)?;
                debug!(path = ?edit.path(), tag, changed, "rewrote tagged lines");
            }
        }
        paths.push(edit.path().clone());
    }

    workspace.stage(&paths)?;
    Ok(paths)
}

/// Commits a prepared change set and pushes it.
///
/// Returns `None` when the remote branch already holds the change: the
/// staged tree equals HEAD and HEAD is the fetched remote tip, or the
/// remote diverged to a tip that already contains it.
///
/// # Errors
///
/// Returns an error if the commit fails or the push fails after recovery.
pub fn publish(
    workspace: &mut dyn Workspace,
    prepared: &PreparedCommit,
    message: &str,
) -> GitResult<Option<PublishedCommit>> {
    let branch = prepared.branch.as_str();
    if prepared.paths.is_empty() {
        return Err(GitError::NothingToCommit(branch.to_string()));
    }

    let local = match workspace.commit(message)? {
        Some(commit) => commit,
        None => {
            let head = workspace.head_commit()?;
            if workspace.remote_commit(branch)?.as_deref() == Some(head.as_str()) {
                info!(branch, commit = %head, "release commit already on remote");
                return Ok(None);
            }
            debug!(branch, commit = %head, "pushing earlier unpublished commit");
            head
        }
    };

    let push = push_with_recovery(workspace, branch, |workspace| {
        apply_and_stage(workspace, &prepared.edits)?;
        workspace.commit(message)
    })?;
    let commit = match &push {
        PushOutcome::Pushed => local,
        PushOutcome::Recovered { commit } => commit.clone(),
        PushOutcome::UpToDate => return Ok(None),
    };
    info!(branch, %commit, ?push, "published release commit");

    Ok(Some(PublishedCommit {
        branch: branch.to_string(),
        commit,
        push,
    }))
}
