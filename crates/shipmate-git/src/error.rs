//! Git error types.

use std::path::PathBuf;

use thiserror::Error;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(PathBuf),

    /// Bare repositories have no working tree to commit from.
    #[error("repository has no working tree: {0}")]
    NoWorkdir(PathBuf),

    /// A file to rewrite does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// A commit was requested with no staged edits.
    #[error("nothing to commit on `{0}`")]
    NothingToCommit(String),

    /// The remote branch has diverged from the local one.
    #[error("push of `{branch}` rejected: remote branch has diverged")]
    PushConflict {
        /// Branch being pushed.
        branch: String,
    },

    /// The remote refused the update for another reason.
    #[error("push of `{branch}` rejected: {message}")]
    PushRejected {
        /// Branch being pushed.
        branch: String,
        /// Reason reported by the remote.
        message: String,
    },

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Returns true for a diverged-remote rejection.
    #[must_use]
    pub fn is_push_conflict(&self) -> bool {
        matches!(self, Self::PushConflict { .. })
    }
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_repo_display() {
        let err = GitError::NotARepo(PathBuf::from("/tmp/not-git"));
        assert_eq!(err.to_string(), "not a git repository: /tmp/not-git");
    }

    #[test]
    fn test_push_conflict_display() {
        let err = GitError::PushConflict {
            branch: "release-1.2.0".into(),
        };
        assert_eq!(
            err.to_string(),
            "push of `release-1.2.0` rejected: remote branch has diverged"
        );
        assert!(err.is_push_conflict());
    }

    #[test]
    fn test_push_rejected_is_not_conflict() {
        let err = GitError::PushRejected {
            branch: "main".into(),
            message: "protected branch".into(),
        };
        assert!(!err.is_push_conflict());
        assert!(err.to_string().contains("protected branch"));
    }
}
