//! Local working-tree operations for Shipmate.
//!
//! Providers create branches and pull requests over REST, but the release
//! commit itself is produced locally and pushed with git. This crate owns
//! that part:
//! - [`Workspace`]: the operations a release commit needs, with
//!   [`LocalWorkspace`] as the `git2` implementation
//! - [`prepare`] / [`publish`]: apply file edits, then commit and push
//! - [`push_with_recovery`]: on a diverged remote, reset to its tip, replay
//!   the edits and force-push once
//! - [`annotations`]: in-file version marker rewriting

pub mod annotations;
mod commit;
mod error;
mod recovery;
mod workspace;

pub use commit::{Edit, PreparedCommit, PublishedCommit, prepare, publish};
pub use error::{GitError, GitResult};
pub use recovery::{PushOutcome, push_with_recovery};
pub use workspace::{COMMIT_AUTHOR_EMAIL, COMMIT_AUTHOR_NAME, Credentials, LocalWorkspace, Workspace};
