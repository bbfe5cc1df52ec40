//! The local commit step shared by every adapter.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use shipmate_config::{ExecutionMode, ExtraFileConfig};
use shipmate_git::{Edit, Workspace, prepare, publish};
use shipmate_versioning::{MANIFEST_FILE_NAME, ReleaseManifest, Version};
use tracing::info;

use crate::{Outcome, PlannedAction, ProviderResult};

/// A local clone that release commits are produced in.
///
/// Edits are always applied and staged; only the commit and push are
/// skipped in dry-run mode. A branch whose remote tip already holds the
/// edits yields [`Outcome::Unchanged`].
pub struct WorkingTree {
    workspace: Mutex<Box<dyn Workspace>>,
}

impl fmt::Debug for WorkingTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingTree").finish_non_exhaustive()
    }
}

impl WorkingTree {
    /// Wraps a workspace.
    pub fn new(workspace: impl Workspace + 'static) -> Self {
        Self {
            workspace: Mutex::new(Box::new(workspace)),
        }
    }

    /// Writes the manifest, rewrites annotations in `extra_files` and
    /// commits the result on `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if an extra file is missing or the commit/push fails.
    pub fn commit_manifest(
        &self,
        branch: &str,
        manifest: &ReleaseManifest,
        extra_files: &[ExtraFileConfig],
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome> {
        let number = manifest.version.number();
        let mut edits = vec![Edit::Write {
            path: PathBuf::from(MANIFEST_FILE_NAME),
            contents: manifest.to_json(),
        }];
        edits.extend(extra_files.iter().map(|file| Edit::Annotations {
            path: file.path.clone(),
            version: number.clone(),
        }));

        let message = format!("release: update files for version {number}");
        self.commit(branch, &edits, message, mode)
    }

    /// Rewrites `# x-shipmate:<tag>` lines in `files` and commits them on `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or the commit/push fails.
    pub fn commit_tagged_lines(
        &self,
        branch: &str,
        tag: &str,
        version: &Version,
        files: &[PathBuf],
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome> {
        let number = version.number();
        let edits: Vec<Edit> = files
            .iter()
            .map(|path| Edit::TaggedLines {
                path: path.clone(),
                tag: tag.to_string(),
                version: number.clone(),
            })
            .collect();

        let message = format!("release: update {tag} to {number}");
        self.commit(branch, &edits, message, mode)
    }

    fn commit(
        &self,
        branch: &str,
        edits: &[Edit],
        message: String,
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome> {
        let mut workspace = self.workspace.lock().unwrap_or_else(PoisonError::into_inner);
        let prepared = prepare(workspace.as_mut(), branch, edits)?;

        let action = PlannedAction::Commit {
            branch: branch.to_string(),
            message: message.clone(),
            files: prepared.paths.clone(),
        };
        if mode.is_dry_run() {
            info!(%action, "dry run: edits staged, not committed");
            return Ok(Outcome::Planned(action));
        }

        match publish(workspace.as_mut(), &prepared, &message)? {
            Some(published) => {
                info!(branch, commit = %published.commit, push = ?published.push, "release commit pushed");
                Ok(Outcome::Applied(action))
            }
            None => Ok(Outcome::Unchanged),
        }
    }
}
