//! Working-tree abstraction and its `git2` implementation.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    BranchType, Cred, ErrorCode, FetchOptions, PushOptions, RemoteCallbacks,
    Repository, ResetType, Signature,
};
use shipmate_config::AccessToken;
use tracing::{debug, info};

use crate::{GitError, GitResult};

/// Author name of release commits.
pub const COMMIT_AUTHOR_NAME: &str = "shipmate";

/// Author email of release commits.
pub const COMMIT_AUTHOR_EMAIL: &str = "no-reply@shipmate.invalid";

const REMOTE: &str = "origin";

/// The working-tree operations a release commit needs.
///
/// Only one mutating sequence may run against a working tree at a time;
/// implementations take `&mut self` so callers have to serialize access.
pub trait Workspace: Send {
    /// Root of the working tree; edit paths are relative to it.
    fn root(&self) -> &Path;

    /// Checks out `branch`, creating it from `origin/<branch>` or HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be created or checked out.
    fn checkout_branch(&mut self, branch: &str) -> GitResult<()>;

    /// Stages the given paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated.
    fn stage(&mut self, paths: &[PathBuf]) -> GitResult<()>;

    /// Commits the index on the current branch and returns the commit id.
    ///
    /// Returns `None` without committing when the index matches HEAD's tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit cannot be created.
    fn commit(&mut self, message: &str) -> GitResult<Option<String>>;

    /// Id of the commit HEAD points at.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD is unborn.
    fn head_commit(&self) -> GitResult<String>;

    /// Id of `refs/remotes/origin/<branch>` as of the last fetch, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference cannot be read.
    fn remote_commit(&self, branch: &str) -> GitResult<Option<String>>;

    /// Pushes `branch` to the same name on the remote.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::PushConflict`] when the remote branch has diverged.
    fn push(&mut self, branch: &str, force: bool) -> GitResult<()>;

    /// Fetches `branch` into `refs/remotes/origin/<branch>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails.
    fn fetch(&mut self, branch: &str) -> GitResult<()>;

    /// Hard-resets the local branch to `refs/remotes/origin/<branch>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote-tracking ref is missing.
    fn reset_to_remote(&mut self, branch: &str) -> GitResult<()>;
}

/// HTTPS credentials for fetch and push.
#[derive(Clone, Default)]
pub struct Credentials {
    username: String,
    token: AccessToken,
}

impl Credentials {
    /// Creates credentials; an empty username falls back to `oauth2`.
    #[must_use]
    pub fn new(username: impl Into<String>, token: AccessToken) -> Self {
        Self {
            username: username.into(),
            token,
        }
    }

    fn username(&self) -> &str {
        if self.username.is_empty() {
            "oauth2"
        } else {
            &self.username
        }
    }

    fn callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        let mut attempts = 0;
        callbacks.credentials(move |_url, _user, _allowed| {
            // libgit2 re-invokes the callback after a rejected attempt.
            attempts += 1;
            if attempts > 1 {
                return Err(git2::Error::from_str("authentication failed"));
            }
            Cred::userpass_plaintext(self.username(), self.token.expose())
        });
        callbacks
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &self.token)
            .finish()
    }
}

/// A `git2` working tree with an `origin` remote.
pub struct LocalWorkspace {
    repo: Repository,
    root: PathBuf,
    credentials: Credentials,
}

impl LocalWorkspace {
    /// Discovers the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not inside a non-bare repository.
    pub fn open(path: impl AsRef<Path>, credentials: Credentials) -> GitResult<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Self::from_repository(repo, credentials)
    }

    /// Clones `url` into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    pub fn clone_into(
        url: &str,
        dir: impl AsRef<Path>,
        credentials: Credentials,
    ) -> GitResult<Self> {
        let dir = dir.as_ref();
        info!(url, ?dir, "cloning repository");

        let repo = {
            let mut fetch = FetchOptions::new();
            fetch.remote_callbacks(credentials.callbacks());
            RepoBuilder::new().fetch_options(fetch).clone(url, dir)?
        };
        Self::from_repository(repo, credentials)
    }

    fn from_repository(repo: Repository, credentials: Credentials) -> GitResult<Self> {
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::NoWorkdir(repo.path().to_path_buf()))?;
        Ok(Self {
            repo,
            root,
            credentials,
        })
    }

    /// Returns the name of the checked-out branch, if any.
    #[must_use]
    pub fn current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        head.shorthand().map(String::from)
    }

    fn switch_to(&self, branch: &str) -> GitResult<()> {
        self.repo.set_head(&format!("refs/heads/{branch}"))?;
        self.repo.checkout_head(Some(CheckoutBuilder::new().safe()))?;
        Ok(())
    }
}

impl Workspace for LocalWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn checkout_branch(&mut self, branch: &str) -> GitResult<()> {
        if self.repo.find_branch(branch, BranchType::Local).is_err() {
            let remote_ref = format!("refs/remotes/{REMOTE}/{branch}");
            let start = match self.repo.find_reference(&remote_ref) {
                Ok(reference) => reference.peel_to_commit()?,
                Err(_) => self.repo.head()?.peel_to_commit()?,
            };
            debug!(branch, start = %start.id(), "creating local branch");
            self.repo.branch(branch, &start, false)?;
        }

        self.switch_to(branch)
    }

    fn stage(&mut self, paths: &[PathBuf]) -> GitResult<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(path)?;
        }
        index.write()?;
        Ok(())
    }

    fn commit(&mut self, message: &str) -> GitResult<Option<String>> {
        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        if parent.as_ref().is_some_and(|p| p.tree_id() == tree.id()) {
            debug!("index matches HEAD, nothing to commit");
            return Ok(None);
        }
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let signature = Signature::now(COMMIT_AUTHOR_NAME, COMMIT_AUTHOR_EMAIL)?;
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!(commit = %oid, "created commit");
        Ok(Some(oid.to_string()))
    }

    fn head_commit(&self) -> GitResult<String> {
        Ok(self.repo.head()?.peel_to_commit()?.id().to_string())
    }

    fn remote_commit(&self, branch: &str) -> GitResult<Option<String>> {
        match self.repo.find_reference(&format!("refs/remotes/{REMOTE}/{branch}")) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id().to_string())),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn push(&mut self, branch: &str, force: bool) -> GitResult<()> {
        let refspec = format!(
            "{}refs/heads/{branch}:refs/heads/{branch}",
            if force { "+" } else { "" }
        );
        let mut remote = self.repo.find_remote(REMOTE)?;
        let mut rejection: Option<String> = None;

        let result = {
            let mut callbacks = self.credentials.callbacks();
            callbacks.push_update_reference(|_refname, status| {
                if let Some(message) = status {
                    rejection = Some(message.to_string());
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote.push(&[refspec.as_str()], Some(&mut options))
        };

        if let Err(err) = result {
            if err.code() == ErrorCode::NotFastForward || is_conflict_message(err.message()) {
                return Err(GitError::PushConflict {
                    branch: branch.to_string(),
                });
            }
            return Err(err.into());
        }

        match rejection {
            Some(message) if is_conflict_message(&message) => Err(GitError::PushConflict {
                branch: branch.to_string(),
            }),
            Some(message) => Err(GitError::PushRejected {
                branch: branch.to_string(),
                message,
            }),
            None => {
                info!(branch, force, "pushed branch");
                Ok(())
            }
        }
    }

    fn fetch(&mut self, branch: &str) -> GitResult<()> {
        let refspec = format!("+refs/heads/{branch}:refs/remotes/{REMOTE}/{branch}");
        let mut remote = self.repo.find_remote(REMOTE)?;
        let mut options = FetchOptions::new();
        options.remote_callbacks(self.credentials.callbacks());
        remote.fetch(&[refspec.as_str()], Some(&mut options), None)?;
        debug!(branch, "fetched remote branch");
        Ok(())
    }

    fn reset_to_remote(&mut self, branch: &str) -> GitResult<()> {
        let target = self
            .repo
            .find_reference(&format!("refs/remotes/{REMOTE}/{branch}"))?
            .peel_to_commit()?;
        self.repo.set_head(&format!("refs/heads/{branch}"))?;
        self.repo
            .reset(target.as_object(), ResetType::Hard, None)?;
        info!(branch, commit = %target.id(), "reset local branch to remote");
        Ok(())
    }
}

fn is_conflict_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("non-fast-forward")
        || message.contains("non-fastforward")
        || message.contains("fetch first")
        || message.contains("not present locally")
}
