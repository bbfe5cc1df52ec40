//! Idempotent pull/merge request handling.

use shipmate_changelog::{
    file_update_body, file_update_title, pull_request_body, pull_request_title, render,
};
use shipmate_config::ExecutionMode;
use shipmate_versioning::{Version, VersionDecision};
use tracing::{debug, info};

use crate::{Outcome, PlannedAction, Provider, ProviderResult, execute};

/// Label carried by release requests; stale ones are found by it.
pub const RELEASE_LABEL: &str = "release";

/// An open pull/merge request as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// Number (GitHub) or iid (GitLab).
    pub number: u64,
    /// Source branch.
    pub source: String,
    /// Target branch.
    pub target: String,
    /// Title.
    pub title: String,
    /// Body; empty when the API returns none.
    pub body: String,
    /// Label names.
    pub labels: Vec<String>,
}

impl ReviewRequest {
    /// Returns true if the request carries `label`.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Desired state of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    /// Source branch.
    pub source: String,
    /// Target branch.
    pub target: String,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
    /// Labels applied on creation.
    pub labels: Vec<String>,
}

impl RequestDraft {
    /// Builds the release request for the next version of `decision`.
    ///
    /// The body lists the commits since the current release.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    pub fn release<P: Provider + ?Sized>(
        provider: &P,
        source: &str,
        target: &str,
        decision: &VersionDecision,
        project_url: &str,
    ) -> ProviderResult<Self> {
        let commits = provider.commits_since_release(&decision.current.to_string())?;
        let next = decision.next.to_string();
        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            title: pull_request_title(&next),
            body: pull_request_body(&next, &render(&commits, project_url)),
            labels: vec![RELEASE_LABEL.to_string()],
        })
    }

    /// Builds the request for a tagged-line update.
    #[must_use]
    pub fn file_update(source: &str, target: &str, tag: &str, version: &Version) -> Self {
        let number = version.number();
        Self {
            source: source.to_string(),
            target: target.to_string(),
            title: file_update_title(tag, &number),
            body: file_update_body(tag, &number),
            labels: Vec::new(),
        }
    }
}

/// The request endpoints of one hosting backend.
pub trait ReviewRequestApi {
    /// Lists open requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    fn open_requests(&self) -> ProviderResult<Vec<ReviewRequest>>;

    /// Opens a request and applies its labels.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    fn create_request(&self, draft: &RequestDraft) -> ProviderResult<()>;

    /// Replaces title and body of request `number`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn update_request(&self, number: u64, draft: &RequestDraft) -> ProviderResult<()>;

    /// Closes request `number` without merging.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be closed.
    fn close_request(&self, number: u64) -> ProviderResult<()>;

    /// Deletes a branch.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn delete_branch(&self, branch: &str) -> ProviderResult<()>;
}

/// Brings the open requests in line with `draft`.
///
/// - an open request for the same source and target is updated in place,
///   and left alone when title and body already match
/// - otherwise a new request is opened
/// - with `close_stale`, other open requests labeled [`RELEASE_LABEL`] are
///   closed and their source branches deleted
///
/// # Errors
///
/// Returns the first API error; earlier outcomes are lost with it.
pub fn ensure_request(
    api: &dyn ReviewRequestApi,
    draft: &RequestDraft,
    mode: ExecutionMode,
    close_stale: bool,
) -> ProviderResult<Vec<Outcome>> {
    let open = api.open_requests()?;
    let mut outcomes = Vec::new();

    let existing = open
        .iter()
        .find(|r| r.source == draft.source && r.target == draft.target);

    match existing {
        Some(request) if request.title == draft.title && request.body == draft.body => {
            debug!(number = request.number, "release request already up to date");
            outcomes.push(Outcome::Unchanged);
        }
        Some(request) => {
            let action = PlannedAction::UpdatePullRequest {
                number: request.number,
                source: draft.source.clone(),
                title: draft.title.clone(),
            };
            outcomes.push(execute(mode, action, || {
                api.update_request(request.number, draft)
            })?);
        }
        None => {
            let action = PlannedAction::CreatePullRequest {
                source: draft.source.clone(),
                target: draft.target.clone(),
                title: draft.title.clone(),
            };
            outcomes.push(execute(mode, action, || api.create_request(draft))?);
        }
    }

    if close_stale {
        let stale = open
            .iter()
            .filter(|r| r.source != draft.source && r.has_label(RELEASE_LABEL));
        for request in stale {
            info!(number = request.number, source = %request.source, "closing stale release request");
            let close = PlannedAction::ClosePullRequest {
                number: request.number,
                source: request.source.clone(),
            };
            outcomes.push(execute(mode, close, || api.close_request(request.number))?);

            let delete = PlannedAction::DeleteBranch {
                branch: request.source.clone(),
            };
            outcomes.push(execute(mode, delete, || api.delete_branch(&request.source))?);
        }
    }

    Ok(outcomes)
}
