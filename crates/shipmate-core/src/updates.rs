//! Tagged-line update jobs.

use std::path::PathBuf;

use shipmate_changelog::file_update_branch;
use shipmate_config::{ConfigUpdate, ExecutionMode};
use shipmate_provider::{Outcome, Provider};
use shipmate_versioning::Version;
use tracing::{error, info};

use crate::{Connector, CoreError, CoreResult, Step};

/// One tagged-line update against a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest<'a> {
    /// Marker tag, matched as `# x-shipmate:<tag>`.
    pub tag: &'a str,
    /// Files to rewrite.
    pub files: &'a [PathBuf],
    /// Version written into tagged lines.
    pub version: &'a Version,
    /// Branch to commit on; defaults to `release/replace-<tag>-<version>`.
    pub branch: Option<&'a str>,
    /// Branch the request targets.
    pub target: &'a str,
}

/// Rewrites tagged lines, commits them and ensures a request for them.
///
/// # Errors
///
/// Returns the first failing step.
pub fn update_tagged_files(
    provider: &dyn Provider,
    request: &UpdateRequest<'_>,
    mode: ExecutionMode,
) -> CoreResult<Vec<Outcome>> {
    let branch = request.branch.map_or_else(
        || file_update_branch(request.tag, &request.version.number()),
        str::to_string,
    );
    info!(tag = request.tag, version = %request.version, %branch, "updating tagged files");

    let commit = provider
        .commit_tagged_lines(&branch, request.tag, request.version, request.files, mode)
        .map_err(CoreError::at(Step::Commit))?;
    let mut outcomes = vec![commit];

    outcomes.extend(
        provider
            .check_create_file_pull_request(&branch, request.target, request.tag, request.version, mode)
            .map_err(CoreError::at(Step::PullRequest))?,
    );
    Ok(outcomes)
}

/// Runs every config update, collecting failures.
pub(crate) fn run_config_updates(
    connector: &dyn Connector,
    updates: &[ConfigUpdate],
    version: &Version,
    target: &str,
    mode: ExecutionMode,
) -> CoreResult<Vec<Outcome>> {
    let mut outcomes = Vec::new();
    let mut failures = Vec::new();

    for update in updates {
        let request = UpdateRequest {
            tag: &update.search_tag,
            files: &update.files,
            version,
            branch: None,
            target,
        };
        let result = connector
            .connect(update)
            .and_then(|provider| update_tagged_files(provider.as_ref(), &request, mode));

        match result {
            Ok(done) => outcomes.extend(done),
            Err(err) => {
                error!(repository = %update.repository, error = %err, "config update failed");
                failures.push((update.repository.clone(), err));
            }
        }
    }

    if failures.is_empty() {
        Ok(outcomes)
    } else {
        Err(CoreError::ConfigUpdates { failures })
    }
}
