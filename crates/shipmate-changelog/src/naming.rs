//! Names and texts of release branches, requests and releases.

/// Release branch name: `<prefix>-<version>`, prefix defaulting to `release`.
#[must_use]
pub fn release_branch(prefix: &str, version: &str) -> String {
    let prefix = if prefix.is_empty() { "release" } else { prefix };
    format!("{prefix}-{version}")
}

/// Title of a release pull/merge request.
#[must_use]
pub fn pull_request_title(version: &str) -> String {
    format!("Release {version}")
}

/// Body of a release pull/merge request.
#[must_use]
pub fn pull_request_body(version: &str, changelog: &str) -> String {
    format!(
        "This is the release pull request for version {version}.\n\n## Changelog\n\n{changelog}"
    )
}

/// Name of a published release.
#[must_use]
pub fn release_name(version: &str) -> String {
    format!("Release {version}")
}

/// Branch carrying a tagged-line update.
#[must_use]
pub fn file_update_branch(tag: &str, version: &str) -> String {
    format!("release/replace-{tag}-{version}")
}

/// Title of a tagged-line update request.
#[must_use]
pub fn file_update_title(tag: &str, version: &str) -> String {
    format!("Update {tag} to {version}")
}

/// Body of a tagged-line update request.
#[must_use]
pub fn file_update_body(tag: &str, version: &str) -> String {
    format!("Updates every line tagged `x-shipmate:{tag}` to version {version}.")
}
