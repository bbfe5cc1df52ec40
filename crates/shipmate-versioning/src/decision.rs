//! Version calculation.

use serde::Serialize;
use shipmate_commit::{ClassifiedCommit, Severity};
use shipmate_config::VersioningConfig;
use tracing::debug;

use crate::Version;

/// Outcome of reducing classified history against the current version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDecision {
    /// Version recorded in the manifest.
    pub current: Version,

    /// Decided next version; equals `current` when `has_next` is false.
    pub next: Version,

    /// Whether a release-worthy change was found.
    pub has_next: bool,

    /// Bump actually applied, after pre-1.0 demotion.
    pub bump: Severity,
}

impl VersionDecision {
    /// A decision that keeps `current`.
    #[must_use]
    pub fn unchanged(current: Version) -> Self {
        Self {
            next: current.clone(),
            current,
            has_next: false,
            bump: Severity::None,
        }
    }

    /// Returns the next version only if one was decided.
    #[must_use]
    pub fn next_version(&self) -> Option<&Version> {
        self.has_next.then_some(&self.next)
    }
}

/// Returns the highest severity, stopping at the first breaking change.
#[must_use]
pub fn max_severity(commits: &[ClassifiedCommit]) -> Severity {
    let mut highest = Severity::None;
    for commit in commits {
        highest = highest.max(commit.severity);
        if highest.is_breaking() {
            break;
        }
    }
    highest
}

/// Maps an observed severity to the bump applied to `current`.
///
/// This is the single bump policy shared by every release path:
/// - while `current` is `0.x.y`, `bump_patch_minor_pre_major` turns a
///   breaking change into a minor bump and `bump_minor_pre_major` turns a
///   feature into a patch bump
/// - with no release-worthy change, `default_patch` still bumps the patch
#[must_use]
pub fn effective_bump(current: &Version, severity: Severity, config: &VersioningConfig) -> Severity {
    let pre_major = current.is_pre_major();

    match severity {
        Severity::Major if pre_major && config.bump_patch_minor_pre_major => Severity::Minor,
        Severity::Minor if pre_major && config.bump_minor_pre_major => Severity::Patch,
        Severity::None if config.simple_commit_types.default_patch => Severity::Patch,
        other => other,
    }
}

/// Decides the next version from classified history.
///
/// An empty or chore-only history is not an error: it yields a decision
/// with `has_next == false`.
#[must_use]
pub fn decide(
    current: &Version,
    commits: &[ClassifiedCommit],
    config: &VersioningConfig,
) -> VersionDecision {
    let observed = max_severity(commits);
    let bump = effective_bump(current, observed, config);

    debug!(
        current = %current,
        commits = commits.len(),
        %observed,
        %bump,
        "deciding next version"
    );

    if bump == Severity::None {
        return VersionDecision::unchanged(current.clone());
    }

    VersionDecision {
        current: current.clone(),
        next: current.bump(bump),
        has_next: true,
        bump,
    }
}
