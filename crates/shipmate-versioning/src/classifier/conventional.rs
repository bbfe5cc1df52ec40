//! Conventional Commits classifier.

use std::sync::LazyLock;

use regex::Regex;
use shipmate_commit::{RawCommit, Severity};

use super::Classifier;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?(?P<breaking>!)?:")
        .expect("invalid regex")
});

static BREAKING_FOOTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^BREAKING[ -]CHANGE:").expect("invalid regex"));

/// Classifies `type(scope)!: subject` messages.
///
/// - `!` after the type, or a `BREAKING CHANGE:` footer → Major
/// - `feat` → Minor
/// - `fix` → Patch
/// - any other type, or no parseable header → None
///
/// Type matching is case-sensitive.
pub struct ConventionalClassifier;

impl ConventionalClassifier {
    /// Creates a new conventional classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConventionalClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for ConventionalClassifier {
    fn name(&self) -> &'static str {
        "conventional"
    }

    fn severity(&self, commit: &RawCommit) -> Severity {
        let Some(captures) = HEADER_RE.captures(commit.subject()) else {
            return Severity::None;
        };

        if captures.name("breaking").is_some() || BREAKING_FOOTER_RE.is_match(&commit.message) {
            return Severity::Major;
        }

        match captures.name("type").map(|m| m.as_str()) {
            Some("feat") => Severity::Minor,
            Some("fix") => Severity::Patch,
            _ => Severity::None,
        }
    }
}
