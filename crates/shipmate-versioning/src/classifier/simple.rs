//! Literal-prefix classifier.

use shipmate_commit::{RawCommit, Severity};
use shipmate_config::SimpleCommitTypes;

use super::Classifier;

/// Classifies commits by case-insensitive message prefixes.
///
/// Each commit gets exactly one severity: the highest list whose prefix
/// matches (major, then minor, then patch), or `None`.
pub struct SimpleClassifier {
    major: Vec<String>,
    minor: Vec<String>,
    patch: Vec<String>,
}

impl SimpleClassifier {
    /// Creates a classifier from the configured prefix tables.
    #[must_use]
    pub fn from_config(types: &SimpleCommitTypes) -> Self {
        Self {
            major: lowercase_all(&types.major),
            minor: lowercase_all(&types.minor),
            patch: lowercase_all(&types.patch),
        }
    }
}

fn lowercase_all(prefixes: &[String]) -> Vec<String> {
    prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.to_lowercase())
        .collect()
}

fn matches_any(message: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| message.starts_with(p.as_str()))
}

impl Classifier for SimpleClassifier {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn severity(&self, commit: &RawCommit) -> Severity {
        let message = commit.message.to_lowercase();

        if matches_any(&message, &self.major) {
            Severity::Major
        } else if matches_any(&message, &self.minor) {
            Severity::Minor
        } else if matches_any(&message, &self.patch) {
            Severity::Patch
        } else {
            Severity::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn classifier() -> SimpleClassifier {
        SimpleClassifier::from_config(&SimpleCommitTypes {
            major: vec!["BREAKING".into()],
            minor: vec!["Add".into(), "New".into()],
            patch: vec!["Fix".into()],
            default_patch: false,
        })
    }

    fn severity(message: &str) -> Severity {
        let raw = RawCommit::new("abc123", message, "Test", Utc::now());
        classifier().severity(&raw)
    }

    #[test]
    fn test_patch_prefix() {
        assert_eq!(severity("Fix login redirect"), Severity::Patch);
    }

    #[test]
    fn test_minor_prefix() {
        assert_eq!(severity("New dashboard"), Severity::Minor);
    }

    #[test]
    fn test_major_prefix() {
        assert_eq!(severity("BREAKING: remove v1 API"), Severity::Major);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(severity("fix typo"), Severity::Patch);
        assert_eq!(severity("ADD thing"), Severity::Minor);
    }

    #[test]
    fn test_no_match_is_none() {
        assert_eq!(severity("Refactor internals"), Severity::None);
    }

    #[test]
    fn test_overlapping_lists_pick_highest() {
        let classifier = SimpleClassifier::from_config(&SimpleCommitTypes {
            major: vec!["add breaking".into()],
            minor: vec!["add".into()],
            patch: vec!["a".into()],
            default_patch: false,
        });
        let raw = RawCommit::new("1", "Add breaking flag", "Test", Utc::now());
        assert_eq!(classifier.severity(&raw), Severity::Major);
    }

    #[test]
    fn test_empty_prefix_ignored() {
        let classifier = SimpleClassifier::from_config(&SimpleCommitTypes {
            patch: vec![String::new()],
            ..SimpleCommitTypes::default()
        });
        let raw = RawCommit::new("1", "anything", "Test", Utc::now());
        assert_eq!(classifier.severity(&raw), Severity::None);
    }
}
