//! Classified commits and change severity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Impact class of a change.
///
/// Variants are declared in ascending order so that `Ord` ranks
/// `None < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No release-worthy change (chores, docs, unparseable messages).
    #[default]
    None,
    /// Bug fix.
    Patch,
    /// New feature.
    Minor,
    /// Breaking change.
    Major,
}

impl Severity {
    /// Returns true if this is the highest possible severity.
    #[must_use]
    pub fn is_breaking(self) -> bool {
        self == Self::Major
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// A commit together with the severity assigned by a classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCommit {
    /// The commit id (SHA).
    pub id: String,

    /// The full commit message.
    pub message: String,

    /// The assigned severity.
    pub severity: Severity,
}

impl ClassifiedCommit {
    /// Creates a new classified commit.
    #[must_use]
    pub fn new(id: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Minor > Severity::Patch);
        assert!(Severity::Patch > Severity::None);
    }

    #[test]
    fn test_severity_max() {
        assert_eq!(Severity::Patch.max(Severity::Minor), Severity::Minor);
        assert_eq!(Severity::None.max(Severity::None), Severity::None);
    }

    #[test]
    fn test_severity_default() {
        assert_eq!(Severity::default(), Severity::None);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Major.to_string(), "major");
        assert_eq!(Severity::Minor.to_string(), "minor");
        assert_eq!(Severity::Patch.to_string(), "patch");
        assert_eq!(Severity::None.to_string(), "none");
    }

    #[test]
    fn test_is_breaking() {
        assert!(Severity::Major.is_breaking());
        assert!(!Severity::Minor.is_breaking());
    }

    #[test]
    fn test_severity_serde_lowercase() {
        let json = serde_json::to_string(&Severity::Minor).unwrap();
        assert_eq!(json, "\"minor\"");
    }

    #[test]
    fn test_classified_commit_new() {
        let commit = ClassifiedCommit::new("abc", "fix: a", Severity::Patch);
        assert_eq!(commit.id, "abc");
        assert_eq!(commit.severity, Severity::Patch);
    }
}
