//! Commit classifiers.

mod conventional;
mod simple;

pub use conventional::ConventionalClassifier;
pub use simple::SimpleClassifier;

use shipmate_commit::{ClassifiedCommit, RawCommit, Severity};
use shipmate_config::{Strategy, VersioningConfig};

/// Assigns a [`Severity`] to a commit message.
///
/// Classification never fails: messages a classifier does not understand
/// get [`Severity::None`].
pub trait Classifier {
    /// Returns the strategy name.
    fn name(&self) -> &'static str;

    /// Returns the severity of one commit.
    fn severity(&self, commit: &RawCommit) -> Severity;

    /// Classifies one commit.
    fn classify(&self, commit: &RawCommit) -> ClassifiedCommit {
        ClassifiedCommit::new(&commit.id, &commit.message, self.severity(commit))
    }
}

/// Builds the classifier selected by `config.strategy`.
#[must_use]
pub fn classifier_for(config: &VersioningConfig) -> Box<dyn Classifier> {
    match config.strategy {
        Strategy::Conventional => Box::new(ConventionalClassifier::new()),
        Strategy::Simple => Box::new(SimpleClassifier::from_config(&config.simple_commit_types)),
    }
}

/// Classifies every commit with the configured strategy.
#[must_use]
pub fn classify(commits: &[RawCommit], config: &VersioningConfig) -> Vec<ClassifiedCommit> {
    let classifier = classifier_for(config);
    tracing::debug!(
        strategy = classifier.name(),
        count = commits.len(),
        "classifying commits"
    );
    commits.iter().map(|c| classifier.classify(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shipmate_config::SimpleCommitTypes;

    fn raw(message: &str) -> RawCommit {
        RawCommit::new("abc123", message, "Test", Utc::now())
    }

    #[test]
    fn test_classifier_for_conventional() {
        let config = VersioningConfig::default();
        assert_eq!(classifier_for(&config).name(), "conventional");
    }

    #[test]
    fn test_classifier_for_simple() {
        let config = VersioningConfig {
            strategy: Strategy::Simple,
            ..VersioningConfig::default()
        };
        assert_eq!(classifier_for(&config).name(), "simple");
    }

    #[test]
    fn test_classify_one_entry_per_commit() {
        let config = VersioningConfig {
            strategy: Strategy::Simple,
            simple_commit_types: SimpleCommitTypes {
                major: vec!["Break".into()],
                minor: vec!["Br".into()],
                patch: vec!["B".into()],
                default_patch: false,
            },
            ..VersioningConfig::default()
        };

        let classified = classify(&[raw("Breaking thing"), raw("other")], &config);
        assert_eq!(classified.len(), 2);
        assert_eq!(classified[0].severity, Severity::Major);
        assert_eq!(classified[1].severity, Severity::None);
    }

    #[test]
    fn test_classify_keeps_ids() {
        let classified = classify(&[raw("fix: a")], &VersioningConfig::default());
        assert_eq!(classified[0].id, "abc123");
        assert_eq!(classified[0].message, "fix: a");
    }
}
