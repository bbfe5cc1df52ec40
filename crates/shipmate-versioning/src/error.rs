//! Versioning error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from version parsing and manifest persistence.
#[derive(Debug, Error)]
pub enum VersioningError {
    /// A string is not a semantic version.
    #[error("invalid version `{input}`: {source}")]
    InvalidVersion {
        /// The offending input.
        input: String,
        /// Parser error.
        #[source]
        source: semver::Error,
    },

    /// The manifest file does not exist (expected on first run).
    #[error("release manifest not found: {0}")]
    ManifestMissing(PathBuf),

    /// The manifest file could not be read or written.
    #[error("release manifest {path}: {source}")]
    ManifestIo {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest file is not a valid `{"version": ...}` record.
    #[error("malformed release manifest {path}: {source}")]
    ManifestFormat {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for versioning operations.
pub type VersioningResult<T> = Result<T, VersioningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_missing_display() {
        let err = VersioningError::ManifestMissing(PathBuf::from("/repo/.shipmate-manifest.json"));
        assert_eq!(
            err.to_string(),
            "release manifest not found: /repo/.shipmate-manifest.json"
        );
    }

    #[test]
    fn test_invalid_version_display() {
        let source = semver::Version::parse("nope").unwrap_err();
        let err = VersioningError::InvalidVersion {
            input: "nope".into(),
            source,
        };
        assert!(err.to_string().starts_with("invalid version `nope`"));
    }
}
