//! Persisted release manifest.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Version, VersioningError, VersioningResult};

/// Manifest file name at the repository root.
pub const MANIFEST_FILE_NAME: &str = ".shipmate-manifest.json";

/// The current-version record committed to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Version of the latest release (or release in preparation).
    pub version: Version,
}

impl ReleaseManifest {
    /// Creates a manifest for `version`.
    #[must_use]
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// Returns the manifest path inside `root`.
    #[must_use]
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE_NAME)
    }

    /// Parses manifest JSON.
    ///
    /// # Errors
    ///
    /// Returns [`VersioningError::ManifestFormat`] for malformed content.
    pub fn from_json(content: &str, path: &Path) -> VersioningResult<Self> {
        serde_json::from_str(content).map_err(|source| VersioningError::ManifestFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serializes the manifest, with a trailing newline.
    #[must_use]
    pub fn to_json(&self) -> String {
        let value = serde_json::json!({ "version": self.version.to_string() });
        format!("{value:#}\n")
    }

    /// Reads the manifest from `root`.
    ///
    /// # Errors
    ///
    /// Returns [`VersioningError::ManifestMissing`] if the file does not
    /// exist, and other variants for unreadable or malformed content.
    pub fn read_from(root: &Path) -> VersioningResult<Self> {
        let path = Self::path_in(root);
        debug!(?path, "reading release manifest");

        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                VersioningError::ManifestMissing(path.clone())
            } else {
                VersioningError::ManifestIo {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        Self::from_json(&content, &path)
    }

    /// Writes the manifest into `root`.
    ///
    /// # Errors
    ///
    /// Returns [`VersioningError::ManifestIo`] if the file cannot be written.
    pub fn write_to(&self, root: &Path) -> VersioningResult<PathBuf> {
        let path = Self::path_in(root);
        std::fs::write(&path, self.to_json()).map_err(|source| VersioningError::ManifestIo {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Writes a `0.0.0` manifest unless one already exists.
    ///
    /// Returns the created manifest, or `None` if one was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing manifest cannot be inspected or the
    /// new one cannot be written.
    pub fn initialize(root: &Path, prefix: &str) -> VersioningResult<Option<Self>> {
        match Self::read_from(root) {
            Ok(_) => Ok(None),
            Err(VersioningError::ManifestMissing(_)) => {
                let manifest = Self::new(Version::zero(prefix));
                manifest.write_to(root)?;
                Ok(Some(manifest))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let manifest = ReleaseManifest::new(Version::parse("v1.4.0").unwrap());

        manifest.write_to(dir.path()).unwrap();
        let back = ReleaseManifest::read_from(dir.path()).unwrap();

        assert_eq!(back, manifest);
    }

    #[test]
    fn test_to_json() {
        let manifest = ReleaseManifest::new(Version::new(1, 2, 3));
        assert_eq!(manifest.to_json(), "{\n  \"version\": \"1.2.3\"\n}\n");
    }

    #[test]
    fn test_from_json_compact() {
        let manifest =
            ReleaseManifest::from_json(r#"{"version": "0.3.1"}"#, Path::new("m.json")).unwrap();
        assert_eq!(manifest.version, Version::new(0, 3, 1));
    }

    #[test]
    fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ReleaseManifest::read_from(dir.path()),
            Err(VersioningError::ManifestMissing(_))
        ));
    }

    #[test]
    fn test_read_malformed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE_NAME), "{\"version\": \"banana\"}").unwrap();

        assert!(matches!(
            ReleaseManifest::read_from(dir.path()),
            Err(VersioningError::ManifestFormat { .. })
        ));
    }

    #[test]
    fn test_initialize_creates_zero() {
        let dir = TempDir::new().unwrap();
        let created = ReleaseManifest::initialize(dir.path(), "v").unwrap().unwrap();

        assert_eq!(created.version.to_string(), "v0.0.0");
        assert_eq!(ReleaseManifest::read_from(dir.path()).unwrap(), created);
    }

    #[test]
    fn test_initialize_keeps_existing() {
        let dir = TempDir::new().unwrap();
        ReleaseManifest::new(Version::new(2, 0, 0))
            .write_to(dir.path())
            .unwrap();

        assert!(ReleaseManifest::initialize(dir.path(), "").unwrap().is_none());
        assert_eq!(
            ReleaseManifest::read_from(dir.path()).unwrap().version,
            Version::new(2, 0, 0)
        );
    }
}
