//! Commit classification and version calculation for Shipmate.
//!
//! The pipeline is: raw history → [`classify`] → [`decide`] → [`VersionDecision`].
//! [`ReleaseManifest`] persists the resulting version between runs.

mod classifier;
mod decision;
mod error;
mod manifest;
mod version;

pub use classifier::{Classifier, ConventionalClassifier, SimpleClassifier, classifier_for, classify};
pub use decision::{VersionDecision, decide, effective_bump, max_severity};
pub use error::{VersioningError, VersioningResult};
pub use manifest::{MANIFEST_FILE_NAME, ReleaseManifest};
pub use version::Version;
