//! Tag history helpers shared by adapters.

use shipmate_versioning::Version;
use tracing::debug;

/// Returns true when `tag` means "no previous release".
///
/// An empty tag or a zero version selects the full history.
#[must_use]
pub fn is_full_history(tag: &str) -> bool {
    tag.is_empty() || Version::parse(tag).is_ok_and(|v| v.is_zero())
}

/// Returns the highest version among tag names.
///
/// Tags that do not parse as versions are skipped. Without any valid tag
/// the zero version is returned.
#[must_use]
pub fn highest_version<'a>(tags: impl IntoIterator<Item = &'a str>) -> Version {
    tags.into_iter()
        .filter_map(|tag| match Version::parse(tag) {
            Ok(version) => Some(version),
            Err(err) => {
                debug!(tag, error = %err, "skipping non-version tag");
                None
            }
        })
        .max()
        .unwrap_or_else(|| Version::zero(""))
}
