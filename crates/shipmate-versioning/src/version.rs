//! Semantic version with a display prefix.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shipmate_commit::Severity;

use crate::{VersioningError, VersioningResult};

/// A semantic version plus the prefix it is displayed with (e.g. `v`).
///
/// Bumps keep the prefix, so a repository tagging `v1.2.3` keeps producing
/// `v`-prefixed tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    prefix: String,
    number: semver::Version,
}

impl Version {
    /// Creates an unprefixed version.
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            prefix: String::new(),
            number: semver::Version::new(major, minor, patch),
        }
    }

    /// The `0.0.0` sentinel used before any release exists.
    #[must_use]
    pub fn zero(prefix: impl Into<String>) -> Self {
        Self::new(0, 0, 0).with_prefix(prefix)
    }

    /// Parses `"<prefix><semver>"`; the prefix is every leading non-digit.
    ///
    /// # Errors
    ///
    /// Returns [`VersioningError::InvalidVersion`] if the remainder is not semver.
    pub fn parse(input: &str) -> VersioningResult<Self> {
        let trimmed = input.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (prefix, rest) = trimmed.split_at(split);

        let number = semver::Version::parse(rest).map_err(|source| VersioningError::InvalidVersion {
            input: input.to_string(),
            source,
        })?;

        Ok(Self {
            prefix: prefix.to_string(),
            number,
        })
    }

    /// Replaces the display prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the display prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the bare semantic version.
    #[must_use]
    pub fn semver(&self) -> &semver::Version {
        &self.number
    }

    /// Returns the version without its prefix, e.g. `1.2.3`.
    #[must_use]
    pub fn number(&self) -> String {
        self.number.to_string()
    }

    /// Returns true for the `0.0.0` sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.number.major == 0
            && self.number.minor == 0
            && self.number.patch == 0
            && self.number.pre.is_empty()
    }

    /// Returns true while the major component is 0.
    #[must_use]
    pub fn is_pre_major(&self) -> bool {
        self.number.major == 0
    }

    /// Applies the bump matching `severity`; `Severity::None` returns a copy.
    #[must_use]
    pub fn bump(&self, severity: Severity) -> Self {
        match severity {
            Severity::Major => self.bump_major(),
            Severity::Minor => self.bump_minor(),
            Severity::Patch => self.bump_patch(),
            Severity::None => self.clone(),
        }
    }

    /// `X.Y.Z` → `(X+1).0.0`.
    #[must_use]
    pub fn bump_major(&self) -> Self {
        self.derive(self.number.major + 1, 0, 0)
    }

    /// `X.Y.Z` → `X.(Y+1).0`.
    #[must_use]
    pub fn bump_minor(&self) -> Self {
        self.derive(self.number.major, self.number.minor + 1, 0)
    }

    /// `X.Y.Z` → `X.Y.(Z+1)`; a prerelease `X.Y.Z-pre` is promoted to `X.Y.Z`.
    #[must_use]
    pub fn bump_patch(&self) -> Self {
        let patch = if self.number.pre.is_empty() {
            self.number.patch + 1
        } else {
            self.number.patch
        };
        self.derive(self.number.major, self.number.minor, patch)
    }

    fn derive(&self, major: u64, minor: u64, patch: u64) -> Self {
        Self {
            prefix: self.prefix.clone(),
            number: semver::Version::new(major, minor, patch),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

impl FromStr for Version {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersioningError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.prefix.cmp(&other.prefix))
    }
}
