//! Commits as listed by a hosting provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of remote history, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    /// Commit SHA, used for changelog links.
    pub id: String,

    /// Message as stored upstream, body included.
    pub message: String,

    /// Author display name.
    pub author: String,

    /// Authored date reported by the provider.
    pub date: DateTime<Utc>,
}

impl RawCommit {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            author: author.into(),
            date,
        }
    }

    /// First line of the message, empty for an empty message.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}
