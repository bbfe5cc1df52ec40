//! Provider error types.

use std::fmt::Write;

use shipmate_git::GitError;
use thiserror::Error;

use crate::{Method, Outcome};

/// Errors from provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API answered with an unexpected status.
    #[error("{method} {url} failed with status {status}: {body}")]
    Api {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Response status.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Network failure or timeout; nothing is assumed to have happened.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Request URL.
        url: String,
        /// Client error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        /// Request URL.
        url: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A URL could not be built.
    #[error("invalid URL `{0}`")]
    InvalidUrl(String),

    /// A commit step was requested without a local working tree.
    #[error("no local working tree configured for commits")]
    NoWorkingTree,

    /// Local git failure during the commit step.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Some propagation targets failed; the others still ran.
    #[error("{}", propagation_message(failures))]
    Propagation {
        /// Outcomes of the primary release and successful targets.
        completed: Vec<Outcome>,
        /// Failed targets with their errors.
        failures: Vec<(String, ProviderError)>,
    },
}

fn propagation_message(failures: &[(String, ProviderError)]) -> String {
    let mut message = format!("release propagation failed for {} target(s)", failures.len());
    for (target, err) in failures {
        _ = write!(message, "; {target}: {err}");
    }
    message
}

impl ProviderError {
    /// Builds an [`ProviderError::Api`] error, truncating long bodies.
    #[must_use]
    pub fn api(method: Method, url: impl Into<String>, status: u16, body: &str) -> Self {
        const MAX_BODY: usize = 500;
        let body = match body.char_indices().nth(MAX_BODY) {
            Some((idx, _)) => format!("{}…", &body[..idx]),
            None => body.to_string(),
        };
        Self::Api {
            method,
            url: url.into(),
            status,
            body,
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
