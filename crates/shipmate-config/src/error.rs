//! Errors raised while reading or checking `.shipmate.toml`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file at the given or discovered path.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    /// A value parsed but cannot be used, e.g. a GitHub slug without owner.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for this crate.
pub type ConfigResult<T> = Result<T, ConfigError>;
