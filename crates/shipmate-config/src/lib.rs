//! Configuration management for Shipmate.
//!
//! This crate loads the `.shipmate.toml` file into an immutable [`Config`]
//! value. Nothing here is global: the value is built once by the caller and
//! passed by reference into the orchestrator and every provider.

mod error;
mod loader;
mod mode;
mod schema;
mod secret;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_FILE_NAME, DEFAULT_CONFIG, find_and_load_config, find_and_load_config_from,
    load_config, write_default_config,
};
pub use mode::ExecutionMode;
pub use schema::{
    Config, ConfigUpdate, DEFAULT_GITHUB_API_URL, DEFAULT_GITLAB_API_URL, ExtraFileConfig,
    PropagationTarget, ProviderConfig, ProviderKind, SimpleCommitTypes, Strategy,
    VersioningConfig,
};
pub use secret::AccessToken;
