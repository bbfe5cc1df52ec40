//! GitLab provider for Shipmate.

mod api;
mod provider;

pub use api::GitLabApi;
pub use provider::GitLabProvider;
