//! GitHub provider for Shipmate.
//!
//! Branches, pull requests, tags and releases go through the REST API;
//! the release commit is produced in a local [`WorkingTree`](shipmate_provider::WorkingTree).

mod api;
mod provider;

pub use api::GitHubApi;
pub use provider::GitHubProvider;
