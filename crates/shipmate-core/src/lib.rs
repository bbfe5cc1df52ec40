//! Release orchestration for Shipmate.
//!
//! [`Orchestrator`] runs the release state machine against any
//! [`Provider`](shipmate_provider::Provider). [`build_provider`] turns the
//! immutable [`Config`](shipmate_config::Config) into the matching adapter.

mod error;
mod factory;
mod orchestrator;
mod report;
mod updates;

pub use error::{CoreError, CoreResult, Step};
pub use factory::{Connector, RemoteConnector, build_provider, connection_for};
pub use orchestrator::Orchestrator;
pub use report::{RunReport, RunState};
pub use updates::{UpdateRequest, update_tagged_files};
