//! Hosting provider capability for Shipmate.
//!
//! The orchestrator drives releases through the [`Provider`] trait only.
//! Each hosting backend lives in its own adapter crate and builds on the
//! shared pieces here:
//! - [`Transport`]: blocking HTTP round-trips ([`ReqwestTransport`] in production)
//! - [`ReviewRequestApi`] + [`ensure_request`]: idempotent pull/merge requests
//! - [`WorkingTree`]: the local commit step, identical for every backend
//! - [`execute`]: the single place where [`ExecutionMode`] suppresses mutations

mod action;
mod error;
mod history;
mod provider;
mod review;
mod transport;
mod worktree;

#[cfg(any(test, feature = "testing"))]
mod fake;

pub use action::{Outcome, PlannedAction, execute};
pub use error::{ProviderError, ProviderResult};
pub use history::{highest_version, is_full_history};
pub use provider::{Connection, EnsuredBranch, Provider, propagate};
pub use review::{RELEASE_LABEL, RequestDraft, ReviewRequest, ReviewRequestApi, ensure_request};
pub use shipmate_config::ExecutionMode;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, endpoint};
pub use worktree::WorkingTree;

#[cfg(any(test, feature = "testing"))]
pub use fake::FakeTransport;
