//! Run summary.

use std::fmt;

use serde::Serialize;
use shipmate_provider::Outcome;
use shipmate_versioning::VersionDecision;

/// Where a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// The current version had no release yet and was released directly.
    FirstRelease,
    /// Released, and no release-worthy commits since.
    NothingToDo,
    /// A release branch and request were prepared for the next version.
    ReleaseRequested,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstRelease => write!(f, "first release"),
            Self::NothingToDo => write!(f, "nothing to do"),
            Self::ReleaseRequested => write!(f, "release requested"),
        }
    }
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Version decision.
    pub decision: VersionDecision,
    /// Terminal state.
    pub state: RunState,
    /// Outcome of every mutating call, in order.
    pub actions: Vec<Outcome>,
    /// Recovered problems worth showing the operator.
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Returns outcomes that changed or would change something.
    pub fn changes(&self) -> impl Iterator<Item = &Outcome> {
        self.actions.iter().filter(|o| o.action().is_some())
    }
}
