//! Execution mode.

use std::fmt;

/// Whether remote mutations are performed or only described.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Perform every mutation.
    #[default]
    Live,
    /// Perform reads and local steps only; report intended mutations.
    DryRun,
}

impl ExecutionMode {
    /// Builds a mode from a `--dry-run` style flag.
    #[must_use]
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Live }
    }

    /// Returns true when mutations must be suppressed.
    #[must_use]
    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::DryRun => write!(f, "dry-run"),
        }
    }
}
