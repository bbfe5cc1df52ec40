//! Commit history types for Shipmate.
//!
//! - [`RawCommit`]: a commit as returned by a hosting provider's history API
//! - [`ClassifiedCommit`]: a commit tagged with the [`Severity`] of its change

mod classified;
mod raw;

pub use classified::{ClassifiedCommit, Severity};
pub use raw::RawCommit;
