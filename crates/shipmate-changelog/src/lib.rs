//! Changelog rendering and release request naming for Shipmate.

mod naming;
mod render;

pub use naming::{
    file_update_body, file_update_branch, file_update_title, pull_request_body, pull_request_title,
    release_branch, release_name,
};
pub use render::{ChangelogEntry, Section, parse_entries, render};
