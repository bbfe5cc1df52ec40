//! In-file version annotations.
//!
//! Two conventions mark version literals to rewrite:
//!
//! ```text
//! image: app:1.2.3 # x-shipmate-version
//!
//! <!-- x-shipmate-version-start -->
//! Install with `cargo install app --version 1.2.3`
//! <!-- x-shipmate-version-end -->
//! ```
//!
//! Config-update jobs use a tagged form, `# x-shipmate:<tag>`, so one file
//! can track versions of several projects.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{GitError, GitResult};

static LINE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<pre>.*?)\d+\.\d+\.\d+(?P<post>.*# x-shipmate-version)")
        .expect("invalid regex")
});

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)(?P<start><!-- x-shipmate-version-start -->)(?P<body>.*?)(?P<end><!-- x-shipmate-version-end -->)",
    )
    .expect("invalid regex")
});

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("invalid regex"));

/// Rewrites line-marker and block-marker annotations to `version`.
#[must_use]
pub fn rewrite_annotations(content: &str, version: &str) -> String {
    let lines = LINE_MARKER_RE.replace_all(content, |caps: &Captures<'_>| {
        format!("{}{version}{}", &caps["pre"], &caps["post"])
    });

    BLOCK_RE
        .replace_all(&lines, |caps: &Captures<'_>| {
            let body = VERSION_RE.replace_all(&caps["body"], version);
            format!("{}{body}{}", &caps["start"], &caps["end"])
        })
        .into_owned()
}

/// Rewrites lines carrying `# x-shipmate:<tag>` to `version`.
#[must_use]
pub fn rewrite_tagged_lines(content: &str, tag: &str, version: &str) -> String {
    let pattern = format!(
        r"(?m)^(?P<pre>.*?)\d+\.\d+\.\d+(?P<post>.*# x-shipmate:{}[ \t\r]*)$",
        regex::escape(tag)
    );
    // The tag is escaped, so the pattern is always valid.
    let Ok(re) = Regex::new(&pattern) else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &Captures<'_>| {
        format!("{}{version}{}", &caps["pre"], &caps["post"])
    })
    .into_owned()
}

/// Applies [`rewrite_annotations`] to a file in place.
///
/// Returns whether the content changed.
///
/// # Errors
///
/// Returns [`GitError::FileNotFound`] if the file does not exist.
pub fn update_annotated_file(path: &Path, version: &str) -> GitResult<bool> {
    rewrite_file(path, |content| rewrite_annotations(content, version))
}

/// Applies [`rewrite_tagged_lines`] to a file in place.
///
/// Returns whether the content changed.
///
/// # Errors
///
/// Returns [`GitError::FileNotFound`] if the file does not exist.
pub fn update_tagged_file(path: &Path, tag: &str, version: &str) -> GitResult<bool> {
    rewrite_file(path, |content| rewrite_tagged_lines(content, tag, version))
}

fn rewrite_file(path: &Path, rewrite: impl FnOnce(&str) -> String) -> GitResult<bool> {
    if !path.exists() {
        return Err(GitError::FileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let updated = rewrite(&content);
    if updated == content {
        return Ok(false);
    }

    fs::write(path, updated)?;
    Ok(true)
}
