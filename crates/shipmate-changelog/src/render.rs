//! Markdown changelog rendering.

use std::collections::HashSet;
use std::fmt::Write;

use shipmate_commit::RawCommit;

/// Changelog section, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    /// `feat` commits.
    Features,
    /// `fix` commits.
    BugFixes,
    /// `chore` commits.
    Chores,
    /// `docs` commits.
    Documentation,
    /// Any other `type:` commit.
    Others,
}

impl Section {
    const ORDER: [Self; 5] = [
        Self::Features,
        Self::BugFixes,
        Self::Chores,
        Self::Documentation,
        Self::Others,
    ];

    fn for_type(commit_type: &str) -> Self {
        match commit_type {
            "feat" => Self::Features,
            "fix" => Self::BugFixes,
            "chore" => Self::Chores,
            "docs" => Self::Documentation,
            _ => Self::Others,
        }
    }

    /// Returns the section heading.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Features => "Features",
            Self::BugFixes => "Bug Fixes",
            Self::Chores => "Chores",
            Self::Documentation => "Documentation",
            Self::Others => "Others",
        }
    }
}

/// One changelog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// Section the commit belongs to.
    pub section: Section,
    /// Subject text after the `type:` prefix.
    pub text: String,
    /// Commit id.
    pub id: String,
}

/// Extracts entries from commits whose first line is `type: text`; others
/// are skipped.
///
/// Scope and `!` markers are dropped from the type before bucketing.
#[must_use]
pub fn parse_entries(commits: &[RawCommit]) -> Vec<ChangelogEntry> {
    commits
        .iter()
        .filter_map(|commit| {
            let (head, rest) = commit.subject().split_once(':')?;
            let commit_type = head
                .split('(')
                .next()
                .unwrap_or(head)
                .trim()
                .trim_end_matches('!');
            let text = rest.trim();
            if commit_type.is_empty() || text.is_empty() {
                return None;
            }

            Some(ChangelogEntry {
                section: Section::for_type(commit_type),
                text: text.to_string(),
                id: commit.id.clone(),
            })
        })
        .collect()
}

/// Renders commits as markdown sections with commit links.
///
/// Entries with the same text are listed once. Without a project URL the
/// entries are plain text.
#[must_use]
pub fn render(commits: &[RawCommit], project_url: &str) -> String {
    let mut seen = HashSet::new();
    let entries: Vec<ChangelogEntry> = parse_entries(commits)
        .into_iter()
        .filter(|entry| seen.insert(entry.text.clone()))
        .collect();

    let project_url = project_url.trim_end_matches('/');
    let mut output = String::new();

    for section in Section::ORDER {
        let mut lines = entries.iter().filter(|e| e.section == section).peekable();
        if lines.peek().is_none() {
            continue;
        }

        if !output.is_empty() {
            output.push('\n');
        }
        _ = writeln!(output, "## {}", section.title());
        for entry in lines {
            if project_url.is_empty() {
                _ = writeln!(output, "- {}", entry.text);
            } else {
                _ = writeln!(output, "- [{}]({project_url}/commit/{})", entry.text, entry.id);
            }
        }
    }

    output
}
