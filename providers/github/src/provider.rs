//! [`Provider`] implementation for GitHub.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use shipmate_changelog::{release_branch, release_name};
use shipmate_commit::RawCommit;
use shipmate_config::{ExecutionMode, ExtraFileConfig};
use shipmate_provider::{
    Connection, EnsuredBranch, Method, Outcome, PlannedAction, Provider, ProviderError,
    ProviderResult, RequestDraft, Transport, WorkingTree, ensure_request, execute,
    highest_version, is_full_history, propagate,
};
use shipmate_versioning::{ReleaseManifest, Version, VersionDecision};
use tracing::{debug, info, warn};

use crate::GitHubApi;
use crate::api::Branch;

/// GitHub hosting backend.
#[derive(Debug)]
pub struct GitHubProvider {
    api: GitHubApi,
    connection: Connection,
    worktree: Option<WorkingTree>,
}

impl GitHubProvider {
    /// Creates a provider for `repository` (`owner/name`).
    pub fn new(
        repository: impl Into<String>,
        api_url: impl Into<String>,
        connection: Connection,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api = GitHubApi::new(transport, api_url, connection.token.clone(), repository);
        Self {
            api,
            connection,
            worktree: None,
        }
    }

    /// Sets the local clone used for commits.
    #[must_use]
    pub fn with_worktree(mut self, worktree: WorkingTree) -> Self {
        self.worktree = Some(worktree);
        self
    }

    fn worktree(&self) -> ProviderResult<&WorkingTree> {
        self.worktree.as_ref().ok_or(ProviderError::NoWorkingTree)
    }

    fn release_in(
        api: &GitHubApi,
        tag: &str,
        branch: &str,
        description: &str,
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome> {
        if api.has_release(tag)? {
            info!(repository = api.repository(), tag, "release already exists");
            return Ok(Outcome::Unchanged);
        }

        let action = PlannedAction::CreateRelease {
            repository: api.repository().to_string(),
            tag: tag.to_string(),
            target: branch.to_string(),
        };
        execute(mode, action, || {
            let body = json!({
                "tag_name": tag,
                "target_commitish": branch,
                "name": release_name(tag),
                "body": description,
            });
            api.write(Method::Post, &["releases"], Some(body))?;
            Ok(())
        })
    }
}

impl Provider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn check_or_create_branch(
        &self,
        base: &str,
        version: &Version,
        prefix: &str,
        mode: ExecutionMode,
    ) -> ProviderResult<EnsuredBranch> {
        let name = release_branch(prefix, &version.to_string());
        if self.api.branch(&name)?.is_some() {
            debug!(branch = %name, "release branch exists");
            return Ok(EnsuredBranch {
                name,
                outcome: Outcome::Unchanged,
            });
        }

        let mut path = vec!["branches"];
        path.extend(base.split('/'));
        let base_branch: Branch = self.api.get(&path)?;

        let action = PlannedAction::CreateBranch {
            repository: self.api.repository().to_string(),
            branch: name.clone(),
            from: base.to_string(),
        };
        let outcome = execute(mode, action, || {
            let body = json!({
                "ref": format!("refs/heads/{name}"),
                "sha": base_branch.commit.sha,
            });
            self.api.write(Method::Post, &["git", "refs"], Some(body))?;
            Ok(())
        })?;

        Ok(EnsuredBranch { name, outcome })
    }

    fn commit_manifest(
        &self,
        branch: &str,
        manifest: &ReleaseManifest,
        decision: &VersionDecision,
        extra_files: &[ExtraFileConfig],
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome> {
        debug!(branch, current = %decision.current, next = %decision.next, "committing manifest");
        self.worktree()?
            .commit_manifest(branch, manifest, extra_files, mode)
    }

    fn check_create_release_pull_request(
        &self,
        source: &str,
        target: &str,
        decision: &VersionDecision,
        mode: ExecutionMode,
    ) -> ProviderResult<Vec<Outcome>> {
        let draft = RequestDraft::release(self, source, target, decision, &self.connection.project_url)?;
        ensure_request(&self.api, &draft, mode, true)
    }

    fn create_release(
        &self,
        base: &str,
        decision: &VersionDecision,
        description: &str,
        mode: ExecutionMode,
    ) -> ProviderResult<Vec<Outcome>> {
        let tag = decision.current.to_string();
        let primary = Self::release_in(&self.api, &tag, base, description, mode)?;

        propagate(
            vec![primary],
            &self.connection.propagation_targets,
            base,
            |target, branch| {
                let api = self.api.for_repository(&target.target);
                Self::release_in(&api, &tag, branch, description, mode)
            },
        )
    }

    fn check_release(&self, decision: &VersionDecision) -> ProviderResult<bool> {
        let tag = decision.current.to_string();
        let exists = self.api.tags()?.iter().any(|t| t.name == tag);
        debug!(tag, exists, "checked release tag");
        Ok(exists)
    }

    fn commits_since_release(&self, tag: &str) -> ProviderResult<Vec<RawCommit>> {
        if is_full_history(tag) {
            return Ok(self.api.commits(None)?.into_iter().map(Into::into).collect());
        }

        let tags = self.api.tags()?;
        let Some(found) = tags.iter().find(|t| t.name == tag) else {
            warn!(tag, "release tag not found, using full history");
            return Ok(self.api.commits(None)?.into_iter().map(Into::into).collect());
        };

        let sha = &found.commit.sha;
        let tagged: crate::api::CommitEntry = self.api.get(&["commits", sha])?;
        let since = tagged.committed_at();

        let commits: Vec<RawCommit> = self
            .api
            .commits(Some(&since))?
            .into_iter()
            .map(RawCommit::from)
            .filter(|c| c.id != *sha)
            .collect();
        debug!(tag, count = commits.len(), "collected commits since release");
        Ok(commits)
    }

    fn highest_release(&self) -> ProviderResult<Version> {
        let tags = self.api.tags()?;
        Ok(highest_version(tags.iter().map(|t| t.name.as_str())))
    }

    fn commit_tagged_lines(
        &self,
        branch: &str,
        tag: &str,
        version: &Version,
        files: &[PathBuf],
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome> {
        self.worktree()?
            .commit_tagged_lines(branch, tag, version, files, mode)
    }

    fn check_create_file_pull_request(
        &self,
        source: &str,
        target: &str,
        tag: &str,
        version: &Version,
        mode: ExecutionMode,
    ) -> ProviderResult<Vec<Outcome>> {
        let draft = RequestDraft::file_update(source, target, tag, version);
        ensure_request(&self.api, &draft, mode, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipmate_commit::Severity;
    use shipmate_config::{AccessToken, PropagationTarget};
    use shipmate_provider::FakeTransport;

    const API: &str = "https://api.test";
    const REPO: &str = "https://api.test/repos/acme/app";

    fn provider(fake: &Arc<FakeTransport>, targets: Vec<PropagationTarget>) -> GitHubProvider {
        let connection = Connection {
            token: AccessToken::new("ghp_test"),
            project_url: "https://github.com/acme/app".into(),
            propagation_targets: targets,
        };
        let transport: Arc<dyn Transport> = fake.clone();
        GitHubProvider::new("acme/app", API, connection, transport)
    }

    fn decision(current: &str, next: &str) -> VersionDecision {
        VersionDecision {
            current: Version::parse(current).unwrap(),
            next: Version::parse(next).unwrap(),
            has_next: current != next,
            bump: Severity::Minor,
        }
    }

    fn commit_json(sha: &str, message: &str, date: &str) -> serde_json::Value {
        json!({
            "sha": sha,
            "commit": {
                "message": message,
                "author": { "name": "Dev", "date": date },
                "committer": { "name": "Dev", "date": date },
            },
        })
    }

    #[test]
    fn test_existing_branch_is_not_recreated() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{REPO}/branches/release-v1.3.0"), 200, r#"{"commit":{"sha":"abc"}}"#);
        let provider = provider(&fake, vec![]);

        let version = Version::parse("v1.3.0").unwrap();
        let first = provider
            .check_or_create_branch("main", &version, "release", ExecutionMode::Live)
            .unwrap();
        let second = provider
            .check_or_create_branch("main", &version, "release", ExecutionMode::Live)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "release-v1.3.0");
        assert_eq!(first.outcome, Outcome::Unchanged);
        assert_eq!(fake.mutation_count(), 0);
    }

    #[test]
    fn test_missing_branch_created_from_base_tip() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{REPO}/branches/main"), 200, r#"{"commit":{"sha":"base123"}}"#)
            .on(Method::Post, &format!("{REPO}/git/refs"), 201, "{}");
        let provider = provider(&fake, vec![]);

        let ensured = provider
            .check_or_create_branch("main", &Version::parse("1.3.0").unwrap(), "", ExecutionMode::Live)
            .unwrap();

        assert_eq!(ensured.name, "release-1.3.0");
        assert!(ensured.outcome.is_applied());
        let posts = fake.requests_with(Method::Post);
        assert_eq!(posts.len(), 1);
        let body = posts[0].body.as_ref().unwrap();
        assert_eq!(body["ref"], "refs/heads/release-1.3.0");
        assert_eq!(body["sha"], "base123");
    }

    #[test]
    fn test_branch_creation_dry_run() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{REPO}/branches/main"), 200, r#"{"commit":{"sha":"base123"}}"#);
        let provider = provider(&fake, vec![]);

        let ensured = provider
            .check_or_create_branch("main", &Version::parse("1.3.0").unwrap(), "release", ExecutionMode::DryRun)
            .unwrap();

        assert!(matches!(ensured.outcome, Outcome::Planned(PlannedAction::CreateBranch { .. })));
        assert_eq!(fake.mutation_count(), 0);
    }

    #[test]
    fn test_requests_carry_auth_headers() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{REPO}/tags"), 200, "[]");
        provider(&fake, vec![]).highest_release().unwrap();

        let request = &fake.requests()[0];
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer ghp_test".to_string())));
        assert!(request
            .headers
            .contains(&("Accept".to_string(), "application/vnd.github+json".to_string())));
    }

    #[test]
    fn test_check_release_matches_current_tag() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            Method::Get,
            &format!("{REPO}/tags"),
            200,
            r#"[{"name":"v1.2.3","commit":{"sha":"t1"}},{"name":"v1.2.2","commit":{"sha":"t0"}}]"#,
        );
        let provider = provider(&fake, vec![]);

        assert!(provider.check_release(&decision("v1.2.3", "v1.2.3")).unwrap());
        assert!(!provider.check_release(&decision("v1.2.4", "v1.2.4")).unwrap());
    }

    #[test]
    fn test_highest_release_skips_invalid_tags() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            Method::Get,
            &format!("{REPO}/tags"),
            200,
            r#"[{"name":"nightly","commit":{"sha":"n"}},{"name":"v2.0.0","commit":{"sha":"a"}},{"name":"v10.0.0-rc.1","commit":{"sha":"b"}}]"#,
        );

        let highest = provider(&fake, vec![]).highest_release().unwrap();
        assert_eq!(highest.to_string(), "v10.0.0-rc.1");
    }

    #[test]
    fn test_commits_since_release_excludes_tagged_commit() {
        let fake = Arc::new(FakeTransport::new());
        let commits = json!([
            commit_json("c2", "feat: new api", "2024-03-02T10:00:00Z"),
            commit_json("t1", "release: update files for version 1.2.3", "2024-03-01T10:00:00Z"),
        ]);
        fake.on(Method::Get, &format!("{REPO}/tags"), 200, r#"[{"name":"v1.2.3","commit":{"sha":"t1"}}]"#)
            .on(
                Method::Get,
                &format!("{REPO}/commits/t1"),
                200,
                &commit_json("t1", "release", "2024-03-01T10:00:00Z").to_string(),
            )
            .on(Method::Get, &format!("{REPO}/commits"), 200, &commits.to_string());

        let found = provider(&fake, vec![]).commits_since_release("v1.2.3").unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c2");
        let listing = fake
            .requests()
            .into_iter()
            .find(|r| r.url.starts_with(&format!("{REPO}/commits?")))
            .unwrap();
        assert!(listing.url.contains("since=2024-03-01T10%3A00%3A00Z"));
    }

    #[test]
    fn test_commits_since_unknown_tag_is_full_history() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{REPO}/tags"), 200, "[]").on(
            Method::Get,
            &format!("{REPO}/commits"),
            200,
            &json!([commit_json("c1", "fix: a", "2024-01-01T00:00:00Z")]).to_string(),
        );

        let found = provider(&fake, vec![]).commits_since_release("v9.9.9").unwrap();
        assert_eq!(found.len(), 1);
        assert!(fake.requests().iter().all(|r| !r.url.contains("since=")));
    }

    #[test]
    fn test_release_pull_request_created_with_label() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{REPO}/tags"), 200, "[]")
            .on(
                Method::Get,
                &format!("{REPO}/commits"),
                200,
                &json!([commit_json("c1", "feat: dark mode", "2024-01-01T00:00:00Z")]).to_string(),
            )
            .on(Method::Get, &format!("{REPO}/pulls"), 200, "[]")
            .on(Method::Post, &format!("{REPO}/pulls"), 201, r#"{"number":12}"#)
            .on(Method::Post, &format!("{REPO}/issues/12/labels"), 200, "[]");

        let outcomes = provider(&fake, vec![])
            .check_create_release_pull_request("release-v1.3.0", "main", &decision("v1.2.3", "v1.3.0"), ExecutionMode::Live)
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        let posts = fake.requests_with(Method::Post);
        let created = posts[0].body.as_ref().unwrap();
        assert_eq!(created["title"], "Release v1.3.0");
        assert_eq!(created["head"], "release-v1.3.0");
        assert!(created["body"].as_str().unwrap().contains("[dark mode](https://github.com/acme/app/commit/c1)"));
        assert_eq!(posts[1].body.as_ref().unwrap()["labels"], json!(["release"]));
    }

    #[test]
    fn test_stale_release_pull_request_closed() {
        let fake = Arc::new(FakeTransport::new());
        let open = json!([
            {
                "number": 3,
                "title": "Release v1.2.4",
                "body": null,
                "head": { "ref": "release-v1.2.4" },
                "base": { "ref": "main" },
                "labels": [{ "name": "release" }],
            }
        ]);
        fake.on(Method::Get, &format!("{REPO}/tags"), 200, "[]")
            .on(Method::Get, &format!("{REPO}/commits"), 200, "[]")
            .on(Method::Get, &format!("{REPO}/pulls"), 200, &open.to_string())
            .on(Method::Post, &format!("{REPO}/pulls"), 201, r#"{"number":4}"#)
            .on(Method::Post, &format!("{REPO}/issues/4/labels"), 200, "[]")
            .on(Method::Patch, &format!("{REPO}/pulls/3"), 200, "{}")
            .on(Method::Delete, &format!("{REPO}/git/refs/heads/release-v1.2.4"), 204, "");

        provider(&fake, vec![])
            .check_create_release_pull_request("release-v1.3.0", "main", &decision("v1.2.3", "v1.3.0"), ExecutionMode::Live)
            .unwrap();

        let patch = &fake.requests_with(Method::Patch)[0];
        assert_eq!(patch.body.as_ref().unwrap()["state"], "closed");
        assert_eq!(fake.requests_with(Method::Delete).len(), 1);
    }

    #[test]
    fn test_create_release_posts_current_tag() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Post, &format!("{REPO}/releases"), 201, "{}");
        let provider = provider(&fake, vec![]);

        let outcomes = provider
            .create_release("main", &decision("v1.2.3", "v1.2.3"), "notes", ExecutionMode::Live)
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        let body = fake.requests_with(Method::Post)[0].body.clone().unwrap();
        assert_eq!(body["tag_name"], "v1.2.3");
        assert_eq!(body["target_commitish"], "main");
        assert_eq!(body["name"], "Release v1.2.3");
        assert_eq!(body["body"], "notes");
    }

    #[test]
    fn test_existing_release_is_unchanged() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{REPO}/releases/tags/v1.2.3"), 200, "{}");

        let outcomes = provider(&fake, vec![])
            .create_release("main", &decision("v1.2.3", "v1.2.3"), "", ExecutionMode::Live)
            .unwrap();

        assert_eq!(outcomes, vec![Outcome::Unchanged]);
        assert_eq!(fake.mutation_count(), 0);
    }

    #[test]
    fn test_propagation_failure_is_aggregated() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Post, &format!("{REPO}/releases"), 201, "{}")
            .on(Method::Post, "https://api.test/repos/acme/ok/releases", 201, "{}")
            .on(Method::Post, "https://api.test/repos/acme/broken/releases", 403, "forbidden")
            .on(Method::Post, "https://api.test/repos/acme/later/releases", 201, "{}");
        let targets = ["acme/ok", "acme/broken", "acme/later"]
            .into_iter()
            .map(|target| PropagationTarget {
                target: target.into(),
                target_branch: String::new(),
                description: String::new(),
            })
            .collect();

        let err = provider(&fake, targets)
            .create_release("main", &decision("v1.2.3", "v1.2.3"), "", ExecutionMode::Live)
            .unwrap_err();

        let ProviderError::Propagation { completed, failures } = err else {
            panic!("expected Propagation");
        };
        assert_eq!(completed.len(), 3);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "acme/broken");
        assert_eq!(fake.requests_with(Method::Post).len(), 4);
    }

    #[test]
    fn test_commit_without_worktree_fails() {
        let fake = Arc::new(FakeTransport::new());
        let result = provider(&fake, vec![]).commit_manifest(
            "release-1.3.0",
            &ReleaseManifest::new(Version::parse("1.3.0").unwrap()),
            &decision("1.2.3", "1.3.0"),
            &[],
            ExecutionMode::Live,
        );
        assert!(matches!(result, Err(ProviderError::NoWorkingTree)));
    }
}
