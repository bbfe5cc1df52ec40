//! [`Provider`] implementation for GitLab.

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

use crate::GitLabApi;

/// GitLab hosting backend.
#[derive(Debug)]
pub struct GitLabProvider {
    api: GitLabApi,
    connection: Connection,
    worktree: Option<WorkingTree>,
}

impl GitLabProvider {
    /// Creates a provider for project `project_id`.
    pub fn new(
        project_id: u64,
        api_url: impl Into<String>,
        connection: Connection,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api = GitLabApi::new(
            transport,
            api_url,
            connection.token.clone(),
            project_id.to_string(),
        );
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
        api: &GitLabApi,
        tag: &str,
        branch: &str,
        description: &str,
        mode: ExecutionMode,
    ) -> ProviderResult<Outcome> {
        if api.has_release(tag)? {
            info!(project = api.project(), tag, "release already exists");
            return Ok(Outcome::Unchanged);
        }

        let action = PlannedAction::CreateRelease {
            repository: api.project().to_string(),
            tag: tag.to_string(),
            target: branch.to_string(),
        };
        execute(mode, action, || {
            let body = json!({
                "tag_name": tag,
                "ref": branch,
                "name": release_name(tag),
                "description": description,
            });
            api.write(Method::Post, &["releases"], Some(body))?;
            Ok(())
        })
    }

    fn full_history(&self) -> ProviderResult<Vec<RawCommit>> {
        Ok(self.api.commits(None)?.into_iter().map(Into::into).collect())
    }
}

impl Provider for GitLabProvider {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn check_or_create_branch(
        &self,
        base: &str,
        version: &Version,
        prefix: &str,
        mode: ExecutionMode,
    ) -> ProviderResult<EnsuredBranch> {
        let name = release_branch(prefix, &version.to_string());
        if self.api.has_branch(&name)? {
            debug!(branch = %name, "release branch exists");
            return Ok(EnsuredBranch {
                name,
                outcome: Outcome::Unchanged,
            });
        }

        let action = PlannedAction::CreateBranch {
            repository: self.api.project().to_string(),
            branch: name.clone(),
            from: base.to_string(),
        };
        let outcome = execute(mode, action, || {
            self.api.write(
                Method::Post,
                &["repository", "branches"],
                Some(json!({ "branch": name, "ref": base })),
            )?;
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
                let api = self.api.for_project(&target.target);
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
            return self.full_history();
        }

        let tags = self.api.tags()?;
        let Some(found) = tags.iter().find(|t| t.name == tag) else {
            warn!(tag, "release tag not found, using full history");
            return self.full_history();
        };

        let commits: Vec<RawCommit> = self
            .api
            .commits(Some(&found.commit.committed_date))?
            .into_iter()
            .map(RawCommit::from)
            .filter(|c| c.id != found.commit.id)
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
    use shipmate_git::{GitError, GitResult, Workspace};
    use shipmate_provider::FakeTransport;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const API: &str = "https://gitlab.test/api/v4";
    const PROJECT: &str = "https://gitlab.test/api/v4/projects/42";

    fn provider(fake: &Arc<FakeTransport>, targets: Vec<PropagationTarget>) -> GitLabProvider {
        let connection = Connection {
            token: AccessToken::new("glpat-test"),
            project_url: "https://gitlab.test/acme/app".into(),
            propagation_targets: targets,
        };
        let transport: Arc<dyn Transport> = fake.clone();
        GitLabProvider::new(42, API, connection, transport)
    }

    fn decision(current: &str, next: &str) -> VersionDecision {
        VersionDecision {
            current: Version::parse(current).unwrap(),
            next: Version::parse(next).unwrap(),
            has_next: current != next,
            bump: Severity::Patch,
        }
    }

    fn merge_request(iid: u64, source: &str, title: &str, description: &str) -> serde_json::Value {
        json!({
            "iid": iid,
            "title": title,
            "description": description,
            "source_branch": source,
            "target_branch": "main",
            "labels": ["release"],
        })
    }

    #[test]
    fn test_branch_created_with_private_token() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Post, &format!("{PROJECT}/repository/branches"), 201, "{}");

        let ensured = provider(&fake, vec![])
            .check_or_create_branch("main", &Version::parse("1.2.4").unwrap(), "release", ExecutionMode::Live)
            .unwrap();

        assert_eq!(ensured.name, "release-1.2.4");
        let post = &fake.requests_with(Method::Post)[0];
        assert_eq!(post.body.as_ref().unwrap()["branch"], "release-1.2.4");
        assert_eq!(post.body.as_ref().unwrap()["ref"], "main");
        assert!(post
            .headers
            .contains(&("PRIVATE-TOKEN".to_string(), "glpat-test".to_string())));
    }

    #[test]
    fn test_existing_branch_is_unchanged() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{PROJECT}/repository/branches/release-1.2.4"), 200, "{}");

        let ensured = provider(&fake, vec![])
            .check_or_create_branch("main", &Version::parse("1.2.4").unwrap(), "release", ExecutionMode::Live)
            .unwrap();

        assert_eq!(ensured.outcome, Outcome::Unchanged);
        assert_eq!(fake.mutation_count(), 0);
    }

    #[test]
    fn test_release_request_twice_yields_one_request() {
        let fake = Arc::new(FakeTransport::new());
        let next = decision("1.2.3", "1.2.4");
        let body = "This is the release pull request for version 1.2.4.\n\n## Changelog\n\n";
        fake.on(Method::Get, &format!("{PROJECT}/repository/tags"), 200, "[]")
            .on(Method::Get, &format!("{PROJECT}/repository/commits"), 200, "[]")
            .on(Method::Get, &format!("{PROJECT}/merge_requests"), 200, "[]")
            .on(
                Method::Get,
                &format!("{PROJECT}/merge_requests"),
                200,
                &json!([merge_request(9, "release-1.2.4", "Release 1.2.4", body)]).to_string(),
            )
            .on(Method::Post, &format!("{PROJECT}/merge_requests"), 201, r#"{"iid":9}"#);
        let provider = provider(&fake, vec![]);

        let first = provider
            .check_create_release_pull_request("release-1.2.4", "main", &next, ExecutionMode::Live)
            .unwrap();
        let second = provider
            .check_create_release_pull_request("release-1.2.4", "main", &next, ExecutionMode::Live)
            .unwrap();

        assert!(first[0].is_applied());
        assert_eq!(second, vec![Outcome::Unchanged]);
        let posts = fake.requests_with(Method::Post);
        assert_eq!(posts.len(), 1);
        let created = posts[0].body.as_ref().unwrap();
        assert_eq!(created["title"], "Release 1.2.4");
        assert_eq!(created["description"], body);
        assert_eq!(created["labels"], json!(["release"]));
    }

    #[test]
    fn test_stale_merge_request_closed_with_state_event() {
        let fake = Arc::new(FakeTransport::new());
        let open = json!([
            merge_request(5, "release-1.2.4", "Release 1.2.4", "old"),
            merge_request(6, "release-1.3.0", "Release 1.3.0", "old"),
        ]);
        fake.on(Method::Get, &format!("{PROJECT}/repository/tags"), 200, "[]")
            .on(Method::Get, &format!("{PROJECT}/repository/commits"), 200, "[]")
            .on(Method::Get, &format!("{PROJECT}/merge_requests"), 200, &open.to_string())
            .on(Method::Put, &format!("{PROJECT}/merge_requests/6"), 200, "{}")
            .on(Method::Put, &format!("{PROJECT}/merge_requests/5"), 200, "{}")
            .on(Method::Delete, &format!("{PROJECT}/repository/branches/release-1.2.4"), 204, "");

        let outcomes = provider(&fake, vec![])
            .check_create_release_pull_request("release-1.3.0", "main", &decision("1.2.3", "1.3.0"), ExecutionMode::Live)
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        let puts = fake.requests_with(Method::Put);
        assert!(puts[0].url.ends_with("/merge_requests/6"));
        assert_eq!(puts[0].body.as_ref().unwrap()["title"], "Release 1.3.0");
        assert!(puts[1].url.ends_with("/merge_requests/5"));
        assert_eq!(puts[1].body.as_ref().unwrap()["state_event"], "close");
        assert_eq!(fake.requests_with(Method::Delete).len(), 1);
    }

    #[test]
    fn test_file_request_keeps_release_requests_open() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            Method::Get,
            &format!("{PROJECT}/merge_requests"),
            200,
            &json!([merge_request(5, "release-1.2.4", "Release 1.2.4", "")]).to_string(),
        )
        .on(Method::Post, &format!("{PROJECT}/merge_requests"), 201, r#"{"iid":7}"#);

        provider(&fake, vec![])
            .check_create_file_pull_request(
                "release/replace-api-2.0.0",
                "main",
                "api",
                &Version::parse("2.0.0").unwrap(),
                ExecutionMode::Live,
            )
            .unwrap();

        assert_eq!(fake.mutation_count(), 1);
        let created = fake.requests_with(Method::Post)[0].body.clone().unwrap();
        assert_eq!(created["title"], "Update api to 2.0.0");
        assert_eq!(created["labels"], json!([]));
    }

    #[test]
    fn test_commits_since_release_uses_tag_date() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(
            Method::Get,
            &format!("{PROJECT}/repository/tags"),
            200,
            r#"[{"name":"1.2.3","commit":{"id":"t1","committed_date":"2024-05-01T08:30:00Z"}}]"#,
        )
        .on(
            Method::Get,
            &format!("{PROJECT}/repository/commits"),
            200,
            r#"[
                {"id":"c1","message":"fix: crash","author_name":"Dev","authored_date":"2024-05-02T08:30:00Z"},
                {"id":"t1","message":"release","author_name":"Bot","authored_date":"2024-05-01T08:30:00Z"}
            ]"#,
        );

        let commits = provider(&fake, vec![]).commits_since_release("1.2.3").unwrap();

        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "fix: crash");
        assert!(fake
            .requests()
            .iter()
            .any(|r| r.url.contains("since=2024-05-01T08%3A30%3A00Z")));
    }

    #[test]
    fn test_commits_since_zero_is_full_history() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Get, &format!("{PROJECT}/repository/commits"), 200, "[]");

        provider(&fake, vec![]).commits_since_release("0.0.0").unwrap();

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].url.contains("since="));
    }

    #[test]
    fn test_create_release_dry_run() {
        let fake = Arc::new(FakeTransport::new());
        let outcomes = provider(&fake, vec![])
            .create_release("main", &decision("1.2.3", "1.2.3"), "", ExecutionMode::DryRun)
            .unwrap();

        assert!(matches!(
            &outcomes[0],
            Outcome::Planned(PlannedAction::CreateRelease { tag, .. }) if tag == "1.2.3"
        ));
        assert_eq!(fake.mutation_count(), 0);
    }

    #[test]
    fn test_release_propagates_to_target_branch() {
        let fake = Arc::new(FakeTransport::new());
        fake.on(Method::Post, &format!("{PROJECT}/releases"), 201, "{}")
            .on(Method::Post, &format!("{API}/projects/77/releases"), 201, "{}");
        let targets = vec![PropagationTarget {
            target: "77".into(),
            target_branch: "stable".into(),
            description: "docs site".into(),
        }];

        let outcomes = provider(&fake, targets)
            .create_release("main", &decision("1.2.3", "1.2.3"), "notes", ExecutionMode::Live)
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let posts = fake.requests_with(Method::Post);
        assert_eq!(posts[0].body.as_ref().unwrap()["ref"], "main");
        assert_eq!(posts[1].body.as_ref().unwrap()["ref"], "stable");
        assert_eq!(posts[1].body.as_ref().unwrap()["description"], "notes");
    }

    struct PushCountingWorkspace {
        root: PathBuf,
        pushes: usize,
    }

    impl Workspace for PushCountingWorkspace {
        fn root(&self) -> &Path {
            &self.root
        }

        fn checkout_branch(&mut self, _branch: &str) -> GitResult<()> {
            Ok(())
        }

        fn stage(&mut self, _paths: &[PathBuf]) -> GitResult<()> {
            Ok(())
        }

        fn commit(&mut self, _message: &str) -> GitResult<Option<String>> {
            Ok(Some("c0ffee".into()))
        }

        fn head_commit(&self) -> GitResult<String> {
            Ok("c0ffee".into())
        }

        fn remote_commit(&self, _branch: &str) -> GitResult<Option<String>> {
            Ok(None)
        }

        fn push(&mut self, branch: &str, force: bool) -> GitResult<()> {
            self.pushes += 1;
            if force {
                Ok(())
            } else {
                Err(GitError::PushConflict {
                    branch: branch.to_string(),
                })
            }
        }

        fn fetch(&mut self, _branch: &str) -> GitResult<()> {
            Ok(())
        }

        fn reset_to_remote(&mut self, _branch: &str) -> GitResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_commit_manifest_recovers_from_conflict() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(FakeTransport::new());
        let workspace = PushCountingWorkspace {
            root: dir.path().to_path_buf(),
            pushes: 0,
        };
        let provider = provider(&fake, vec![]).with_worktree(WorkingTree::new(workspace));

        let outcome = provider
            .commit_manifest(
                "release-1.2.4",
                &ReleaseManifest::new(Version::parse("1.2.4").unwrap()),
                &decision("1.2.3", "1.2.4"),
                &[],
                ExecutionMode::Live,
            )
            .unwrap();

        assert!(outcome.is_applied());
        assert!(fs::read_to_string(dir.path().join(".shipmate-manifest.json"))
            .unwrap()
            .contains("1.2.4"));
    }
}
