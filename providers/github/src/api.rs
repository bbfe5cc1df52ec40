//! GitHub REST client.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use shipmate_commit::RawCommit;
use shipmate_config::AccessToken;
use shipmate_provider::{
    HttpRequest, HttpResponse, Method, ProviderError, ProviderResult, RequestDraft, ReviewRequest,
    ReviewRequestApi, Transport, endpoint,
};
use tracing::debug;

const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct Branch {
    pub commit: CommitRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Tag {
    pub name: String,
    pub commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RefName {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    head: RefName,
    base: RefName,
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct CreatedPullRequest {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct Signature {
    #[serde(default)]
    name: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Signature,
    committer: Signature,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitEntry {
    sha: String,
    commit: CommitDetail,
}

impl CommitEntry {
    pub(crate) fn committed_at(&self) -> DateTime<Utc> {
        self.commit.committer.date
    }
}

impl From<CommitEntry> for RawCommit {
    fn from(entry: CommitEntry) -> Self {
        Self::new(
            entry.sha,
            entry.commit.message,
            entry.commit.author.name,
            entry.commit.author.date,
        )
    }
}

/// Client for one GitHub repository.
#[derive(Clone)]
pub struct GitHubApi {
    transport: Arc<dyn Transport>,
    base_url: String,
    token: AccessToken,
    repository: String,
}

impl std::fmt::Debug for GitHubApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApi")
            .field("base_url", &self.base_url)
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl GitHubApi {
    /// Creates a client for `repository` (`owner/name`).
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        token: AccessToken,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            token,
            repository: repository.into(),
        }
    }

    /// Returns a client for another repository on the same host.
    #[must_use]
    pub fn for_repository(&self, repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            ..self.clone()
        }
    }

    /// Returns the `owner/name` slug.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    fn url(&self, path: &[&str], query: &[(&str, &str)]) -> ProviderResult<String> {
        let mut segments = vec!["repos"];
        segments.extend(self.repository.split('/'));
        segments.extend_from_slice(path);
        endpoint(&self.base_url, &segments, query)
    }

    fn send(&self, method: Method, url: String, body: Option<serde_json::Value>) -> ProviderResult<HttpResponse> {
        let mut request = HttpRequest::new(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if !self.token.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.token.expose()));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        self.transport.send(&request)
    }

    fn expect_success(method: Method, url: &str, response: HttpResponse) -> ProviderResult<HttpResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ProviderError::api(method, url, response.status, &response.body))
        }
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, path: &[&str]) -> ProviderResult<T> {
        let url = self.url(path, &[])?;
        let response = self.send(Method::Get, url.clone(), None)?;
        Self::expect_success(Method::Get, &url, response)?.json(&url)
    }

    /// GET that maps 404 to `None`.
    pub(crate) fn find<T: DeserializeOwned>(&self, path: &[&str]) -> ProviderResult<Option<T>> {
        let url = self.url(path, &[])?;
        let response = self.send(Method::Get, url.clone(), None)?;
        if response.status == 404 {
            return Ok(None);
        }
        Self::expect_success(Method::Get, &url, response)?
            .json(&url)
            .map(Some)
    }

    /// GETs every page of a list endpoint.
    pub(crate) fn list<T: DeserializeOwned>(&self, path: &[&str], query: &[(&str, &str)]) -> ProviderResult<Vec<T>> {
        let per_page = PER_PAGE.to_string();
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let page = page.to_string();
            let mut pairs = query.to_vec();
            pairs.push(("per_page", per_page.as_str()));
            pairs.push(("page", page.as_str()));

            let url = self.url(path, &pairs)?;
            let response = self.send(Method::Get, url.clone(), None)?;
            let batch: Vec<T> = Self::expect_success(Method::Get, &url, response)?.json(&url)?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }

    pub(crate) fn write(&self, method: Method, path: &[&str], body: Option<serde_json::Value>) -> ProviderResult<HttpResponse> {
        let url = self.url(path, &[])?;
        let response = self.send(method, url.clone(), body)?;
        Self::expect_success(method, &url, response)
    }

    pub(crate) fn tags(&self) -> ProviderResult<Vec<Tag>> {
        self.list(&["tags"], &[])
    }

    pub(crate) fn commits(&self, since: Option<&DateTime<Utc>>) -> ProviderResult<Vec<CommitEntry>> {
        match since {
            Some(date) => {
                let since = date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
                self.list(&["commits"], &[("since", &since)])
            }
            None => self.list(&["commits"], &[]),
        }
    }

    pub(crate) fn branch(&self, name: &str) -> ProviderResult<Option<Branch>> {
        let mut path = vec!["branches"];
        path.extend(name.split('/'));
        self.find(&path)
    }

    pub(crate) fn has_release(&self, tag: &str) -> ProviderResult<bool> {
        Ok(self
            .find::<serde_json::Value>(&["releases", "tags", tag])?
            .is_some())
    }
}

impl ReviewRequestApi for GitHubApi {
    fn open_requests(&self) -> ProviderResult<Vec<ReviewRequest>> {
        let pulls: Vec<PullRequest> = self.list(&["pulls"], &[("state", "open")])?;
        Ok(pulls
            .into_iter()
            .map(|pr| ReviewRequest {
                number: pr.number,
                source: pr.head.name,
                target: pr.base.name,
                title: pr.title,
                body: pr.body.unwrap_or_default(),
                labels: pr.labels.into_iter().map(|l| l.name).collect(),
            })
            .collect())
    }

    fn create_request(&self, draft: &RequestDraft) -> ProviderResult<()> {
        let body = json!({
            "title": draft.title,
            "body": draft.body,
            "head": draft.source,
            "base": draft.target,
        });
        let response = self.write(Method::Post, &["pulls"], Some(body))?;
        let url = self.url(&["pulls"], &[])?;
        let created: CreatedPullRequest = response.json(&url)?;

        // Pull requests take labels through the issues endpoint.
        if !draft.labels.is_empty() {
            let number = created.number.to_string();
            self.write(
                Method::Post,
                &["issues", &number, "labels"],
                Some(json!({ "labels": draft.labels })),
            )?;
        }
        debug!(number = created.number, "opened pull request");
        Ok(())
    }

    fn update_request(&self, number: u64, draft: &RequestDraft) -> ProviderResult<()> {
        let number = number.to_string();
        self.write(
            Method::Patch,
            &["pulls", &number],
            Some(json!({ "title": draft.title, "body": draft.body })),
        )?;
        Ok(())
    }

    fn close_request(&self, number: u64) -> ProviderResult<()> {
        let number = number.to_string();
        self.write(Method::Patch, &["pulls", &number], Some(json!({ "state": "closed" })))?;
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> ProviderResult<()> {
        let mut path = vec!["git", "refs", "heads"];
        path.extend(branch.split('/'));
        self.write(Method::Delete, &path, None)?;
        Ok(())
    }
}
