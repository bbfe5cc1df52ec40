//! GitLab REST client.

use std::fmt;
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

const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct TagCommit {
    pub id: String,
    pub committed_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Tag {
    pub name: String,
    pub commit: TagCommit,
}

#[derive(Debug, Deserialize)]
struct MergeRequest {
    iid: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Commit {
    id: String,
    message: String,
    #[serde(default)]
    author_name: String,
    authored_date: DateTime<Utc>,
}

impl From<Commit> for RawCommit {
    fn from(commit: Commit) -> Self {
        Self::new(commit.id, commit.message, commit.author_name, commit.authored_date)
    }
}

/// Client for one GitLab project.
#[derive(Clone)]
pub struct GitLabApi {
    transport: Arc<dyn Transport>,
    base_url: String,
    token: AccessToken,
    project: String,
}

impl fmt::Debug for GitLabApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabApi")
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl GitLabApi {
    /// Creates a client for `project`, a numeric id or `group/name` path.
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        token: AccessToken,
        project: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            token,
            project: project.into(),
        }
    }

    /// Returns a client for another project on the same instance.
    #[must_use]
    pub fn for_project(&self, project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..self.clone()
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    fn url(&self, path: &[&str], query: &[(&str, &str)]) -> ProviderResult<String> {
        let mut segments = vec!["projects", self.project.as_str()];
        segments.extend_from_slice(path);
        endpoint(&self.base_url, &segments, query)
    }

    fn send(&self, method: Method, url: &str, body: Option<serde_json::Value>) -> ProviderResult<HttpResponse> {
        let mut request = HttpRequest::new(method, url);
        if !self.token.is_empty() {
            request = request.header("PRIVATE-TOKEN", self.token.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.transport.send(&request)?;
        if response.is_success() || (method == Method::Get && response.status == 404) {
            Ok(response)
        } else {
            Err(ProviderError::api(method, url, response.status, &response.body))
        }
    }

    /// GET that maps 404 to `None`.
    pub(crate) fn find<T: DeserializeOwned>(&self, path: &[&str]) -> ProviderResult<Option<T>> {
        let url = self.url(path, &[])?;
        let response = self.send(Method::Get, &url, None)?;
        if response.status == 404 {
            return Ok(None);
        }
        response.json(&url).map(Some)
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
            let response = self.send(Method::Get, &url, None)?;
            if response.status == 404 {
                return Err(ProviderError::api(Method::Get, url, 404, &response.body));
            }
            let batch: Vec<T> = response.json(&url)?;
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
        self.send(method, &url, body)
    }

    pub(crate) fn tags(&self) -> ProviderResult<Vec<Tag>> {
        self.list(&["repository", "tags"], &[])
    }

    pub(crate) fn commits(&self, since: Option<&DateTime<Utc>>) -> ProviderResult<Vec<Commit>> {
        match since {
            Some(date) => {
                let since = date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
                self.list(&["repository", "commits"], &[("since", &since)])
            }
            None => self.list(&["repository", "commits"], &[]),
        }
    }

    pub(crate) fn has_branch(&self, name: &str) -> ProviderResult<bool> {
        Ok(self
            .find::<serde_json::Value>(&["repository", "branches", name])?
            .is_some())
    }

    pub(crate) fn has_release(&self, tag: &str) -> ProviderResult<bool> {
        Ok(self.find::<serde_json::Value>(&["releases", tag])?.is_some())
    }
}

impl ReviewRequestApi for GitLabApi {
    fn open_requests(&self) -> ProviderResult<Vec<ReviewRequest>> {
        let requests: Vec<MergeRequest> = self.list(&["merge_requests"], &[("state", "opened")])?;
        Ok(requests
            .into_iter()
            .map(|mr| ReviewRequest {
                number: mr.iid,
                source: mr.source_branch,
                target: mr.target_branch,
                title: mr.title,
                body: mr.description.unwrap_or_default(),
                labels: mr.labels,
            })
            .collect())
    }

    fn create_request(&self, draft: &RequestDraft) -> ProviderResult<()> {
        let body = json!({
            "source_branch": draft.source,
            "target_branch": draft.target,
            "title": draft.title,
            "description": draft.body,
            "labels": draft.labels,
            "remove_source_branch": true,
        });
        self.write(Method::Post, &["merge_requests"], Some(body))?;
        Ok(())
    }

    fn update_request(&self, number: u64, draft: &RequestDraft) -> ProviderResult<()> {
        let iid = number.to_string();
        self.write(
            Method::Put,
            &["merge_requests", &iid],
            Some(json!({ "title": draft.title, "description": draft.body })),
        )?;
        Ok(())
    }

    fn close_request(&self, number: u64) -> ProviderResult<()> {
        let iid = number.to_string();
        self.write(
            Method::Put,
            &["merge_requests", &iid],
            Some(json!({ "state_event": "close" })),
        )?;
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> ProviderResult<()> {
        self.write(Method::Delete, &["repository", "branches", branch], None)?;
        Ok(())
    }
}
