use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::Github;
use crate::error::{GithubError, Result};
use crate::transport::{
    is_retryable_status, is_retryable_transport_error, retry_delay, truncate_for_error,
};
use crate::types::{Artifact, Comment, CommitStatus, Label, PullRequest, Review};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const REQUEST_TIMEOUT_MS: u64 = 30_000;
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Attempt budget for the two reads that race eventual consistency
/// (pull-request fetch, changed-file listing).
const RETRY_MAX_ATTEMPTS: usize = 5;

pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    retry_base_delay_ms: u64,
}

impl GithubClient {
    pub fn new(token: &str, owner: &str, repo: &str) -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, token, owner, repo)
    }

    pub fn with_api_base(api_base: &str, token: &str, owner: &str, repo: &str) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("mu-terraform-automation"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header).map_err(|_| {
                GithubError::GraphQl {
                    operation: "client setup".to_string(),
                    message: "invalid authorization header".to_string(),
                }
            })?,
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()
            .map_err(|source| GithubError::Transport {
                operation: "client setup".to_string(),
                source,
            })?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
        })
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, tail
        )
    }

    async fn request_json<T, F>(&self, operation: &str, attempts: usize, mut builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let bytes = self.request_bytes(operation, attempts, &mut builder).await?;
        serde_json::from_slice(&bytes).map_err(|source| GithubError::Decode {
            operation: operation.to_string(),
            source,
        })
    }

    async fn request_unit<F>(&self, operation: &str, mut builder: F) -> Result<()>
    where
        F: FnMut() -> reqwest::RequestBuilder,
    {
        self.request_bytes(operation, 1, &mut builder).await.map(|_| ())
    }

    async fn request_bytes<F>(
        &self,
        operation: &str,
        attempts: usize,
        builder: &mut F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let attempts = attempts.max(1);
        let mut attempt = 0_usize;
        loop {
            attempt += 1;
            match builder().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes =
                            response
                                .bytes()
                                .await
                                .map_err(|source| GithubError::Transport {
                                    operation: operation.to_string(),
                                    source,
                                })?;
                        return Ok(bytes.to_vec());
                    }
                    let body = response.text().await.unwrap_or_default();
                    let error = map_error_status(operation, status.as_u16(), &body);
                    // Not-found is permanent; everything else gets the
                    // remaining attempt budget when the status is
                    // transient.
                    if !error.is_not_found()
                        && attempt < attempts
                        && is_retryable_status(status.as_u16())
                    {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt)).await;
                        continue;
                    }
                    return Err(error);
                }
                Err(source) => {
                    if attempt < attempts && is_retryable_transport_error(&source) {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt)).await;
                        continue;
                    }
                    return Err(GithubError::Transport {
                        operation: operation.to_string(),
                        source,
                    });
                }
            }
        }
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        let payload = json!({ "query": query, "variables": variables });
        let envelope: GraphQlEnvelope<T> = self
            .request_json(operation, 1, || {
                self.http
                    .post(format!("{}/graphql", self.api_base))
                    .json(&payload)
            })
            .await?;
        if let Some(errors) = envelope.errors {
            let message = errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GithubError::GraphQl {
                operation: operation.to_string(),
                message,
            });
        }
        envelope.data.ok_or_else(|| GithubError::GraphQl {
            operation: operation.to_string(),
            message: "missing data".to_string(),
        })
    }

    async fn list_open_pull_requests_page(&self, page: usize) -> Result<Vec<RestPullRequest>> {
        let page_value = page.to_string();
        let per_page = PER_PAGE.to_string();
        self.request_json("list pull requests", 1, || {
            self.http.get(self.repo_url("pulls")).query(&[
                ("state", "open"),
                ("sort", "created"),
                ("direction", "asc"),
                ("per_page", per_page.as_str()),
                ("page", page_value.as_str()),
            ])
        })
        .await
    }

    async fn list_artifacts_page(&self, page: usize) -> Result<Vec<RestArtifact>> {
        let page_value = page.to_string();
        let per_page = PER_PAGE.to_string();
        let listing: RestArtifactListing = self
            .request_json("list artifacts", 1, || {
                self.http.get(self.repo_url("actions/artifacts")).query(&[
                    ("per_page", per_page.as_str()),
                    ("page", page_value.as_str()),
                ])
            })
            .await?;
        Ok(listing.artifacts)
    }
}

#[async_trait]
impl Github for GithubClient {
    async fn create_issue_comment(&self, number: u64, body: &str) -> Result<()> {
        let payload = json!({ "body": body });
        self.request_unit("create issue comment", || {
            self.http
                .post(self.repo_url(&format!("issues/{number}/comments")))
                .json(&payload)
        })
        .await
    }

    async fn hide_issue_comment(&self, node_id: &str) -> Result<()> {
        const MUTATION: &str = "\
mutation($input: MinimizeCommentInput!) {\
  minimizeComment(input: $input) {\
    minimizedComment { isMinimized }\
  }\
}";
        let variables = json!({
            "input": { "subjectId": node_id, "classifier": "OUTDATED" }
        });
        let _: Value = self
            .graphql("hide issue comment", MUTATION, variables)
            .await?;
        Ok(())
    }

    async fn create_issue_comment_reaction(&self, comment_id: u64, content: &str) -> Result<()> {
        let payload = json!({ "content": content });
        self.request_unit("create comment reaction", || {
            self.http
                .post(self.repo_url(&format!("issues/comments/{comment_id}/reactions")))
                .json(&payload)
        })
        .await
    }

    async fn create_label(&self, name: &str, description: &str, color: &str) -> Result<()> {
        let mut payload = json!({ "name": name, "description": description });
        if !color.is_empty() {
            payload["color"] = Value::String(color.to_string());
        }
        self.request_unit("create label", || {
            self.http.post(self.repo_url("labels")).json(&payload)
        })
        .await
    }

    async fn delete_label(&self, name: &str) -> Result<()> {
        self.request_unit("delete label", || {
            self.http.delete(self.repo_url(&format!("labels/{name}")))
        })
        .await
    }

    async fn get_label(&self, name: &str) -> Result<Label> {
        self.request_json("get label", 1, || {
            self.http.get(self.repo_url(&format!("labels/{name}")))
        })
        .await
    }

    async fn add_pull_request_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        let payload = json!({ "labels": labels });
        self.request_unit("add labels", || {
            self.http
                .post(self.repo_url(&format!("issues/{number}/labels")))
                .json(&payload)
        })
        .await
    }

    async fn list_reviews(&self, number: u64) -> Result<Vec<Review>> {
        let mut page = 1_usize;
        let mut reviews = Vec::new();
        loop {
            let page_value = page.to_string();
            let per_page = PER_PAGE.to_string();
            let chunk: Vec<RestReview> = self
                .request_json("list reviews", 1, || {
                    self.http
                        .get(self.repo_url(&format!("pulls/{number}/reviews")))
                        .query(&[
                            ("per_page", per_page.as_str()),
                            ("page", page_value.as_str()),
                        ])
                })
                .await?;
            let chunk_len = chunk.len();
            reviews.extend(chunk.into_iter().map(|review| Review {
                user_login: review.user.login,
                state: review.state,
            }));
            if chunk_len < PER_PAGE {
                return Ok(reviews);
            }
            page += 1;
        }
    }

    async fn list_pull_request_comments(&self, number: u64) -> Result<Vec<Comment>> {
        const QUERY: &str = "\
query($owner: String!, $name: String!, $number: Int!, $cursor: String) {\
  repository(owner: $owner, name: $name) {\
    pullRequest(number: $number) {\
      comments(first: 100, after: $cursor) {\
        nodes { id databaseId body author { login } isMinimized }\
        pageInfo { endCursor hasNextPage }\
      }\
    }\
  }\
}";
        let mut cursor: Option<String> = None;
        let mut comments = Vec::new();
        loop {
            let variables = json!({
                "owner": self.owner,
                "name": self.repo,
                "number": number,
                "cursor": cursor,
            });
            let data: CommentQueryData = self
                .graphql("list pull request comments", QUERY, variables)
                .await?;
            let connection = data.repository.pull_request.comments;
            comments.extend(connection.nodes.into_iter().map(|node| Comment {
                id: node.id,
                database_id: node.database_id.unwrap_or_default(),
                body: node.body,
                author_login: node.author.map(|author| author.login).unwrap_or_default(),
                is_minimized: node.is_minimized,
            }));
            if !connection.page_info.has_next_page {
                return Ok(comments);
            }
            cursor = connection.page_info.end_cursor;
        }
    }

    async fn list_pull_requests_by_label(
        &self,
        label: &str,
        limit: usize,
    ) -> Result<Vec<PullRequest>> {
        let mut page = 1_usize;
        let mut matched = Vec::new();
        loop {
            let chunk = self.list_open_pull_requests_page(page).await?;
            let chunk_len = chunk.len();
            for pull_request in chunk {
                if pull_request.labels.iter().any(|entry| entry.name == label) {
                    matched.push(pull_request.into_pull_request());
                    if matched.len() >= limit {
                        return Ok(matched);
                    }
                }
            }
            if chunk_len < PER_PAGE {
                return Ok(matched);
            }
            page += 1;
        }
    }

    async fn find_pull_request_by_label(&self, label: &str) -> Result<Option<PullRequest>> {
        let found = self.list_pull_requests_by_label(label, 1).await?;
        Ok(found.into_iter().next())
    }

    async fn list_files(&self, number: u64) -> Result<Vec<String>> {
        let mut page = 1_usize;
        let mut files = Vec::new();
        loop {
            let page_value = page.to_string();
            let per_page = PER_PAGE.to_string();
            let chunk: Vec<RestCommitFile> = self
                .request_json("list files", RETRY_MAX_ATTEMPTS, || {
                    self.http
                        .get(self.repo_url(&format!("pulls/{number}/files")))
                        .query(&[
                            ("per_page", per_page.as_str()),
                            ("page", page_value.as_str()),
                        ])
                })
                .await?;
            let chunk_len = chunk.len();
            for file in chunk {
                if file.status == "renamed" {
                    if let Some(previous) = file.previous_filename {
                        files.push(file.filename.clone());
                        files.push(previous);
                        continue;
                    }
                }
                files.push(file.filename);
            }
            if chunk_len < PER_PAGE {
                return Ok(files);
            }
            page += 1;
        }
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        let pull_request: RestPullRequest = self
            .request_json("get pull request", RETRY_MAX_ATTEMPTS, || {
                self.http.get(self.repo_url(&format!("pulls/{number}")))
            })
            .await?;
        Ok(pull_request.into_pull_request())
    }

    async fn create_commit_status(&self, status: &CommitStatus) -> Result<()> {
        let payload = json!({
            "state": status.state.as_str(),
            "target_url": status.target_url,
            "description": status.description,
            "context": status.context,
        });
        self.request_unit("create commit status", || {
            self.http
                .post(self.repo_url(&format!("statuses/{}", status.sha)))
                .json(&payload)
        })
        .await
    }

    async fn resolve_latest_artifacts(&self, names: &[String]) -> Result<HashMap<String, Artifact>> {
        let mut page = 1_usize;
        let mut latest: HashMap<String, Artifact> = HashMap::new();
        loop {
            let chunk = self.list_artifacts_page(page).await?;
            let chunk_len = chunk.len();
            for artifact in chunk {
                if !names.contains(&artifact.name) {
                    continue;
                }
                let candidate = Artifact {
                    id: artifact.id,
                    name: artifact.name,
                    created_at: artifact.created_at.unwrap_or_default(),
                };
                match latest.get(&candidate.name) {
                    Some(current) if current.id >= candidate.id => {}
                    _ => {
                        latest.insert(candidate.name.clone(), candidate);
                    }
                }
            }
            if chunk_len < PER_PAGE {
                return Ok(latest);
            }
            page += 1;
        }
    }

    async fn download_artifact(&self, id: u64, dest: &Path) -> Result<()> {
        let bytes = self
            .request_bytes("download artifact", 1, &mut || {
                self.http
                    .get(self.repo_url(&format!("actions/artifacts/{id}/zip")))
            })
            .await?;
        tokio::fs::write(dest, bytes)
            .await
            .map_err(GithubError::ArtifactIo)
    }

    async fn delete_artifacts_by_names(&self, names: &[String]) -> Result<()> {
        let mut page = 1_usize;
        let mut doomed = Vec::new();
        loop {
            let chunk = self.list_artifacts_page(page).await?;
            let chunk_len = chunk.len();
            doomed.extend(
                chunk
                    .into_iter()
                    .filter(|artifact| names.contains(&artifact.name))
                    .map(|artifact| artifact.id),
            );
            if chunk_len < PER_PAGE {
                break;
            }
            page += 1;
        }
        for id in doomed {
            self.request_unit("delete artifact", || {
                self.http
                    .delete(self.repo_url(&format!("actions/artifacts/{id}")))
            })
            .await?;
        }
        Ok(())
    }
}

fn map_error_status(operation: &str, status: u16, body: &str) -> GithubError {
    if status == 404 {
        return GithubError::NotFound;
    }
    if status == 422 && has_error_code(body, "already_exists") {
        return GithubError::AlreadyExists;
    }
    GithubError::Status {
        operation: operation.to_string(),
        status,
        message: truncate_for_error(body, 800),
    }
}

fn has_error_code(body: &str, code: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    value
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| {
            errors
                .iter()
                .any(|entry| entry.get("code").and_then(Value::as_str) == Some(code))
        })
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommentQueryData {
    repository: CommentRepository,
}

#[derive(Debug, Deserialize)]
struct CommentRepository {
    #[serde(rename = "pullRequest")]
    pull_request: CommentPullRequest,
}

#[derive(Debug, Deserialize)]
struct CommentPullRequest {
    comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
struct CommentConnection {
    nodes: Vec<CommentNode>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct CommentNode {
    id: String,
    #[serde(rename = "databaseId")]
    database_id: Option<u64>,
    body: String,
    author: Option<CommentAuthor>,
    #[serde(rename = "isMinimized")]
    is_minimized: bool,
}

#[derive(Debug, Deserialize)]
struct CommentAuthor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct RestPullRequest {
    id: u64,
    number: u64,
    #[serde(default)]
    title: String,
    head: RestHead,
    #[serde(default)]
    mergeable_state: String,
    #[serde(default)]
    labels: Vec<Label>,
}

impl RestPullRequest {
    fn into_pull_request(self) -> PullRequest {
        PullRequest {
            id: self.id,
            number: self.number,
            title: self.title,
            head_sha: self.head.sha,
            mergeable_state: self.mergeable_state,
            labels: self.labels,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RestHead {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RestReview {
    #[serde(default)]
    user: RestUser,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Default, Deserialize)]
struct RestUser {
    #[serde(default)]
    login: String,
}

#[derive(Debug, Deserialize)]
struct RestCommitFile {
    filename: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    previous_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestArtifactListing {
    #[serde(default)]
    artifacts: Vec<RestArtifact>,
}

#[derive(Debug, Deserialize)]
struct RestArtifact {
    id: u64,
    name: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::GithubClient;
    use crate::api::Github;

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::with_api_base(&server.base_url(), "token", "acme", "infra")
            .expect("client")
    }

    #[tokio::test]
    async fn functional_create_label_maps_already_exists_conflicts() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/repos/acme/infra/labels");
            then.status(422).json_body(json!({
                "message": "Validation Failed",
                "errors": [{ "resource": "Label", "code": "already_exists" }],
            }));
        });
        let error = client(&server)
            .create_label("mu_lock_core", "PR: #1", "")
            .await
            .expect_err("conflict");
        assert!(error.is_already_exists());
        mock.assert();
    }

    #[tokio::test]
    async fn regression_get_pull_request_does_not_retry_not_found() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/repos/acme/infra/pulls/12");
            then.status(404).json_body(json!({ "message": "Not Found" }));
        });
        let error = client(&server)
            .get_pull_request(12)
            .await
            .expect_err("not found");
        assert!(error.is_not_found());
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn functional_list_files_includes_previous_names_for_renames() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/infra/pulls/3/files");
            then.status(200).json_body(json!([
                { "filename": "terraform/core/main.tf", "status": "modified" },
                {
                    "filename": "terraform/core/new.tf",
                    "status": "renamed",
                    "previous_filename": "terraform/core/old.tf",
                },
            ]));
        });
        let files = client(&server).list_files(3).await.expect("files");
        assert_eq!(
            files,
            vec![
                "terraform/core/main.tf",
                "terraform/core/new.tf",
                "terraform/core/old.tf",
            ]
        );
    }

    #[tokio::test]
    async fn functional_resolve_latest_artifacts_keeps_greatest_id_per_name() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/infra/actions/artifacts");
            then.status(200).json_body(json!({
                "total_count": 3,
                "artifacts": [
                    { "id": 10, "name": "mu_core_default_7", "created_at": "2026-08-20T10:00:00Z" },
                    { "id": 20, "name": "mu_core_default_7", "created_at": "2026-08-21T10:00:00Z" },
                    { "id": 15, "name": "unrelated", "created_at": "2026-08-21T11:00:00Z" },
                ],
            }));
        });
        let latest = client(&server)
            .resolve_latest_artifacts(&["mu_core_default_7".to_string()])
            .await
            .expect("resolved");
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["mu_core_default_7"].id, 20);
    }

    #[tokio::test]
    async fn unit_resolve_latest_artifacts_reports_missing_names_as_absent() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/infra/actions/artifacts");
            then.status(200)
                .json_body(json!({ "total_count": 0, "artifacts": [] }));
        });
        let latest = client(&server)
            .resolve_latest_artifacts(&["mu_core_default_7".to_string()])
            .await
            .expect("resolved");
        assert!(latest.is_empty());
    }

    #[tokio::test]
    async fn regression_download_artifact_reports_write_failures_as_artifact_io() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/infra/actions/artifacts/9/zip");
            then.status(200).body("zip-bytes");
        });
        let dir = tempfile::tempdir().expect("temp dir");
        let dest = dir.path().join("missing-subdir").join("plan.zip");
        let error = client(&server)
            .download_artifact(9, &dest)
            .await
            .expect_err("unwritable destination");
        assert!(matches!(error, crate::error::GithubError::ArtifactIo(_)));
        assert!(error.to_string().contains("artifact io"));
    }

    #[tokio::test]
    async fn functional_find_pull_request_by_label_filters_open_pull_requests() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/infra/pulls");
            then.status(200).json_body(json!([
                {
                    "id": 1, "number": 4, "title": "other",
                    "head": { "sha": "aaa" }, "mergeable_state": "clean",
                    "labels": [{ "name": "bug", "description": "" }],
                },
                {
                    "id": 2, "number": 9, "title": "locked",
                    "head": { "sha": "bbb" }, "mergeable_state": "clean",
                    "labels": [{ "name": "mu_lock_core", "description": "PR: #9" }],
                },
            ]));
        });
        let found = client(&server)
            .find_pull_request_by_label("mu_lock_core")
            .await
            .expect("queried")
            .expect("present");
        assert_eq!(found.number, 9);
        let missing = client(&server)
            .find_pull_request_by_label("mu_lock_network")
            .await
            .expect("queried");
        assert!(missing.is_none());
    }
}
