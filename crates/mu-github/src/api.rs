use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Artifact, Comment, CommitStatus, Label, PullRequest, Review};

/// Platform operations the orchestrator depends on. The production
/// implementation is [`crate::GithubClient`]; orchestration tests stand in
/// recording fakes.
#[async_trait]
pub trait Github: Send + Sync {
    async fn create_issue_comment(&self, number: u64, body: &str) -> Result<()>;

    /// Minimizes a comment (by GraphQL node id) as outdated.
    async fn hide_issue_comment(&self, node_id: &str) -> Result<()>;

    async fn create_issue_comment_reaction(&self, comment_id: u64, content: &str) -> Result<()>;

    /// Creates a repository label. Fails with
    /// [`crate::GithubError::AlreadyExists`] when the name is taken; lock
    /// acquisition relies on that uniqueness as its compare-and-swap.
    async fn create_label(&self, name: &str, description: &str, color: &str) -> Result<()>;

    async fn delete_label(&self, name: &str) -> Result<()>;

    async fn get_label(&self, name: &str) -> Result<Label>;

    async fn add_pull_request_labels(&self, number: u64, labels: &[String]) -> Result<()>;

    async fn list_reviews(&self, number: u64) -> Result<Vec<Review>>;

    async fn list_pull_request_comments(&self, number: u64) -> Result<Vec<Comment>>;

    /// Open pull requests carrying the label, capped at `limit`.
    async fn list_pull_requests_by_label(
        &self,
        label: &str,
        limit: usize,
    ) -> Result<Vec<PullRequest>>;

    /// First open pull request carrying the label, if any.
    async fn find_pull_request_by_label(&self, label: &str) -> Result<Option<PullRequest>>;

    /// Changed file paths of the pull request; renames contribute both the
    /// new and the previous path. Retries transient faults, never a 404.
    async fn list_files(&self, number: u64) -> Result<Vec<String>>;

    /// Retries transient faults, never a 404.
    async fn get_pull_request(&self, number: u64) -> Result<PullRequest>;

    async fn create_commit_status(&self, status: &CommitStatus) -> Result<()>;

    /// Pages through every stored artifact and keeps, per requested name,
    /// only the entry with the greatest id ("latest plan wins"). Names
    /// with no stored artifact are absent from the map.
    async fn resolve_latest_artifacts(&self, names: &[String]) -> Result<HashMap<String, Artifact>>;

    async fn download_artifact(&self, id: u64, dest: &Path) -> Result<()>;

    /// Deletes every stored version of every named artifact.
    async fn delete_artifacts_by_names(&self, names: &[String]) -> Result<()>;
}
