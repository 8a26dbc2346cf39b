use std::path::Path;

use serde::Deserialize;

use crate::error::{GithubError, Result};

pub const ACTION_OPENED: &str = "opened";
pub const ACTION_SYNCHRONIZE: &str = "synchronize";
pub const ACTION_REOPENED: &str = "reopened";
pub const ACTION_CLOSED: &str = "closed";
pub const ACTION_CREATED: &str = "created";

/// Workflow trigger the run was dispatched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    IssueComment(IssueCommentEvent),
    PullRequest(PullRequestEvent),
}

impl Event {
    pub fn number(&self) -> u64 {
        match self {
            Event::IssueComment(event) => event.issue.number,
            Event::PullRequest(event) => event.number,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Event::IssueComment(event) => &event.action,
            Event::PullRequest(event) => &event.action,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueCommentEvent {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub issue: EventIssue,
    #[serde(default)]
    pub comment: EventComment,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventIssue {
    #[serde(default)]
    pub number: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventComment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestEvent {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub number: u64,
}

/// Decodes the trigger from `GITHUB_EVENT_NAME` / `GITHUB_EVENT_PATH`.
/// Only `issue_comment` and `pull_request` runs are handled.
pub fn event_from_env() -> Result<Event> {
    let name = std::env::var("GITHUB_EVENT_NAME").unwrap_or_default();
    let path = std::env::var("GITHUB_EVENT_PATH").unwrap_or_default();
    decode_event(&name, Path::new(&path))
}

pub fn decode_event(name: &str, payload_path: &Path) -> Result<Event> {
    match name {
        "issue_comment" | "pull_request" => {}
        other => return Err(GithubError::UnsupportedEvent(other.to_string())),
    }
    let payload = std::fs::read(payload_path).map_err(GithubError::EventPayload)?;
    let event = match name {
        "issue_comment" => Event::IssueComment(
            serde_json::from_slice(&payload).map_err(|source| GithubError::Decode {
                operation: "issue_comment event".to_string(),
                source,
            })?,
        ),
        _ => Event::PullRequest(serde_json::from_slice(&payload).map_err(|source| {
            GithubError::Decode {
                operation: "pull_request event".to_string(),
                source,
            }
        })?),
    };
    Ok(event)
}
