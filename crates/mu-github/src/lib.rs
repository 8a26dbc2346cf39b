//! GitHub platform collaborator: REST/GraphQL transport, typed errors,
//! and the inbound event envelope.
//!
//! The platform doubles as the coordination substrate: label creation is
//! the compare-and-swap primitive the lock manager builds on, so the
//! client surfaces `AlreadyExists` and `NotFound` as first-class variants
//! instead of flattening them into opaque failures.

mod api;
mod client;
mod error;
mod event;
mod transport;
mod types;

pub use api::Github;
pub use client::GithubClient;
pub use error::{GithubError, Result};
pub use event::{
    decode_event, event_from_env, Event, EventComment, EventIssue, IssueCommentEvent,
    PullRequestEvent, ACTION_CLOSED, ACTION_CREATED, ACTION_OPENED, ACTION_REOPENED,
    ACTION_SYNCHRONIZE,
};
pub use types::{
    approval_count, Artifact, Comment, CommitState, CommitStatus, Label, PullRequest, Review,
    ACTION_BOT_LOGIN, MAX_COMMENT_LEN,
};
