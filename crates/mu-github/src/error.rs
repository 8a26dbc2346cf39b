use thiserror::Error;

pub type Result<T> = std::result::Result<T, GithubError>;

#[derive(Debug, Error)]
pub enum GithubError {
    /// 404 from the platform. Permanent for the current run; never
    /// retried.
    #[error("github: not found")]
    NotFound,
    /// The platform rejected a create because the resource already
    /// exists. This is the losing side of the label CAS.
    #[error("github: already exists")]
    AlreadyExists,
    #[error("github api {operation} failed with status {status}: {message}")]
    Status {
        operation: String,
        status: u16,
        message: String,
    },
    #[error("github api {operation} request failed")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode github {operation}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("github graphql {operation} failed: {message}")]
    GraphQl { operation: String, message: String },
    #[error("unsupported github event {0:?}")]
    UnsupportedEvent(String),
    #[error("failed to read event payload")]
    EventPayload(#[source] std::io::Error),
    #[error("github artifact io failed")]
    ArtifactIo(#[source] std::io::Error),
}

impl GithubError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GithubError::NotFound)
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, GithubError::AlreadyExists)
    }
}
