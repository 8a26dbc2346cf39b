use serde::Deserialize;

/// Hard platform limit for a single issue comment body.
pub const MAX_COMMENT_LEN: usize = 65536;

/// Author login the Actions token posts comments under.
pub const ACTION_BOT_LOGIN: &str = "github-actions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub head_sha: String,
    pub mergeable_state: String,
    pub labels: Vec<Label>,
}

impl PullRequest {
    pub fn is_mergeable(&self) -> bool {
        matches!(self.mergeable_state.as_str(), "clean" | "unstable" | "has_hooks")
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub user_login: String,
    pub state: String,
}

/// Counts reviews whose latest state is an approval.
pub fn approval_count(reviews: &[Review]) -> u32 {
    reviews
        .iter()
        .filter(|review| review.state.eq_ignore_ascii_case("approved"))
        .count() as u32
}

/// One pull-request conversation comment as seen through GraphQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// GraphQL node id, needed for minimization.
    pub id: String,
    pub database_id: u64,
    pub body: String,
    pub author_login: String,
    pub is_minimized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Error,
    Failure,
    Pending,
    Success,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Error => "error",
            CommitState::Failure => "failure",
            CommitState::Pending => "pending",
            CommitState::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    pub sha: String,
    pub state: CommitState,
    pub target_url: String,
    pub description: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::{approval_count, Label, PullRequest, Review};

    fn pull_request(mergeable_state: &str, labels: &[&str]) -> PullRequest {
        PullRequest {
            id: 1,
            number: 7,
            title: "change".to_string(),
            head_sha: "abc123".to_string(),
            mergeable_state: mergeable_state.to_string(),
            labels: labels
                .iter()
                .map(|name| Label {
                    name: name.to_string(),
                    description: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn unit_is_mergeable_accepts_known_clean_states() {
        assert!(pull_request("clean", &[]).is_mergeable());
        assert!(pull_request("unstable", &[]).is_mergeable());
        assert!(pull_request("has_hooks", &[]).is_mergeable());
        assert!(!pull_request("dirty", &[]).is_mergeable());
        assert!(!pull_request("", &[]).is_mergeable());
    }

    #[test]
    fn unit_has_label_matches_exact_names() {
        let pr = pull_request("clean", &["mu_lock_core"]);
        assert!(pr.has_label("mu_lock_core"));
        assert!(!pr.has_label("mu_lock"));
    }

    #[test]
    fn unit_approval_count_is_case_insensitive() {
        let reviews = vec![
            Review {
                user_login: "a".to_string(),
                state: "APPROVED".to_string(),
            },
            Review {
                user_login: "b".to_string(),
                state: "approved".to_string(),
            },
            Review {
                user_login: "c".to_string(),
                state: "CHANGES_REQUESTED".to_string(),
            },
        ];
        assert_eq!(approval_count(&reviews), 2);
    }
}
