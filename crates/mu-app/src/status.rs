use mu_command::CommandKind;
use mu_github::{CommitState, CommitStatus};

use crate::app::App;
use crate::errors::Result;

/// Commit status context, one slot per command and project.
pub(crate) fn status_context(kind: CommandKind, project: &str) -> String {
    format!("mu/{kind}: {project}")
}

impl App {
    pub(crate) async fn update_pending_status(
        &self,
        sha: &str,
        project: &str,
        kind: CommandKind,
    ) -> Result<()> {
        self.post_status(sha, project, kind, CommitState::Pending, "in progress...")
            .await
    }

    pub(crate) async fn update_success_status(
        &self,
        sha: &str,
        project: &str,
        kind: CommandKind,
        description: &str,
    ) -> Result<()> {
        self.post_status(sha, project, kind, CommitState::Success, description)
            .await
    }

    pub(crate) async fn update_failure_status(
        &self,
        sha: &str,
        project: &str,
        kind: CommandKind,
    ) -> Result<()> {
        self.post_status(sha, project, kind, CommitState::Failure, "failed.")
            .await
    }

    async fn post_status(
        &self,
        sha: &str,
        project: &str,
        kind: CommandKind,
        state: CommitState,
        description: &str,
    ) -> Result<()> {
        let status = CommitStatus {
            sha: sha.to_string(),
            state,
            target_url: mu_action::run_url(),
            description: description.to_string(),
            context: status_context(kind, project),
        };
        self.github.create_commit_status(&status).await?;
        Ok(())
    }
}
