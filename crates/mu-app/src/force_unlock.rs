use mu_config::Project;

use crate::app::App;
use crate::errors::{AppError, Result};
use crate::message::force_unlock_message;

impl App {
    /// Runs `terraform force-unlock` against a single project's backend
    /// before the pull-request level unlock proceeds.
    pub(crate) async fn run_force_unlock(
        &self,
        pr_number: u64,
        project: &Project,
        lock_id: &str,
    ) -> Result<()> {
        let terraform = self.prepare_terraform(project).await?;
        self.run_project_init(terraform.as_ref(), project, pr_number, None)
            .await?;

        self.action
            .start_group(&format!("mu unlock --force-unlock {lock_id}"));
        let unlocked = terraform.force_unlock(lock_id, true).await;
        self.action.end_group();
        let unlocked = unlocked?;

        self.add_run_summary("## mu force unlock", project, &unlocked.result);
        self.github
            .create_issue_comment(pr_number, &force_unlock_message(&unlocked))
            .await?;
        if unlocked.has_error {
            return Err(AppError::ForceUnlockFailed);
        }
        Ok(())
    }
}
