use mu_command::CommandKind;
use mu_github::PullRequest;

use crate::app::App;
use crate::errors::{AppError, Result};

pub(crate) fn lock_label(project: &str) -> String {
    format!("mu_lock_{project}")
}

fn holder_description(pr_number: u64) -> String {
    format!("PR: #{pr_number}")
}

impl App {
    /// Takes the project lock for `pr_number`. The unique lock label is
    /// the compare-and-swap: whoever creates it first holds the lock.
    /// Losing the race posts a notice naming the holder and fails with
    /// [`AppError::AlreadyLocked`]. Re-locking from the holding pull
    /// request succeeds silently.
    pub(crate) async fn lock(
        &self,
        project: &str,
        pr_number: u64,
        kind: CommandKind,
        label_color: &str,
    ) -> Result<()> {
        let label = lock_label(project);
        let holder = match self.github.find_pull_request_by_label(&label).await {
            Ok(holder) => holder,
            Err(error) if error.is_not_found() => None,
            Err(error) => return Err(error.into()),
        };
        if let Some(holder) = holder {
            if holder.number == pr_number {
                return Ok(());
            }
            self.notify_locked(pr_number, kind, &holder_description(holder.number))
                .await?;
            return Err(AppError::AlreadyLocked);
        }

        match self
            .github
            .create_label(&label, &holder_description(pr_number), label_color)
            .await
        {
            Ok(()) => {}
            Err(error) if error.is_already_exists() => {
                // Lost the creation race; the label now names the winner.
                let winner = self.github.get_label(&label).await?;
                self.notify_locked(pr_number, kind, &winner.description)
                    .await?;
                return Err(AppError::AlreadyLocked);
            }
            Err(error) => return Err(error.into()),
        }
        self.github
            .add_pull_request_labels(pr_number, &[label])
            .await?;
        Ok(())
    }

    async fn notify_locked(
        &self,
        pr_number: u64,
        kind: CommandKind,
        description: &str,
    ) -> Result<()> {
        let msg = format!(
            ":lock: **{} Failed** This project is currently locked by {description}\nRemove lock label if not needed",
            kind.title()
        );
        self.github.create_issue_comment(pr_number, &msg).await?;
        Ok(())
    }

    /// Releases the project lock held by `pull_request`. A pull request
    /// that does not carry the label holds nothing, so this is a no-op.
    /// Finding the label on more than one open pull request means the
    /// invariant was broken by hand; that state is reported, never
    /// repaired automatically.
    pub(crate) async fn unlock(&self, project: &str, pull_request: &PullRequest) -> Result<()> {
        let label = lock_label(project);
        if !pull_request.has_label(&label) {
            return Ok(());
        }
        let holders = self.github.list_pull_requests_by_label(&label, 2).await?;
        if holders.len() > 1 {
            self.notify_failed_unlock(pull_request.number, &label).await?;
            return Err(AppError::MultipleLockLabels);
        }
        self.github.delete_label(&label).await?;
        let msg = format!(":unlock: Unlocked the `{project}` project");
        self.github
            .create_issue_comment(pull_request.number, &msg)
            .await?;
        Ok(())
    }

    async fn notify_failed_unlock(&self, pr_number: u64, label: &str) -> Result<()> {
        let url = mu_action::label_url(label);
        let msg = format!(":x: **Unlock failed**\nMultiple {label} labels exist.\n\n{url}");
        self.github.create_issue_comment(pr_number, &msg).await?;
        Ok(())
    }
}
