use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use mu_action::log_error;

use crate::app::App;
use crate::errors::{AppError, Result};

pub(crate) fn progress_label(pr_number: u64) -> String {
    format!("mu_in_progress_{pr_number}")
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

impl App {
    async fn create_progress_label(&self, pr_number: u64, sha: &str) -> mu_github::Result<()> {
        let label = progress_label(pr_number);
        let description = if sha.is_empty() {
            String::new()
        } else {
            format!("commit: {sha}")
        };
        self.github.create_label(&label, &description, "").await?;
        self.github
            .add_pull_request_labels(pr_number, &[label])
            .await
    }

    pub(crate) async fn delete_progress_label(&self, pr_number: u64) -> Result<()> {
        self.github
            .delete_label(&progress_label(pr_number))
            .await
            .map_err(AppError::from)
    }

    async fn notify_in_progress(&self, pr_number: u64) -> Result<()> {
        let label = progress_label(pr_number);
        let msg = format!(
            "Error: The operation was canceled because #{pr_number} is currently in progress. Please remove the {label:?} label to retry."
        );
        self.github.create_issue_comment(pr_number, &msg).await?;
        Ok(())
    }

    /// Runs one command body under the in-progress marker label.
    ///
    /// An existing marker means another run for this pull request is
    /// active: a retry notice is posted and the run ends quietly with
    /// `None`. Otherwise the marker is created up front and deleted
    /// when the body finishes, whether it returned, failed, or
    /// panicked; a panic surfaces as [`AppError::InternalFailure`]
    /// after cleanup. Deletion failures are logged, not propagated, so
    /// they never mask the body's own outcome.
    pub(crate) async fn with_progress<T, Fut>(
        &self,
        pr_number: u64,
        sha: &str,
        body: Fut,
    ) -> Result<Option<T>>
    where
        Fut: Future<Output = Result<T>>,
    {
        match self.create_progress_label(pr_number, sha).await {
            Ok(()) => {}
            Err(error) if error.is_already_exists() => {
                self.notify_in_progress(pr_number).await?;
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        }
        let outcome = AssertUnwindSafe(body).catch_unwind().await;
        if let Err(error) = self.delete_progress_label(pr_number).await {
            log_error(&format!("failed to delete progress label: {error}"));
        }
        match outcome {
            Ok(result) => result.map(Some),
            Err(panic) => Err(AppError::InternalFailure(panic_message(panic.as_ref()))),
        }
    }
}
