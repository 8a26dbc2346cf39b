use std::panic::AssertUnwindSafe;
use std::path::Path;

use futures_util::FutureExt;

use mu_action::{log_error, run_url};
use mu_command::{Command, CommandKind};
use mu_config::{Config, Project};
use mu_github::{approval_count, Artifact, Review};
use mu_terraform::ApplyParams;

use crate::app::{App, OutputProject};
use crate::artifact::{artifact_name, plan_filename};
use crate::errors::{AppError, Result};
use crate::message::{
    apply_failed_message, apply_succeeded_message, approvals_required_message,
    missing_plan_file_message, APPLY_META, INIT_META,
};
use crate::progress::panic_message;

struct ApplyOutcome {
    result: String,
}

impl App {
    pub(crate) async fn execute_apply(
        &self,
        pr_number: u64,
        sha: &str,
        config: &Config,
        command: &Command,
    ) -> Result<()> {
        let Command::Apply { project, .. } = command else {
            return Ok(());
        };

        self.with_progress(pr_number, sha, async {
            let modified_files = self.github.list_files(pr_number).await?;
            let reviews = self.github.list_reviews(pr_number).await?;

            let projects = self.select_projects(config, project, &modified_files);
            if projects.is_empty() {
                self.github
                    .create_issue_comment(pr_number, "There is no project to plan.")
                    .await?;
                return Ok(());
            }

            let names: Vec<String> = projects
                .iter()
                .map(|project| artifact_name(&project.name, &project.workspace, pr_number))
                .collect();
            let stored = self.github.resolve_latest_artifacts(&names).await?;

            let mut output_projects = Vec::with_capacity(projects.len());
            let mut retired_names = Vec::with_capacity(projects.len());
            for project in projects {
                if !project.has_modified_files(&modified_files) {
                    self.note_skipped_project(&project.name);
                    continue;
                }
                let name = artifact_name(&project.name, &project.workspace, pr_number);
                let outcome = self
                    .apply_project(pr_number, sha, project, stored.get(&name), &reviews)
                    .await?;
                output_projects.push(OutputProject {
                    name: project.name.clone(),
                    dir: project.dir.clone(),
                    workspace: project.workspace.clone(),
                    mode: "apply".to_string(),
                    result: outcome.result,
                    action_url: run_url(),
                });
                retired_names.push(name);
            }
            if output_projects.is_empty() {
                self.github
                    .create_issue_comment(pr_number, "The specified project could not be found.")
                    .await?;
                return Ok(());
            }

            self.emit_projects_output(&output_projects)?;
            // Applied plans are spent; every stored version is retired.
            self.github.delete_artifacts_by_names(&retired_names).await?;
            Ok(())
        })
        .await
        .map(|_| ())
    }

    async fn apply_project(
        &self,
        pr_number: u64,
        sha: &str,
        project: &Project,
        artifact: Option<&Artifact>,
        reviews: &[Review],
    ) -> Result<ApplyOutcome> {
        let result = AssertUnwindSafe(
            self.apply_project_inner(pr_number, sha, project, artifact, reviews),
        )
        .catch_unwind()
        .await;
        let result = match result {
            Ok(result) => result,
            Err(panic) => Err(AppError::InternalFailure(panic_message(panic.as_ref()))),
        };
        if result.is_err() {
            if let Err(error) = self
                .update_failure_status(sha, &project.name, CommandKind::Apply)
                .await
            {
                log_error(&format!("failed to update commit status: {error}"));
            }
        }
        result
    }

    async fn apply_project_inner(
        &self,
        pr_number: u64,
        sha: &str,
        project: &Project,
        artifact: Option<&Artifact>,
        reviews: &[Review],
    ) -> Result<ApplyOutcome> {
        // The approval gate comes before the lock so an under-reviewed
        // apply cannot take the project hostage.
        let required = project.apply.require_approvals;
        if required > 0 {
            let approved = approval_count(reviews);
            if approved < required {
                self.github
                    .create_issue_comment(pr_number, &approvals_required_message(required))
                    .await?;
                return Err(AppError::ApprovalsRequired { required, approved });
            }
        }

        self.lock(
            &project.name,
            pr_number,
            CommandKind::Apply,
            &project.lock_label_color,
        )
        .await?;
        self.update_pending_status(sha, &project.name, CommandKind::Apply)
            .await?;

        let Some(artifact) = artifact else {
            self.github
                .create_issue_comment(pr_number, &missing_plan_file_message(&project.name))
                .await?;
            return Err(AppError::NotFoundPlanFile(project.name.clone()));
        };

        let filename = plan_filename(&project.name, &project.workspace, pr_number);
        let archive_path = Path::new(&project.dir).join(format!("{filename}.zip"));
        self.github
            .download_artifact(artifact.id, &archive_path)
            .await?;
        self.archiver
            .decompress(Path::new(&project.dir), &archive_path)?;

        let terraform = self.prepare_terraform(project).await?;
        self.run_project_init(terraform.as_ref(), project, pr_number, Some(APPLY_META))
            .await?;

        self.action.start_group(&format!(
            "mu apply --project={} --workspace={}",
            project.name, project.workspace
        ));
        let apply = terraform
            .apply(
                &ApplyParams {
                    plan_file_path: filename,
                },
                true,
            )
            .await;
        self.action.end_group();
        let apply = apply?;

        self.add_run_summary("## mu apply", project, &apply.raw_log);
        self.hide_outdated_comments(pr_number, &[INIT_META, APPLY_META])
            .await?;
        let comment = if apply.has_error {
            apply_failed_message(project, &apply)
        } else {
            apply_succeeded_message(project, &apply)
        };
        self.post_split_comment(pr_number, &comment).await?;
        if apply.has_error {
            return Err(AppError::ApplyFailed);
        }
        self.update_success_status(sha, &project.name, CommandKind::Apply, "Apply succeeded.")
            .await?;
        Ok(ApplyOutcome {
            result: apply.result,
        })
    }
}
