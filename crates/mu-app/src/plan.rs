use std::panic::AssertUnwindSafe;
use std::path::Path;

use futures_util::FutureExt;

use mu_action::{log_error, run_url};
use mu_command::{Command, CommandKind};
use mu_config::{Config, Project};
use mu_terraform::PlanParams;

use crate::app::{App, OutputProject};
use crate::artifact::{artifact_name, plan_filename, write_upload_manifest, PlanArtifact};
use crate::errors::{AppError, Result};
use crate::message::{plan_failed_message, plan_succeeded_message, PLAN_META};
use crate::progress::panic_message;

pub(crate) struct PlanOutcome {
    pub(crate) path: String,
    pub(crate) result: String,
}

impl App {
    /// Plans every auto-plan project whose trigger paths match the pull
    /// request's changed files. Runs on push-style events, without a
    /// command comment.
    pub(crate) async fn execute_auto_plan(
        &self,
        pr_number: u64,
        sha: &str,
        config: &Config,
    ) -> Result<()> {
        let modified_files = self.github.list_files(pr_number).await?;
        let projects: Vec<&Project> = config
            .projects
            .iter()
            .filter(|project| {
                project.plan.auto && project.plan.matches_paths(&project.dir, &modified_files)
            })
            .collect();
        if projects.is_empty() {
            return Ok(());
        }

        self.with_progress(pr_number, sha, async {
            self.plan_projects(pr_number, sha, &projects, &[], &[], false)
                .await
        })
        .await
        .map(|_| ())
    }

    pub(crate) async fn execute_plan(
        &self,
        pr_number: u64,
        sha: &str,
        config: &Config,
        command: &Command,
    ) -> Result<()> {
        let Command::Plan {
            project,
            vars,
            var_files,
            destroy,
            ..
        } = command
        else {
            return Ok(());
        };

        self.with_progress(pr_number, sha, async {
            let modified_files = self.github.list_files(pr_number).await?;
            let projects = self.select_projects(config, project, &modified_files);
            if projects.is_empty() {
                self.github
                    .create_issue_comment(pr_number, "There is no project to run `mu plan` on.")
                    .await?;
                return Ok(());
            }
            // A named project still only plans when it has matching
            // changes in this pull request.
            let projects: Vec<&Project> = projects
                .into_iter()
                .filter(|candidate| {
                    if candidate.has_modified_files(&modified_files) {
                        true
                    } else {
                        self.note_skipped_project(&candidate.name);
                        false
                    }
                })
                .collect();
            if projects.is_empty() {
                self.github
                    .create_issue_comment(pr_number, "The specified project could not be found.")
                    .await?;
                return Ok(());
            }
            self.plan_projects(pr_number, sha, &projects, vars, var_files, *destroy)
                .await
        })
        .await
        .map(|_| ())
    }

    async fn plan_projects(
        &self,
        pr_number: u64,
        sha: &str,
        projects: &[&Project],
        vars: &[String],
        var_files: &[String],
        destroy: bool,
    ) -> Result<()> {
        let mut output_projects = Vec::with_capacity(projects.len());
        let mut artifacts = Vec::with_capacity(projects.len());
        for project in projects {
            let outcome = self
                .plan_project(pr_number, sha, project, vars, var_files, destroy)
                .await?;
            output_projects.push(OutputProject {
                name: project.name.clone(),
                dir: project.dir.clone(),
                workspace: project.workspace.clone(),
                mode: "plan".to_string(),
                result: outcome.result,
                action_url: run_url(),
            });
            artifacts.push(PlanArtifact {
                name: artifact_name(&project.name, &project.workspace, pr_number),
                path: outcome.path,
                overwrite: true,
            });
        }

        self.emit_projects_output(&output_projects)?;
        write_upload_manifest(
            &self.upload_artifact_dir,
            &self.upload_artifact_version,
            &artifacts,
        )?;
        self.action
            .output("upload_artifact", "true")
            .map_err(AppError::Other)
    }

    /// One project's plan, with the commit status tracking the outcome:
    /// pending up front, failure on any error or panic, success once the
    /// result comment is posted.
    async fn plan_project(
        &self,
        pr_number: u64,
        sha: &str,
        project: &Project,
        vars: &[String],
        var_files: &[String],
        destroy: bool,
    ) -> Result<PlanOutcome> {
        let result = AssertUnwindSafe(
            self.plan_project_inner(pr_number, sha, project, vars, var_files, destroy),
        )
        .catch_unwind()
        .await;
        let result = match result {
            Ok(result) => result,
            Err(panic) => Err(AppError::InternalFailure(panic_message(panic.as_ref()))),
        };
        if result.is_err() {
            if let Err(error) = self
                .update_failure_status(sha, &project.name, CommandKind::Plan)
                .await
            {
                log_error(&format!("failed to update commit status: {error}"));
            }
        }
        result
    }

    async fn plan_project_inner(
        &self,
        pr_number: u64,
        sha: &str,
        project: &Project,
        vars: &[String],
        var_files: &[String],
        destroy: bool,
    ) -> Result<PlanOutcome> {
        self.update_pending_status(sha, &project.name, CommandKind::Plan)
            .await?;
        self.lock(
            &project.name,
            pr_number,
            CommandKind::Plan,
            &project.lock_label_color,
        )
        .await?;

        let terraform = self.prepare_terraform(project).await?;
        self.run_project_init(terraform.as_ref(), project, pr_number, Some(PLAN_META))
            .await?;

        let filename = plan_filename(&project.name, &project.workspace, pr_number);
        let mut all_vars = project.terraform.vars.clone();
        all_vars.extend_from_slice(vars);
        let mut all_var_files = project.terraform.var_files.clone();
        all_var_files.extend_from_slice(var_files);

        self.action.start_group(&format!(
            "mu plan --project={} --workspace={}",
            project.name, project.workspace
        ));
        let plan = terraform
            .plan(
                &PlanParams {
                    vars: all_vars,
                    var_files: all_var_files,
                    destroy,
                    out: filename.clone(),
                },
                true,
            )
            .await;
        self.action.end_group();
        let plan = plan?;

        self.add_run_summary("## mu plan", project, &plan.raw_log);
        self.hide_outdated_comments(pr_number, &[crate::message::INIT_META, PLAN_META])
            .await?;
        let comment = if plan.has_error {
            plan_failed_message(project, &plan)
        } else {
            plan_succeeded_message(project, &plan)
        };
        self.post_split_comment(pr_number, &comment).await?;
        if plan.has_error {
            return Err(AppError::PlanFailed);
        }
        self.update_success_status(sha, &project.name, CommandKind::Plan, &plan.result)
            .await?;

        Ok(PlanOutcome {
            path: Path::new(&project.dir)
                .join(&filename)
                .to_string_lossy()
                .into_owned(),
            result: plan.result,
        })
    }
}
