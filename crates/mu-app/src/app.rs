use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use mu_action::{log_notice, Action};
use mu_archive::{Archive, ZipArchiver};
use mu_command::{parse, Command, CommandKind};
use mu_config::{Config, Project};
use mu_github::{
    Event, Github, ACTION_CLOSED, ACTION_CREATED, ACTION_OPENED, ACTION_REOPENED,
    ACTION_SYNCHRONIZE,
};
use mu_terraform::{Terraform, TerraformCli};

use crate::artifact::artifact_name;
use crate::errors::{AppError, Result};
use crate::message::{help_message, unknown_command_message};

pub struct Params {
    pub github: Arc<dyn Github>,
    pub config_path: String,
    pub default_terraform_version: String,
    pub upload_artifact_version: String,
    pub upload_artifact_dir: String,
    pub allow_commands: Vec<String>,
    pub disable_summary_log: bool,
    pub emoji_reaction: String,
}

pub struct App {
    pub(crate) github: Arc<dyn Github>,
    pub(crate) action: Action,
    pub(crate) archiver: Box<dyn Archive>,
    pub(crate) terraform_override: Option<Arc<dyn Terraform>>,
    pub(crate) config_path: String,
    pub(crate) default_terraform_version: String,
    pub(crate) upload_artifact_version: String,
    pub(crate) upload_artifact_dir: String,
    pub(crate) allow_commands: Vec<String>,
    pub(crate) disable_summary_log: bool,
    pub(crate) emoji_reaction: String,
}

/// One project's outcome, emitted as the `projects` step output for
/// downstream workflow steps.
#[derive(Debug, Serialize)]
pub(crate) struct OutputProject {
    pub(crate) name: String,
    pub(crate) dir: String,
    pub(crate) workspace: String,
    pub(crate) mode: String,
    pub(crate) result: String,
    pub(crate) action_url: String,
}

impl App {
    pub fn new(params: Params) -> Self {
        Self {
            github: params.github,
            action: Action::new(),
            archiver: Box::new(ZipArchiver),
            terraform_override: None,
            config_path: params.config_path,
            default_terraform_version: params.default_terraform_version,
            upload_artifact_version: params.upload_artifact_version,
            upload_artifact_dir: params.upload_artifact_dir,
            allow_commands: params.allow_commands,
            disable_summary_log: params.disable_summary_log,
            emoji_reaction: params.emoji_reaction,
        }
    }

    pub async fn execute(&self, event: Event) -> Result<()> {
        match event {
            Event::PullRequest(event) => self.execute_pull_request_event(&event).await,
            Event::IssueComment(event) => self.execute_issue_comment_event(&event).await,
        }
    }

    async fn execute_pull_request_event(
        &self,
        event: &mu_github::PullRequestEvent,
    ) -> Result<()> {
        match event.action.as_str() {
            ACTION_OPENED | ACTION_SYNCHRONIZE | ACTION_REOPENED | ACTION_CLOSED => {}
            _ => return Ok(()),
        }
        let config = self.load_config()?;
        let pull_request = self.github.get_pull_request(event.number).await?;
        if event.action == ACTION_CLOSED {
            return self.execute_unlock(event.number, &config, "", "").await;
        }
        self.execute_auto_plan(event.number, &pull_request.head_sha, &config)
            .await
    }

    async fn execute_issue_comment_event(
        &self,
        event: &mu_github::IssueCommentEvent,
    ) -> Result<()> {
        if event.action != ACTION_CREATED {
            return Ok(());
        }
        // Comments that do not parse as commands are not addressed to us.
        let Ok(command) = parse(&event.comment.body) else {
            return Ok(());
        };

        if !self.emoji_reaction.is_empty() {
            self.github
                .create_issue_comment_reaction(event.comment.id, &self.emoji_reaction)
                .await?;
        }

        let pr_number = event.issue.number;
        let kind = command.kind();
        if kind != CommandKind::Help && !self.allow_commands.iter().any(|allowed| allowed == kind.as_str())
        {
            let msg = unknown_command_message(kind.as_str(), &self.allow_commands);
            self.github.create_issue_comment(pr_number, &msg).await?;
            return Ok(());
        }

        let pull_request = self.github.get_pull_request(pr_number).await?;
        if !pull_request.is_mergeable() {
            return Err(AppError::NotMergeable(pull_request.mergeable_state));
        }
        let sha = pull_request.head_sha;

        let config = self.load_config()?;
        match command {
            Command::Plan { .. } => self.execute_plan(pr_number, &sha, &config, &command).await,
            Command::Apply { .. } => self.execute_apply(pr_number, &sha, &config, &command).await,
            Command::Unlock {
                ref project,
                ref force_unlock_id,
                ..
            } => {
                self.execute_unlock(pr_number, &config, project, force_unlock_id)
                    .await
            }
            Command::Help => self.execute_help(pr_number).await,
            Command::Import { .. } => {
                self.execute_import(pr_number, &sha, &config, &command).await
            }
            Command::StateRm { .. } => {
                self.execute_state_rm(pr_number, &sha, &config, &command).await
            }
        }
    }

    pub(crate) async fn execute_unlock(
        &self,
        pr_number: u64,
        config: &Config,
        project_name: &str,
        force_unlock_id: &str,
    ) -> Result<()> {
        let projects = if project_name.is_empty() {
            let modified_files = self.github.list_files(pr_number).await?;
            config
                .projects
                .iter()
                .filter(|project| project.has_modified_files(&modified_files))
                .collect::<Vec<_>>()
        } else {
            config.project(project_name).into_iter().collect()
        };
        if projects.is_empty() {
            return Ok(());
        }

        let pull_request = self.github.get_pull_request(pr_number).await?;
        if projects.len() > 1 && !force_unlock_id.is_empty() {
            return Err(AppError::InvalidForceUnlock);
        }

        let mut artifact_names = Vec::with_capacity(projects.len());
        for project in &projects {
            if projects.len() == 1 && !force_unlock_id.is_empty() {
                self.run_force_unlock(pr_number, project, force_unlock_id)
                    .await?;
            }
            self.unlock(&project.name, &pull_request).await?;
            artifact_names.push(artifact_name(&project.name, &project.workspace, pr_number));
        }

        self.github.delete_artifacts_by_names(&artifact_names).await?;

        // Crashed runs can leave the in-progress label behind; a closed
        // PR is the cleanup point.
        match self.delete_progress_label(pr_number).await {
            Ok(()) => Ok(()),
            Err(AppError::Github(error)) if error.is_not_found() => Ok(()),
            Err(error) => Err(error),
        }
    }

    async fn execute_help(&self, pr_number: u64) -> Result<()> {
        self.github
            .create_issue_comment(pr_number, &help_message())
            .await?;
        Ok(())
    }

    pub(crate) fn load_config(&self) -> Result<Config> {
        let config = Config::load(&self.config_path, &self.default_terraform_version)?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn project_terraform(&self, project: &Project) -> Arc<dyn Terraform> {
        if let Some(terraform) = &self.terraform_override {
            return Arc::clone(terraform);
        }
        Arc::new(TerraformCli::new(
            &project.terraform.version,
            &project.terraform.exec_path,
            Path::new(&project.dir),
        ))
    }

    /// Projects selected by an explicit `-p` flag, or by changed-path
    /// matching when no project was named.
    pub(crate) fn select_projects<'a>(
        &self,
        config: &'a Config,
        project_name: &str,
        modified_files: &[String],
    ) -> Vec<&'a Project> {
        if project_name.is_empty() {
            config
                .projects
                .iter()
                .filter(|project| project.plan.matches_paths(&project.dir, modified_files))
                .collect()
        } else {
            config.project(project_name).into_iter().collect()
        }
    }

    pub(crate) fn note_skipped_project(&self, project_name: &str) {
        log_notice(&format!("no matching changes: project={project_name}"));
    }

    /// Posts a rendered comment, split into platform-sized chunks.
    pub(crate) async fn post_split_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        for chunk in crate::split::split_message(body) {
            self.github.create_issue_comment(pr_number, &chunk).await?;
        }
        Ok(())
    }

    /// Minimizes earlier bot-authored result comments whose body starts
    /// with one of the given meta markers.
    pub(crate) async fn hide_outdated_comments(
        &self,
        pr_number: u64,
        metas: &[&str],
    ) -> Result<()> {
        let comments = self.github.list_pull_request_comments(pr_number).await?;
        for comment in comments {
            if comment.author_login != mu_github::ACTION_BOT_LOGIN || comment.is_minimized {
                continue;
            }
            if !metas.iter().any(|meta| comment.body.starts_with(meta)) {
                continue;
            }
            self.github.hide_issue_comment(&comment.id).await?;
        }
        Ok(())
    }

    pub(crate) async fn prepare_terraform(
        &self,
        project: &Project,
    ) -> Result<Arc<dyn Terraform>> {
        let terraform = self.project_terraform(project);
        terraform.setup().await?;
        terraform
            .compare_version(&project.terraform.version)
            .await?;
        terraform.switch_workspace(&project.workspace).await?;
        Ok(terraform)
    }

    /// Runs `terraform init` for a project. A failed init posts the
    /// diagnostic comment (hiding stale results when `hide_meta` names a
    /// result marker) and ends the flow.
    pub(crate) async fn run_project_init(
        &self,
        terraform: &dyn Terraform,
        project: &Project,
        pr_number: u64,
        hide_meta: Option<&str>,
    ) -> Result<()> {
        self.action.start_group(&format!(
            "mu init --project={} --workspace={}",
            project.name, project.workspace
        ));
        let init = terraform
            .init(
                &mu_terraform::InitParams {
                    backend_config: project.terraform.backend_config.clone(),
                    backend_config_path: project.terraform.backend_config_path.clone(),
                },
                true,
            )
            .await;
        self.action.end_group();
        let init = init?;
        if !init.has_error {
            return Ok(());
        }
        if !self.disable_summary_log {
            let mut summary = format!("## {}\n\n", project.name);
            summary.push_str(":x: **Init Failed**\n");
            summary.push_str(&format!(
                "project={} workspace={}\n",
                project.name, project.workspace
            ));
            summary.push_str(&detail_block(&init.raw_log));
            let _ = self.action.add_step_summary(&summary);
        }
        if let Some(meta) = hide_meta {
            self.hide_outdated_comments(pr_number, &[crate::message::INIT_META, meta])
                .await?;
        }
        self.post_split_comment(
            pr_number,
            &crate::message::init_failed_message(project, &init),
        )
        .await?;
        Err(AppError::InitFailed)
    }

    pub(crate) fn add_run_summary(&self, heading: &str, project: &Project, log: &str) {
        if self.disable_summary_log {
            return;
        }
        let mut summary = format!("{heading}\n\n");
        summary.push_str(&format!(
            "project: `{}` workspace: `{}`\n",
            project.name, project.workspace
        ));
        summary.push_str(&detail_block(log));
        let _ = self.action.add_step_summary(&summary);
    }

    pub(crate) fn emit_projects_output(&self, projects: &[OutputProject]) -> Result<()> {
        let rendered = serde_json::to_string(projects)
            .map_err(|error| AppError::InternalFailure(error.to_string()))?;
        self.action
            .output("projects", &rendered)
            .map_err(AppError::Other)
    }
}

fn detail_block(log: &str) -> String {
    format!("<details><summary>Show Output</summary>\n\n```\n{log}\n```\n</details>\n")
}
