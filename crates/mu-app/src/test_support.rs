use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mu_archive::ZipArchiver;
use mu_github::{
    Artifact, Comment, CommitStatus, Github, GithubError, Label, PullRequest, Review,
};
use mu_terraform::{
    ApplyParams, ImportParams, InitParams, Output, PlanParams, StateRmParams, StepOutput,
    Terraform,
};

use crate::app::App;

pub(crate) fn test_app(github: Arc<FakeGithub>) -> App {
    test_app_with(github, Arc::new(FakeTerraform::default()))
}

pub(crate) fn test_app_with(github: Arc<FakeGithub>, terraform: Arc<FakeTerraform>) -> App {
    App {
        github,
        action: mu_action::Action::new(),
        archiver: Box::new(ZipArchiver),
        terraform_override: Some(terraform),
        config_path: String::new(),
        default_terraform_version: String::new(),
        upload_artifact_version: "v4".to_string(),
        upload_artifact_dir: String::new(),
        allow_commands: ["plan", "apply", "unlock", "import", "state"]
            .iter()
            .map(|command| command.to_string())
            .collect(),
        disable_summary_log: true,
        emoji_reaction: String::new(),
    }
}

/// In-memory platform double that records every mutation.
#[derive(Default)]
pub(crate) struct FakeGithub {
    state: Mutex<GithubState>,
}

#[derive(Default)]
struct GithubState {
    labels: HashMap<String, Label>,
    deleted_labels: Vec<String>,
    pull_requests: Vec<PullRequest>,
    pr_labels: HashMap<u64, Vec<String>>,
    comments: HashMap<u64, Vec<String>>,
    conversation: Vec<Comment>,
    hidden_comment_ids: Vec<String>,
    reviews: Vec<Review>,
    files: Vec<String>,
    statuses: Vec<CommitStatus>,
    artifacts: Vec<Artifact>,
    deleted_artifact_names: Vec<String>,
    reactions: Vec<(u64, String)>,
    download_payload: Vec<u8>,
}

impl FakeGithub {
    pub(crate) fn add_pull_request(&self, pull_request: PullRequest) {
        self.state.lock().unwrap().pull_requests.push(pull_request);
    }

    pub(crate) fn seed_label(&self, name: &str, description: &str) {
        self.state.lock().unwrap().labels.insert(
            name.to_string(),
            Label {
                name: name.to_string(),
                description: description.to_string(),
            },
        );
    }

    pub(crate) fn seed_files(&self, files: &[&str]) {
        self.state.lock().unwrap().files = files.iter().map(|file| file.to_string()).collect();
    }

    pub(crate) fn seed_review(&self, user_login: &str, state: &str) {
        self.state.lock().unwrap().reviews.push(Review {
            user_login: user_login.to_string(),
            state: state.to_string(),
        });
    }

    pub(crate) fn seed_conversation_comment(&self, comment: Comment) {
        self.state.lock().unwrap().conversation.push(comment);
    }

    pub(crate) fn seed_artifact(&self, id: u64, name: &str) {
        self.state.lock().unwrap().artifacts.push(Artifact {
            id,
            name: name.to_string(),
            created_at: String::new(),
        });
    }

    pub(crate) fn set_download_payload(&self, payload: Vec<u8>) {
        self.state.lock().unwrap().download_payload = payload;
    }

    pub(crate) fn label(&self, name: &str) -> Option<Label> {
        self.state.lock().unwrap().labels.get(name).cloned()
    }

    pub(crate) fn deleted_labels(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_labels.clone()
    }

    pub(crate) fn pr_labels(&self, number: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .pr_labels
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn comments(&self, number: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn hidden_comment_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().hidden_comment_ids.clone()
    }

    pub(crate) fn statuses(&self) -> Vec<CommitStatus> {
        self.state.lock().unwrap().statuses.clone()
    }

    pub(crate) fn deleted_artifact_names(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_artifact_names.clone()
    }

    pub(crate) fn reactions(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().reactions.clone()
    }
}

#[async_trait]
impl Github for FakeGithub {
    async fn create_issue_comment(&self, number: u64, body: &str) -> mu_github::Result<()> {
        self.state
            .lock()
            .unwrap()
            .comments
            .entry(number)
            .or_default()
            .push(body.to_string());
        Ok(())
    }

    async fn hide_issue_comment(&self, node_id: &str) -> mu_github::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.hidden_comment_ids.push(node_id.to_string());
        if let Some(comment) = state
            .conversation
            .iter_mut()
            .find(|comment| comment.id == node_id)
        {
            comment.is_minimized = true;
        }
        Ok(())
    }

    async fn create_issue_comment_reaction(
        &self,
        comment_id: u64,
        content: &str,
    ) -> mu_github::Result<()> {
        self.state
            .lock()
            .unwrap()
            .reactions
            .push((comment_id, content.to_string()));
        Ok(())
    }

    async fn create_label(
        &self,
        name: &str,
        description: &str,
        _color: &str,
    ) -> mu_github::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.labels.contains_key(name) {
            return Err(GithubError::AlreadyExists);
        }
        state.labels.insert(
            name.to_string(),
            Label {
                name: name.to_string(),
                description: description.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_label(&self, name: &str) -> mu_github::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deleted_labels.push(name.to_string());
        if state.labels.remove(name).is_none() {
            return Err(GithubError::NotFound);
        }
        Ok(())
    }

    async fn get_label(&self, name: &str) -> mu_github::Result<Label> {
        self.state
            .lock()
            .unwrap()
            .labels
            .get(name)
            .cloned()
            .ok_or(GithubError::NotFound)
    }

    async fn add_pull_request_labels(
        &self,
        number: u64,
        labels: &[String],
    ) -> mu_github::Result<()> {
        let mut state = self.state.lock().unwrap();
        for name in labels {
            state
                .pr_labels
                .entry(number)
                .or_default()
                .push(name.clone());
            let description = state
                .labels
                .get(name)
                .map(|label| label.description.clone())
                .unwrap_or_default();
            if let Some(pull_request) = state
                .pull_requests
                .iter_mut()
                .find(|pull_request| pull_request.number == number)
            {
                pull_request.labels.push(Label {
                    name: name.clone(),
                    description,
                });
            }
        }
        Ok(())
    }

    async fn list_reviews(&self, _number: u64) -> mu_github::Result<Vec<Review>> {
        Ok(self.state.lock().unwrap().reviews.clone())
    }

    async fn list_pull_request_comments(&self, _number: u64) -> mu_github::Result<Vec<Comment>> {
        Ok(self.state.lock().unwrap().conversation.clone())
    }

    async fn list_pull_requests_by_label(
        &self,
        label: &str,
        limit: usize,
    ) -> mu_github::Result<Vec<PullRequest>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pull_requests
            .iter()
            .filter(|pull_request| pull_request.has_label(label))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_pull_request_by_label(
        &self,
        label: &str,
    ) -> mu_github::Result<Option<PullRequest>> {
        Ok(self
            .list_pull_requests_by_label(label, 1)
            .await?
            .into_iter()
            .next())
    }

    async fn list_files(&self, _number: u64) -> mu_github::Result<Vec<String>> {
        Ok(self.state.lock().unwrap().files.clone())
    }

    async fn get_pull_request(&self, number: u64) -> mu_github::Result<PullRequest> {
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .iter()
            .find(|pull_request| pull_request.number == number)
            .cloned()
            .ok_or(GithubError::NotFound)
    }

    async fn create_commit_status(&self, status: &CommitStatus) -> mu_github::Result<()> {
        self.state.lock().unwrap().statuses.push(status.clone());
        Ok(())
    }

    async fn resolve_latest_artifacts(
        &self,
        names: &[String],
    ) -> mu_github::Result<HashMap<String, Artifact>> {
        let state = self.state.lock().unwrap();
        let mut latest: HashMap<String, Artifact> = HashMap::new();
        for artifact in &state.artifacts {
            if !names.contains(&artifact.name) {
                continue;
            }
            match latest.get(&artifact.name) {
                Some(current) if current.id >= artifact.id => {}
                _ => {
                    latest.insert(artifact.name.clone(), artifact.clone());
                }
            }
        }
        Ok(latest)
    }

    async fn download_artifact(&self, _id: u64, dest: &Path) -> mu_github::Result<()> {
        let payload = self.state.lock().unwrap().download_payload.clone();
        std::fs::write(dest, payload).map_err(GithubError::ArtifactIo)
    }

    async fn delete_artifacts_by_names(&self, names: &[String]) -> mu_github::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deleted_artifact_names.extend(names.iter().cloned());
        state
            .artifacts
            .retain(|artifact| !names.contains(&artifact.name));
        Ok(())
    }
}

/// Terraform double with canned outputs and a call log.
pub(crate) struct FakeTerraform {
    state: Mutex<TerraformState>,
}

struct TerraformState {
    init_output: Output,
    plan_output: Output,
    apply_output: Output,
    step_output: StepOutput,
    calls: Vec<String>,
}

impl Default for FakeTerraform {
    fn default() -> Self {
        Self {
            state: Mutex::new(TerraformState {
                init_output: Output::default(),
                plan_output: Output {
                    result: "Plan: 1 to add, 0 to change, 0 to destroy.".to_string(),
                    changed_result: "  + resource \"null_resource\" \"this\" {".to_string(),
                    raw_log: "Plan: 1 to add, 0 to change, 0 to destroy.".to_string(),
                    ..Output::default()
                },
                apply_output: Output {
                    result: "Apply complete! Resources: 1 added, 0 changed, 0 destroyed."
                        .to_string(),
                    raw_log: "Apply complete!".to_string(),
                    ..Output::default()
                },
                step_output: StepOutput::default(),
                calls: Vec::new(),
            }),
        }
    }
}

impl FakeTerraform {
    pub(crate) fn set_init_output(&self, output: Output) {
        self.state.lock().unwrap().init_output = output;
    }

    pub(crate) fn set_plan_output(&self, output: Output) {
        self.state.lock().unwrap().plan_output = output;
    }

    pub(crate) fn set_step_output(&self, output: StepOutput) {
        self.state.lock().unwrap().step_output = output;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }
}

#[async_trait]
impl Terraform for FakeTerraform {
    async fn setup(&self) -> anyhow::Result<()> {
        self.record("setup");
        Ok(())
    }

    async fn compare_version(&self, required: &str) -> anyhow::Result<()> {
        self.record(format!("compare_version {required}"));
        Ok(())
    }

    async fn switch_workspace(&self, workspace: &str) -> anyhow::Result<()> {
        self.record(format!("switch_workspace {workspace}"));
        Ok(())
    }

    async fn init(&self, _params: &InitParams, _stream: bool) -> anyhow::Result<Output> {
        self.record("init");
        Ok(self.state.lock().unwrap().init_output.clone())
    }

    async fn plan(&self, params: &PlanParams, _stream: bool) -> anyhow::Result<Output> {
        self.record(format!("plan out={}", params.out));
        Ok(self.state.lock().unwrap().plan_output.clone())
    }

    async fn apply(&self, params: &ApplyParams, _stream: bool) -> anyhow::Result<Output> {
        self.record(format!("apply plan_file={}", params.plan_file_path));
        Ok(self.state.lock().unwrap().apply_output.clone())
    }

    async fn force_unlock(&self, lock_id: &str, _stream: bool) -> anyhow::Result<StepOutput> {
        self.record(format!("force_unlock {lock_id}"));
        Ok(self.state.lock().unwrap().step_output.clone())
    }

    async fn import_resource(
        &self,
        params: &ImportParams,
        _stream: bool,
    ) -> anyhow::Result<StepOutput> {
        self.record(format!("import {} {}", params.address, params.id));
        Ok(self.state.lock().unwrap().step_output.clone())
    }

    async fn state_rm(&self, params: &StateRmParams, _stream: bool) -> anyhow::Result<StepOutput> {
        self.record(format!(
            "state_rm {}{}",
            params.address,
            if params.dry_run { " (dry run)" } else { "" }
        ));
        Ok(self.state.lock().unwrap().step_output.clone())
    }
}
