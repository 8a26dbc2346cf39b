use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Stored-artifact name for one project/workspace/pull-request plan.
/// Slashes in nested project names are not valid in artifact names.
pub(crate) fn artifact_name(project: &str, workspace: &str, pr_number: u64) -> String {
    format!("mu_{}_{workspace}_{pr_number}", project.replace('/', "::"))
}

pub(crate) fn plan_filename(project: &str, workspace: &str, pr_number: u64) -> String {
    format!("{}_{workspace}_{pr_number}.tfplan", project.replace('/', "::"))
}

#[derive(Debug, Clone)]
pub(crate) struct PlanArtifact {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) overwrite: bool,
}

#[derive(Serialize)]
struct Manifest {
    runs: Runs,
}

#[derive(Serialize)]
struct Runs {
    using: String,
    steps: Vec<Step>,
}

#[derive(Serialize)]
struct Step {
    name: String,
    uses: String,
    with: UploadWith,
}

#[derive(Serialize)]
struct UploadWith {
    name: String,
    path: String,
    overwrite: bool,
}

/// Emits a composite `action.yaml` of upload steps into `dir`; a
/// follow-up workflow step executes it so the plan files become stored
/// artifacts.
pub(crate) fn write_upload_manifest(
    dir: &str,
    upload_action_version: &str,
    artifacts: &[PlanArtifact],
) -> Result<()> {
    let manifest = Manifest {
        runs: Runs {
            using: "composite".to_string(),
            steps: artifacts
                .iter()
                .map(|artifact| Step {
                    name: artifact.name.clone(),
                    uses: format!("actions/upload-artifact@{upload_action_version}"),
                    with: UploadWith {
                        name: artifact.name.clone(),
                        path: artifact.path.clone(),
                        overwrite: artifact.overwrite,
                    },
                })
                .collect(),
        },
    };
    let dir = Path::new(dir);
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let path = dir.join("action.yaml");
    let rendered = serde_yaml::to_string(&manifest).context("failed to render action.yaml")?;
    std::fs::write(&path, rendered)
        .with_context(|| format!("failed to write {}", path.display()))
}
