use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::output::{Output, StepOutput};

#[derive(Debug, Clone, Default)]
pub struct InitParams {
    pub backend_config: BTreeMap<String, String>,
    pub backend_config_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlanParams {
    pub vars: Vec<String>,
    pub var_files: Vec<String>,
    pub destroy: bool,
    /// Plan file path to write, relative to the working directory.
    pub out: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyParams {
    pub plan_file_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportParams {
    pub address: String,
    pub id: String,
    pub vars: Vec<String>,
    pub var_files: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StateRmParams {
    pub address: String,
    pub dry_run: bool,
}

/// Terraform execution seam. `stream` echoes raw process output to the
/// workflow log while it is also captured for parsing.
#[async_trait]
pub trait Terraform: Send + Sync {
    /// Verifies the configured executable responds before any project
    /// step runs.
    async fn setup(&self) -> Result<()>;

    /// Fails when the binary version differs from `required`. Empty
    /// `required` and the `latest` sentinel skip the check.
    async fn compare_version(&self, required: &str) -> Result<()>;

    /// Selects the workspace, creating it on first use. The empty and
    /// `default` workspaces need no switch.
    async fn switch_workspace(&self, workspace: &str) -> Result<()>;

    async fn init(&self, params: &InitParams, stream: bool) -> Result<Output>;

    async fn plan(&self, params: &PlanParams, stream: bool) -> Result<Output>;

    async fn apply(&self, params: &ApplyParams, stream: bool) -> Result<Output>;

    async fn force_unlock(&self, lock_id: &str, stream: bool) -> Result<StepOutput>;

    async fn import_resource(&self, params: &ImportParams, stream: bool) -> Result<StepOutput>;

    async fn state_rm(&self, params: &StateRmParams, stream: bool) -> Result<StepOutput>;
}
