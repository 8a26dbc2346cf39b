//! Terraform process wrapper: a trait seam for the orchestrator and a
//! CLI-exec implementation over `tokio::process`.

mod api;
mod cli_runner;
mod output;

pub use api::{ApplyParams, ImportParams, InitParams, PlanParams, StateRmParams, Terraform};
pub use cli_runner::TerraformCli;
pub use output::{parse_apply_log, parse_plan_log, Output, StepOutput};

/// Version sentinel that disables the exact-version check.
pub const LATEST_VERSION: &str = "latest";
