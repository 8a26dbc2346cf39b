//! Project configuration document loaded from the repository.

mod config;
mod path_match;

pub use config::{
    ApplySettings, Config, PlanSettings, Project, TerraformSettings, LATEST_TERRAFORM_VERSION,
};
