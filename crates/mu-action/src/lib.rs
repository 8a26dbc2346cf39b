//! GitHub Actions ambient IO: inputs, outputs, step summaries, and
//! workflow-command log lines.

mod env;
mod runner;
mod workflow_log;

pub use env::{input, label_url, owner, repo, run_url};
pub use runner::Action;
pub use workflow_log::{log_debug, log_error, log_notice, log_warning};
