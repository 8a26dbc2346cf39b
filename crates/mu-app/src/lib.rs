//! Pull-request automation core: command dispatch, project locking,
//! plan/apply execution, and result reporting.

mod app;
mod apply;
mod artifact;
mod errors;
mod force_unlock;
mod import;
mod lock;
mod message;
mod plan;
mod progress;
mod split;
mod state_rm;
mod status;

pub use app::{App, Params};
pub use errors::{AppError, Result};

#[cfg(test)]
mod test_support;
