use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("init failed")]
    InitFailed,
    #[error("plan failed")]
    PlanFailed,
    #[error("apply failed")]
    ApplyFailed,
    #[error("plan file is not found: {0}")]
    NotFoundPlanFile(String),
    #[error("approvals are required: require {required}, approved {approved}")]
    ApprovalsRequired { required: u32, approved: u32 },
    #[error("force unlock failed")]
    ForceUnlockFailed,
    #[error("import failed")]
    ImportFailed,
    #[error("project is already locked")]
    AlreadyLocked,
    #[error("multiple lock labels exist")]
    MultipleLockLabels,
    #[error("force unlock requires exactly one target project")]
    InvalidForceUnlock,
    #[error("conflict: pull request is not mergeable ({0})")]
    NotMergeable(String),
    #[error("internal failure: {0}")]
    InternalFailure(String),
    #[error(transparent)]
    Github(#[from] mu_github::GithubError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
