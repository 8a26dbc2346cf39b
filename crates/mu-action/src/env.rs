/// Action input, resolved the way the runner exposes it: `INPUT_` plus
/// the upper-snake name.
pub fn input(name: &str) -> String {
    let key = format!("INPUT_{}", name.to_uppercase().replace(' ', "_"));
    std::env::var(key).unwrap_or_default()
}

pub fn owner() -> String {
    std::env::var("GITHUB_REPOSITORY_OWNER").unwrap_or_default()
}

pub fn repo() -> String {
    let full = std::env::var("GITHUB_REPOSITORY").unwrap_or_default();
    let prefix = format!("{}/", owner());
    full.strip_prefix(&prefix).unwrap_or(&full).to_string()
}

/// Link to the current workflow run, empty outside a run.
pub fn run_url() -> String {
    let repo = std::env::var("GITHUB_REPOSITORY").unwrap_or_default();
    let id = std::env::var("GITHUB_RUN_ID").unwrap_or_default();
    if repo.is_empty() || id.is_empty() {
        return String::new();
    }
    format!("https://github.com/{repo}/actions/runs/{id}")
}

/// Link to a repository label page, empty when unresolvable.
pub fn label_url(label: &str) -> String {
    let repo = std::env::var("GITHUB_REPOSITORY").unwrap_or_default();
    if repo.is_empty() || label.is_empty() {
        return String::new();
    }
    format!("https://github.com/{repo}/labels/{label}")
}
