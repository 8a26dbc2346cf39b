use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::path_match::PathMatcher;

pub const LATEST_TERRAFORM_VERSION: &str = "latest";

const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
    pub dir: String,
    #[serde(default)]
    pub workspace: String,
    #[serde(default)]
    pub terraform: TerraformSettings,
    pub plan: PlanSettings,
    #[serde(default)]
    pub apply: ApplySettings,
    #[serde(default)]
    pub lock_label_color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerraformSettings {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub exec_path: String,
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default)]
    pub var_files: Vec<String>,
    #[serde(default)]
    pub backend_config: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub backend_config_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanSettings {
    pub paths: Vec<String>,
    #[serde(default)]
    pub auto: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplySettings {
    #[serde(default)]
    pub require_approvals: u32,
}

impl Config {
    /// Loads the document from disk, expanding `$VAR`/`${VAR}` environment
    /// references before parsing and applying the default terraform
    /// version to projects that leave it unset.
    pub fn load(path: impl AsRef<Path>, default_terraform_version: &str) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let expanded = expand_env(&raw);
        let mut config: Config = serde_yaml::from_str(&expanded)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        for project in &mut config.projects {
            project.dir = normalize_dir(&project.dir);
            if project.terraform.version.is_empty() {
                project.terraform.version = if default_terraform_version.is_empty() {
                    LATEST_TERRAFORM_VERSION.to_string()
                } else {
                    default_terraform_version.to_string()
                };
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != SUPPORTED_VERSION {
            bail!("unsupported config version {}", self.version);
        }
        if self.projects.is_empty() {
            bail!("config declares no projects");
        }
        let mut seen = HashSet::new();
        for project in &self.projects {
            if project.name.is_empty() {
                bail!("project with empty name");
            }
            if !seen.insert(project.name.as_str()) {
                bail!("duplicate project name {:?}", project.name);
            }
            if project.dir.is_empty() {
                bail!("project {:?} has no dir", project.name);
            }
            if project.plan.paths.is_empty() {
                bail!("project {:?} has no plan paths", project.name);
            }
        }
        Ok(())
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.name == name)
    }
}

impl Project {
    /// True when any of the pull request's changed files falls under the
    /// project's plan trigger patterns.
    pub fn has_modified_files(&self, files: &[String]) -> bool {
        self.plan.matches_paths(&self.dir, files)
    }
}

impl PlanSettings {
    pub fn matches_paths(&self, base_dir: &str, files: &[String]) -> bool {
        let Ok(matcher) = PathMatcher::new(base_dir, &self.paths) else {
            return false;
        };
        files.iter().any(|file| matcher.matches(file))
    }
}

fn normalize_dir(dir: &str) -> String {
    let trimmed = dir.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Expands `$NAME` and `${NAME}` references against the process
/// environment. Unset variables expand to the empty string.
fn expand_env(raw: &str) -> String {
    let mut expanded = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if ch != '$' {
            expanded.push(ch);
            continue;
        }
        match chars.peek() {
            Some((_, '{')) => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if closed {
                    expanded.push_str(&std::env::var(&name).unwrap_or_default());
                } else {
                    expanded.push_str("${");
                    expanded.push_str(&name);
                }
            }
            Some((_, next)) if next.is_ascii_alphabetic() || *next == '_' => {
                let mut name = String::new();
                while let Some((_, inner)) = chars.peek() {
                    if inner.is_ascii_alphanumeric() || *inner == '_' {
                        name.push(*inner);
                        chars.next();
                    } else {
                        break;
                    }
                }
                expanded.push_str(&std::env::var(&name).unwrap_or_default());
            }
            _ => expanded.push('$'),
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::Config;

    const SAMPLE: &str = r#"
version: 1
projects:
  - name: core
    dir: ./terraform/core/
    workspace: default
    plan:
      paths:
        - "**/*.tf"
        - "!**/README.md"
      auto: true
    apply:
      require_approvals: 2
    lock_label_color: "aa00ff"
  - name: network
    dir: terraform/network
    terraform:
      version: 1.7.0
    plan:
      paths:
        - "*.tf"
"#;

    fn write_config(raw: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(raw.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn functional_load_normalizes_dirs_and_applies_default_version() {
        let file = write_config(SAMPLE);
        let config = Config::load(file.path(), "1.6.2").expect("loaded");
        config.validate().expect("valid");

        let core = config.project("core").expect("core project");
        assert_eq!(core.dir, "terraform/core");
        assert_eq!(core.terraform.version, "1.6.2");
        assert_eq!(core.apply.require_approvals, 2);
        assert!(core.plan.auto);

        let network = config.project("network").expect("network project");
        assert_eq!(network.terraform.version, "1.7.0");
        assert!(!network.plan.auto);
    }

    #[test]
    fn unit_load_falls_back_to_latest_without_default_version() {
        let file = write_config(SAMPLE);
        let config = Config::load(file.path(), "").expect("loaded");
        assert_eq!(
            config.project("core").expect("core").terraform.version,
            "latest"
        );
    }

    #[test]
    fn functional_load_expands_environment_references() {
        std::env::set_var("MU_TEST_BUCKET", "state-bucket");
        let raw = r#"
version: 1
projects:
  - name: core
    dir: terraform/core
    terraform:
      backend_config:
        bucket: "${MU_TEST_BUCKET}"
    plan:
      paths: ["**/*.tf"]
"#;
        let file = write_config(raw);
        let config = Config::load(file.path(), "").expect("loaded");
        let core = config.project("core").expect("core");
        assert_eq!(
            core.terraform.backend_config.get("bucket").map(String::as_str),
            Some("state-bucket")
        );
    }

    #[test]
    fn regression_validate_rejects_bad_documents() {
        for raw in [
            "version: 2\nprojects:\n  - name: a\n    dir: d\n    plan:\n      paths: [x]\n",
            "version: 1\nprojects: []\n",
            concat!(
                "version: 1\nprojects:\n",
                "  - name: a\n    dir: d\n    plan:\n      paths: [x]\n",
                "  - name: a\n    dir: e\n    plan:\n      paths: [y]\n",
            ),
            "version: 1\nprojects:\n  - name: a\n    dir: d\n    plan:\n      paths: []\n",
        ] {
            let file = write_config(raw);
            let config = Config::load(file.path(), "").expect("loaded");
            assert!(config.validate().is_err(), "expected invalid: {raw}");
        }
    }
}
