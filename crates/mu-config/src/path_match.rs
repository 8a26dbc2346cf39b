use std::path::Path;

use anyhow::Result;
use globset::{GlobBuilder, GlobMatcher};

struct Pattern {
    matcher: GlobMatcher,
    exclusion: bool,
}

/// Ordered glob patterns rooted at a project directory. A leading `!`
/// marks an exclusion; later patterns override earlier ones, and a file
/// matches when the pattern covers the file itself or one of its parent
/// directories.
pub(crate) struct PathMatcher {
    patterns: Vec<Pattern>,
}

impl PathMatcher {
    pub(crate) fn new(base_dir: &str, raw_patterns: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (body, exclusion) = match trimmed.strip_prefix('!') {
                Some(rest) => (rest, true),
                None => (trimmed, false),
            };
            let joined = join_pattern(base_dir, body);
            let matcher = GlobBuilder::new(&joined)
                .literal_separator(true)
                .build()?
                .compile_matcher();
            patterns.push(Pattern { matcher, exclusion });
        }
        Ok(Self { patterns })
    }

    pub(crate) fn matches(&self, file: &str) -> bool {
        let mut matched = false;
        for pattern in &self.patterns {
            if matches_or_parent_matches(&pattern.matcher, file) {
                matched = !pattern.exclusion;
            }
        }
        matched
    }
}

fn join_pattern(base_dir: &str, pattern: &str) -> String {
    let base = base_dir.trim_matches('/');
    if base.is_empty() || base == "." {
        pattern.to_string()
    } else {
        format!("{base}/{}", pattern.trim_start_matches('/'))
    }
}

fn matches_or_parent_matches(matcher: &GlobMatcher, file: &str) -> bool {
    if matcher.is_match(file) {
        return true;
    }
    let mut parent = Path::new(file).parent();
    while let Some(dir) = parent {
        if dir.as_os_str().is_empty() {
            break;
        }
        if matcher.is_match(dir) {
            return true;
        }
        parent = dir.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::PathMatcher;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn unit_matches_joins_patterns_under_the_project_dir() {
        let matcher =
            PathMatcher::new("terraform/core", &strings(&["**/*.tf"])).expect("matcher");
        assert!(matcher.matches("terraform/core/vpc/main.tf"));
        assert!(!matcher.matches("terraform/other/main.tf"));
        assert!(!matcher.matches("terraform/core/vpc/README.md"));
    }

    #[test]
    fn functional_matches_applies_exclusions_in_order() {
        let matcher = PathMatcher::new(
            "infra",
            &strings(&["**/*.tf", "!modules/**/*.tf"]),
        )
        .expect("matcher");
        assert!(matcher.matches("infra/main.tf"));
        assert!(!matcher.matches("infra/modules/vpc/main.tf"));
    }

    #[test]
    fn functional_matches_covers_parent_directories() {
        let matcher = PathMatcher::new(".", &strings(&["terraform"])).expect("matcher");
        assert!(matcher.matches("terraform/core/main.tf"));
        assert!(!matcher.matches("docs/terraform.md"));
    }

    #[test]
    fn regression_blank_patterns_are_skipped() {
        let matcher = PathMatcher::new("infra", &strings(&["  ", "*.tf"])).expect("matcher");
        assert!(matcher.matches("infra/main.tf"));
    }
}
