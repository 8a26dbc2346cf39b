use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result};

/// Writer for runner-side channels: step outputs, step summaries, and
/// log groups. Channels whose env var is unset are silently skipped so
/// local runs behave.
#[derive(Debug, Default)]
pub struct Action;

impl Action {
    pub fn new() -> Self {
        Self
    }

    pub fn output(&self, key: &str, value: &str) -> Result<()> {
        let Ok(path) = std::env::var("GITHUB_OUTPUT") else {
            return Ok(());
        };
        if path.is_empty() {
            return Ok(());
        }
        append(&path, &format!("{key}={value}\n"))
    }

    pub fn add_step_summary(&self, markdown: &str) -> Result<()> {
        let Ok(path) = std::env::var("GITHUB_STEP_SUMMARY") else {
            return Ok(());
        };
        if path.is_empty() {
            return Ok(());
        }
        for line in markdown.lines() {
            append(&path, &format!("{line}\n"))?;
        }
        Ok(())
    }

    pub fn group(&self, title: &str, body: &str) {
        self.start_group(title);
        println!("{body}");
        self.end_group();
    }

    pub fn start_group(&self, title: &str) {
        println!("::group::{title}");
    }

    pub fn end_group(&self) {
        println!("::endgroup::");
    }
}

fn append(path: &str, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open {path}"))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to append to {path}"))
}
