use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::api::{ApplyParams, ImportParams, InitParams, PlanParams, StateRmParams, Terraform};
use crate::output::{parse_apply_log, parse_plan_log, parse_step_log, Output, StepOutput};
use crate::LATEST_VERSION;

/// Runs the terraform binary with captured output, optionally echoing it
/// to the workflow log line by line.
pub struct TerraformCli {
    version: String,
    exec_path: String,
    work_dir: PathBuf,
}

struct RunOutcome {
    success: bool,
    stdout: String,
    stderr: String,
}

impl TerraformCli {
    pub fn new(version: &str, exec_path: &str, work_dir: &Path) -> Self {
        let exec_path = if exec_path.is_empty() {
            "terraform".to_string()
        } else {
            exec_path.to_string()
        };
        Self {
            version: version.to_ascii_lowercase(),
            exec_path,
            work_dir: work_dir.to_path_buf(),
        }
    }

    async fn run(&self, args: &[String], stream: bool) -> Result<RunOutcome> {
        let mut child = Command::new(&self.exec_path)
            .args(args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.exec_path))?;
        let stdout = child.stdout.take().context("child stdout missing")?;
        let stderr = child.stderr.take().context("child stderr missing")?;
        let (stdout, stderr) = tokio::join!(
            capture(stdout, stream, false),
            capture(stderr, stream, true),
        );
        let status = child.wait().await.context("terraform did not exit")?;
        Ok(RunOutcome {
            success: status.success(),
            stdout: stdout.context("failed to read terraform stdout")?,
            stderr: stderr.context("failed to read terraform stderr")?,
        })
    }

    /// Failed runs report through the parsed output when terraform wrote
    /// a diagnostic; an empty stderr means something other than terraform
    /// failed and becomes a hard error.
    async fn run_parsed(
        &self,
        args: &[String],
        stream: bool,
        parse: fn(&str) -> Output,
    ) -> Result<Output> {
        let outcome = self.run(args, stream).await?;
        if outcome.success {
            return Ok(parse(&outcome.stdout));
        }
        if outcome.stderr.is_empty() {
            bail!("terraform {} exited with a failure and no output", args[0]);
        }
        let mut output = parse(&outcome.stderr);
        output.has_error = true;
        Ok(output)
    }

    async fn run_step(&self, args: &[String], stream: bool) -> Result<StepOutput> {
        let outcome = self.run(args, stream).await?;
        if outcome.success {
            return Ok(parse_step_log(&outcome.stdout, false));
        }
        if outcome.stderr.is_empty() {
            bail!("terraform {} exited with a failure and no output", args[0]);
        }
        Ok(parse_step_log(&outcome.stderr, true))
    }

    async fn binary_version(&self) -> Result<String> {
        let outcome = self.run(&["version".to_string()], false).await?;
        if !outcome.success {
            bail!("terraform version exited with a failure");
        }
        parse_version_line(&outcome.stdout)
            .with_context(|| format!("unrecognized terraform version output: {}", outcome.stdout))
    }
}

async fn capture<R: AsyncRead + Unpin>(
    reader: R,
    stream: bool,
    to_stderr: bool,
) -> std::io::Result<String> {
    let mut lines = BufReader::new(reader).lines();
    let mut collected = String::new();
    while let Some(line) = lines.next_line().await? {
        if stream {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    Ok(collected)
}

/// First "Terraform vX.Y.Z" line of `terraform version` output.
fn parse_version_line(raw: &str) -> Option<String> {
    raw.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Terraform v")
            .map(|version| version.trim().to_string())
    })
}

#[async_trait]
impl Terraform for TerraformCli {
    async fn setup(&self) -> Result<()> {
        self.binary_version().await.map(|_| ())
    }

    async fn compare_version(&self, required: &str) -> Result<()> {
        if required.is_empty() || self.version == LATEST_VERSION {
            return Ok(());
        }
        let actual = self.binary_version().await?;
        if actual != required {
            bail!("terraform version mismatch: required {required}, installed {actual}");
        }
        Ok(())
    }

    async fn switch_workspace(&self, workspace: &str) -> Result<()> {
        if workspace.is_empty() || workspace == "default" {
            return Ok(());
        }
        let select = vec![
            "workspace".to_string(),
            "select".to_string(),
            workspace.to_string(),
        ];
        if self.run(&select, false).await?.success {
            return Ok(());
        }
        let new = vec![
            "workspace".to_string(),
            "new".to_string(),
            workspace.to_string(),
        ];
        let outcome = self.run(&new, false).await?;
        if !outcome.success {
            bail!(
                "failed to create terraform workspace {workspace}: {}",
                outcome.stderr.trim()
            );
        }
        Ok(())
    }

    async fn init(&self, params: &InitParams, stream: bool) -> Result<Output> {
        let mut args = vec![
            "init".to_string(),
            "-no-color".to_string(),
            "-input=false".to_string(),
        ];
        if !params.backend_config_path.is_empty() {
            args.push(format!("-backend-config={}", params.backend_config_path));
        }
        for (key, value) in &params.backend_config {
            args.push(format!("-backend-config={key}={value}"));
        }
        if !params.backend_config_path.is_empty() || !params.backend_config.is_empty() {
            args.push("-reconfigure".to_string());
        }
        self.run_parsed(&args, stream, parse_plan_log).await
    }

    async fn plan(&self, params: &PlanParams, stream: bool) -> Result<Output> {
        let mut args = vec![
            "plan".to_string(),
            "-no-color".to_string(),
            "-input=false".to_string(),
        ];
        for var in &params.vars {
            args.push(format!("-var={var}"));
        }
        for var_file in &params.var_files {
            args.push(format!("-var-file={var_file}"));
        }
        if !params.out.is_empty() {
            args.push(format!("-out={}", params.out));
        }
        if params.destroy {
            args.push("-destroy".to_string());
        }
        self.run_parsed(&args, stream, parse_plan_log).await
    }

    async fn apply(&self, params: &ApplyParams, stream: bool) -> Result<Output> {
        let mut args = vec![
            "apply".to_string(),
            "-no-color".to_string(),
            "-input=false".to_string(),
        ];
        if !params.plan_file_path.is_empty() {
            args.push(params.plan_file_path.clone());
        }
        self.run_parsed(&args, stream, parse_apply_log).await
    }

    async fn force_unlock(&self, lock_id: &str, stream: bool) -> Result<StepOutput> {
        let args = vec![
            "force-unlock".to_string(),
            "-force".to_string(),
            lock_id.to_string(),
        ];
        self.run_step(&args, stream).await
    }

    async fn import_resource(&self, params: &ImportParams, stream: bool) -> Result<StepOutput> {
        let mut args = vec![
            "import".to_string(),
            "-no-color".to_string(),
            "-input=false".to_string(),
        ];
        for var in &params.vars {
            args.push(format!("-var={var}"));
        }
        for var_file in &params.var_files {
            args.push(format!("-var-file={var_file}"));
        }
        args.push(params.address.clone());
        args.push(params.id.clone());
        self.run_step(&args, stream).await
    }

    async fn state_rm(&self, params: &StateRmParams, stream: bool) -> Result<StepOutput> {
        let mut args = vec!["state".to_string(), "rm".to_string()];
        if params.dry_run {
            args.push("-dry-run".to_string());
        }
        args.push(params.address.clone());
        self.run_step(&args, stream).await
    }
}
