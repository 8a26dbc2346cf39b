use mu_config::Project;
use mu_terraform::{Output, StepOutput};
use regex::Regex;
use std::sync::OnceLock;

pub(crate) const INIT_META: &str = "<!-- mu:init -->";
pub(crate) const PLAN_META: &str = "<!-- mu:plan -->";
pub(crate) const APPLY_META: &str = "<!-- mu:apply -->";

pub(crate) fn unknown_command_message(command: &str, allow_commands: &[String]) -> String {
    format!(
        "```\nError: unknown command {command:?}.\nRun 'mu help' for usage.\nAvailable commands: {}\n```\n",
        allow_commands.join(", ")
    )
}

pub(crate) fn help_message() -> String {
    const BODY: &str = "\
Mu
Terraform Pull Request Automation

Usage:
  mu <command> [options] -- [terraform options]

Examples:
  # show this help
  mu help

  # run plan in the project passing the -var flag to terraform
  mu plan -p <project> -- -var name=test

  # apply the plan for the project
  mu apply -p <project>

Commands:
  plan     Runs 'terraform plan' for the changes in this pull request.
           To plan a specific project, use the -p flags.

  apply    Runs 'terraform apply' on all unapplied plans from this pull request.
           To only apply a specific plan, use the -p flags.

  unlock   Removes all mu locks and discards all plans for this pull request.

  help     View help.

";
    format!("```\n{BODY}```\n")
}

/// Quotes `text` as a GitHub markdown alert block.
pub(crate) fn format_markdown_alert(alert: &str, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut block = format!("> [!{}]\n", alert.to_uppercase());
    for line in text.lines() {
        block.push_str("> ");
        block.push_str(line);
        block.push('\n');
    }
    block
}

fn diff_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^( +)([-+~])").expect("diff keyword regex"))
}

fn diff_tilde_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^~").expect("diff tilde regex"))
}

/// Moves terraform's change symbols to column zero so markdown diff
/// highlighting picks them up, and renders `~` changes as `!`.
pub(crate) fn format_diff_markdown(result: &str) -> String {
    if result.is_empty() {
        return String::new();
    }
    let mut formatted = String::new();
    for line in result.lines() {
        let swapped = diff_keyword_regex().replace_all(line, "$2$1");
        let rewritten = diff_tilde_regex().replace_all(&swapped, "!");
        formatted.push_str(&rewritten);
        formatted.push('\n');
    }
    formatted
}

fn project_line(project: &Project) -> String {
    format!(
        "project: `{}` dir: `{}` workspace: `{}`\n",
        project.name, project.dir, project.workspace
    )
}

pub(crate) fn init_failed_message(project: &Project, out: &Output) -> String {
    let mut msg = String::from(INIT_META);
    msg.push_str("\n:x: **Init Failed**\n");
    msg.push_str(&project_line(project));
    msg.push_str(&format_markdown_alert("CAUTION", &out.result));
    msg
}

pub(crate) fn plan_succeeded_message(project: &Project, out: &Output) -> String {
    let mut msg = String::from(PLAN_META);
    msg.push_str("\n:white_check_mark: **Plan Result**\n");
    msg.push_str(&project_line(project));
    msg.push_str("\n```\n");
    msg.push_str(&out.result);
    msg.push_str("\n```\n\n\n");
    let changed = format_diff_markdown(&out.changed_result);
    if !changed.is_empty() {
        msg.push_str("<details><summary>Show Output</summary>\n\n");
        msg.push_str("```diff\n");
        msg.push_str(&changed);
        msg.push_str("\n```\n</details>\n\n");
    }
    msg.push_str("**next step**\n");
    msg.push_str("- To apply this plan, comment:\n");
    msg.push_str("  ```\n");
    msg.push_str(&format!("  mu apply -p {}\n", project.name));
    msg.push_str("  ```\n");
    msg.push_str("- To delete this plan and lock, comment:\n");
    msg.push_str("  ```\n");
    msg.push_str(&format!("  mu unlock -p {}\n", project.name));
    msg.push_str("  ```\n");
    msg.push_str("- To plan this project again, comment:\n");
    msg.push_str("  ```\n");
    msg.push_str(&format!("  mu plan -p {}\n", project.name));
    msg.push_str("  ```\n");
    let warning = format_markdown_alert("WARNING", &out.warning);
    if !warning.is_empty() {
        msg.push_str(&warning);
        msg.push_str("\n\n");
    }
    msg
}

pub(crate) fn plan_failed_message(project: &Project, out: &Output) -> String {
    let mut msg = String::from(PLAN_META);
    msg.push_str("\n:x: **Plan Failed**\n");
    msg.push_str(&project_line(project));
    msg.push_str(&format_markdown_alert("CAUTION", &out.result));
    msg
}

pub(crate) fn apply_succeeded_message(project: &Project, out: &Output) -> String {
    let mut msg = String::from(APPLY_META);
    msg.push_str("\n:white_check_mark: **Apply Result**\n");
    msg.push_str(&project_line(project));
    msg.push_str("\n```\n");
    msg.push_str(&out.result);
    msg.push_str("\n```\n");
    let warning = format_markdown_alert("WARNING", &out.warning);
    if !warning.is_empty() {
        msg.push_str(&warning);
        msg.push_str("\n\n");
    }
    msg
}

pub(crate) fn apply_failed_message(project: &Project, out: &Output) -> String {
    let mut msg = String::from(APPLY_META);
    msg.push_str("\n:x: **Apply Failed**\n");
    msg.push_str(&project_line(project));
    msg.push_str(&format_markdown_alert("CAUTION", &out.result));
    msg
}

pub(crate) fn missing_plan_file_message(project_name: &str) -> String {
    format!(
        "{PLAN_META}\nThe plan file for the `{project_name}` project is not in the Actions Artifacts. Please run `mu plan` again."
    )
}

pub(crate) fn approvals_required_message(required: u32) -> String {
    format!(":x: At least {required} approvals are required before running `mu apply`.")
}

pub(crate) fn force_unlock_message(out: &StepOutput) -> String {
    let heading = if out.has_error {
        ":x: **Force Unlock Failed**\n"
    } else {
        ":white_check_mark: **Force Unlock**\n"
    };
    format!("{heading}\n```\n{}\n```\n", out.result)
}

pub(crate) fn import_message(project: &str, address: &str, id: &str, log: &str) -> String {
    format!("## mu import -p {project}\n**Address**: {address}\n**Id**: {id}\n```\n{log}\n```\n")
}

pub(crate) fn state_rm_message(address: &str, log: &str) -> String {
    format!("### {address}\n```\n{log}\n```\n")
}
