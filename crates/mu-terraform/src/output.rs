/// Parsed result of an init, plan, or apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Summary line ("Plan: …", "No changes. …", "Apply complete! …"),
    /// or the error block when the run failed.
    pub result: String,
    /// Resource-change section of a plan, through the summary line.
    pub changed_result: String,
    /// Warning blocks, blank-line separated.
    pub warning: String,
    pub has_destroy: bool,
    pub has_no_changes: bool,
    pub has_error: bool,
    pub raw_log: String,
}

/// Parsed result of force-unlock, import, and state-rm runs, which have
/// no change section worth dissecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub result: String,
    pub has_error: bool,
    pub raw_log: String,
}

pub fn parse_plan_log(raw: &str) -> Output {
    let mut output = Output {
        warning: collect_warnings(raw),
        raw_log: raw.to_string(),
        ..Output::default()
    };
    if let Some(error_block) = collect_error_block(raw) {
        output.result = error_block;
        output.has_error = true;
        return output;
    }
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("No changes.") {
            output.result = trimmed.to_string();
            output.has_no_changes = true;
            break;
        }
        if trimmed.starts_with("Plan:") {
            output.result = trimmed.to_string();
            output.has_destroy = plan_summary_has_destroy(trimmed);
            break;
        }
    }
    output.changed_result = collect_change_section(raw);
    output
}

pub fn parse_apply_log(raw: &str) -> Output {
    let mut output = Output {
        warning: collect_warnings(raw),
        raw_log: raw.to_string(),
        ..Output::default()
    };
    if let Some(error_block) = collect_error_block(raw) {
        output.result = error_block;
        output.has_error = true;
        return output;
    }
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("Apply complete!") || trimmed.starts_with("Destroy complete!") {
            output.result = trimmed.to_string();
            break;
        }
    }
    output
}

pub(crate) fn parse_step_log(raw: &str, failed: bool) -> StepOutput {
    StepOutput {
        result: raw.trim().to_string(),
        has_error: failed || collect_error_block(raw).is_some(),
        raw_log: raw.to_string(),
    }
}

/// "Plan: 1 to add, 0 to change, 2 to destroy." — destroy count non-zero.
fn plan_summary_has_destroy(summary: &str) -> bool {
    summary
        .split(',')
        .filter_map(|part| {
            let part = part.trim().trim_end_matches('.');
            let count = part.split_whitespace().next()?.parse::<u64>().ok()?;
            part.ends_with("to destroy").then_some(count)
        })
        .any(|count| count > 0)
}

/// Resource-change blocks: from the line after "Terraform will perform
/// the following actions:" through the "Plan:" summary line.
fn collect_change_section(raw: &str) -> String {
    let mut section = Vec::new();
    let mut inside = false;
    for line in raw.lines() {
        if line
            .trim_start()
            .starts_with("Terraform will perform the following actions:")
        {
            inside = true;
            continue;
        }
        if !inside {
            continue;
        }
        section.push(line);
        if line.trim_start().starts_with("Plan:") {
            break;
        }
    }
    section.join("\n").trim_matches('\n').to_string()
}

/// Warning blocks start at a "Warning:" line; their detail lines are
/// indented, with blank lines inside the block. A non-indented line ends
/// the block.
fn collect_warnings(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let mut blocks: Vec<String> = Vec::new();
    let mut index = 0;
    while index < lines.len() {
        if !lines[index].trim_start().starts_with("Warning:") {
            index += 1;
            continue;
        }
        let mut block = vec![lines[index]];
        index += 1;
        while index < lines.len() {
            let line = lines[index];
            if line.trim().is_empty() || line.starts_with(' ') {
                block.push(line);
                index += 1;
            } else {
                break;
            }
        }
        while block.last().is_some_and(|line| line.trim().is_empty()) {
            block.pop();
        }
        blocks.push(block.join("\n"));
    }
    blocks.join("\n\n")
}

/// Everything from the first "Error:" line to the end of the log.
fn collect_error_block(raw: &str) -> Option<String> {
    let mut block = Vec::new();
    let mut inside = false;
    for line in raw.lines() {
        if !inside && line.trim_start().starts_with("Error:") {
            inside = true;
        }
        if inside {
            block.push(line);
        }
    }
    inside.then(|| block.join("\n").trim_matches('\n').to_string())
}
