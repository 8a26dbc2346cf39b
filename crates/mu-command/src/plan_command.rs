use crate::command::{Command, ParseCommandError};
use crate::flag_scanner::{scan_flags, split_at_passthrough};

pub(crate) fn parse_plan_command(args: &[String]) -> Result<Command, ParseCommandError> {
    let (command_flags, passthrough) = split_at_passthrough(args);
    let flags = scan_flags(
        command_flags,
        &[&["p", "project"], &["w", "workspace"]],
        &[],
    )
    .map_err(ParseCommandError::new)?;
    let options = scan_flags(passthrough, &[&["var"], &["var-file"]], &[&["destroy"]])
        .map_err(ParseCommandError::new)?;
    Ok(Command::Plan {
        project: flags.value("project"),
        workspace: flags.value("workspace"),
        vars: options.values("var"),
        var_files: options.values("var-file"),
        destroy: options.switch("destroy"),
    })
}
