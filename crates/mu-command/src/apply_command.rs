use crate::command::{Command, ParseCommandError};
use crate::flag_scanner::scan_flags;

pub(crate) fn parse_apply_command(args: &[String]) -> Result<Command, ParseCommandError> {
    let flags = scan_flags(args, &[&["p", "project"], &["w", "workspace"]], &[])
        .map_err(ParseCommandError::new)?;
    Ok(Command::Apply {
        project: flags.value("project"),
        workspace: flags.value("workspace"),
    })
}
