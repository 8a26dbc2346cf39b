use crate::command::{Command, ParseCommandError};
use crate::flag_scanner::{scan_flags, split_at_passthrough};

pub(crate) fn parse_unlock_command(args: &[String]) -> Result<Command, ParseCommandError> {
    // Unlock has no terraform passthrough region; tokens after `--` are
    // dropped.
    let (command_flags, _) = split_at_passthrough(args);
    let flags = scan_flags(
        command_flags,
        &[&["p", "project"], &["w", "workspace"], &["force-unlock"]],
        &[],
    )
    .map_err(ParseCommandError::new)?;
    Ok(Command::Unlock {
        project: flags.value("project"),
        workspace: flags.value("workspace"),
        force_unlock_id: flags.value("force-unlock"),
    })
}
