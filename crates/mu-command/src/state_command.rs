use crate::command::{Command, ParseCommandError};
use crate::flag_scanner::{scan_flags, split_at_passthrough};

pub(crate) fn parse_state_command(args: &[String]) -> Result<Command, ParseCommandError> {
    let (command_flags, passthrough) = split_at_passthrough(args);
    let flags = scan_flags(
        command_flags,
        &[&["p", "project"], &["w", "workspace"]],
        &[],
    )
    .map_err(ParseCommandError::new)?;
    let [sub_verb, addresses @ ..] = flags.positionals() else {
        return Err(ParseCommandError::new("state requires a sub command"));
    };
    if !sub_verb.eq_ignore_ascii_case("rm") {
        return Err(ParseCommandError::new(format!(
            "unknown state sub command {sub_verb:?}"
        )));
    }
    if addresses.is_empty() {
        return Err(ParseCommandError::new("state rm requires an address"));
    }
    let options =
        scan_flags(passthrough, &[], &[&["dry-run"]]).map_err(ParseCommandError::new)?;
    Ok(Command::StateRm {
        project: flags.value("project"),
        workspace: flags.value("workspace"),
        addresses: addresses.to_vec(),
        dry_run: options.switch("dry-run"),
    })
}
