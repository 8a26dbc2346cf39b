use crate::command::{Command, ParseCommandError};
use crate::flag_scanner::{scan_flags, split_at_passthrough};

pub(crate) fn parse_import_command(args: &[String]) -> Result<Command, ParseCommandError> {
    let (command_flags, passthrough) = split_at_passthrough(args);
    let flags = scan_flags(
        command_flags,
        &[&["p", "project"], &["w", "workspace"]],
        &[],
    )
    .map_err(ParseCommandError::new)?;
    let [address, id] = flags.positionals() else {
        return Err(ParseCommandError::new(
            "import requires an address and an id",
        ));
    };
    let options =
        scan_flags(passthrough, &[&["var"], &["var-file"]], &[]).map_err(ParseCommandError::new)?;
    Ok(Command::Import {
        project: flags.value("project"),
        workspace: flags.value("workspace"),
        address: address.clone(),
        id: id.clone(),
        vars: options.values("var"),
        var_files: options.values("var-file"),
    })
}
