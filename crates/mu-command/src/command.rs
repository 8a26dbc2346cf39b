use thiserror::Error;

use crate::apply_command::parse_apply_command;
use crate::import_command::parse_import_command;
use crate::plan_command::parse_plan_command;
use crate::state_command::parse_state_command;
use crate::unlock_command::parse_unlock_command;

const MU_WORD: &str = "mu";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid mu command: {reason}")]
pub struct ParseCommandError {
    pub reason: String,
}

impl ParseCommandError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A parsed pull-request comment command. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Plan {
        project: String,
        workspace: String,
        vars: Vec<String>,
        var_files: Vec<String>,
        destroy: bool,
    },
    Apply {
        project: String,
        workspace: String,
    },
    Unlock {
        project: String,
        workspace: String,
        force_unlock_id: String,
    },
    Help,
    Import {
        project: String,
        workspace: String,
        address: String,
        id: String,
        vars: Vec<String>,
        var_files: Vec<String>,
    },
    StateRm {
        project: String,
        workspace: String,
        addresses: Vec<String>,
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Plan,
    Apply,
    Unlock,
    Help,
    Import,
    State,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Plan => "plan",
            CommandKind::Apply => "apply",
            CommandKind::Unlock => "unlock",
            CommandKind::Help => "help",
            CommandKind::Import => "import",
            CommandKind::State => "state",
        }
    }

    /// Title-cased form used in user-facing notices.
    pub fn title(&self) -> &'static str {
        match self {
            CommandKind::Plan => "Plan",
            CommandKind::Apply => "Apply",
            CommandKind::Unlock => "Unlock",
            CommandKind::Help => "Help",
            CommandKind::Import => "Import",
            CommandKind::State => "State",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Plan { .. } => CommandKind::Plan,
            Command::Apply { .. } => CommandKind::Apply,
            Command::Unlock { .. } => CommandKind::Unlock,
            Command::Help => CommandKind::Help,
            Command::Import { .. } => CommandKind::Import,
            Command::StateRm { .. } => CommandKind::State,
        }
    }

    pub fn project(&self) -> &str {
        match self {
            Command::Plan { project, .. }
            | Command::Apply { project, .. }
            | Command::Unlock { project, .. }
            | Command::Import { project, .. }
            | Command::StateRm { project, .. } => project,
            Command::Help => "",
        }
    }
}

/// Parses one comment line into a [`Command`].
///
/// The input must be a single line starting with the word `mu` followed by
/// a known verb; anything else is a [`ParseCommandError`], which callers
/// treat as "not addressed to mu".
pub fn parse(message: &str) -> Result<Command, ParseCommandError> {
    let message = message.trim();
    if message.contains(['\r', '\n']) {
        return Err(ParseCommandError::new("command must be a single line"));
    }
    let tokens = shell_words::split(message)
        .map_err(|error| ParseCommandError::new(format!("bad quoting: {error}")))?;
    if tokens.len() < 2 {
        return Err(ParseCommandError::new("missing command verb"));
    }
    if !tokens[0].eq_ignore_ascii_case(MU_WORD) {
        return Err(ParseCommandError::new("not a mu command"));
    }
    let verb = tokens[1].to_ascii_lowercase();
    let args = &tokens[2..];
    match verb.as_str() {
        "plan" => parse_plan_command(args),
        "apply" => parse_apply_command(args),
        "unlock" => parse_unlock_command(args),
        "help" => Ok(Command::Help),
        "import" => parse_import_command(args),
        "state" => parse_state_command(args),
        other => Err(ParseCommandError::new(format!("unknown verb {other:?}"))),
    }
}
