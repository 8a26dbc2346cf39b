//! Chat command grammar for pull-request comments.
//!
//! A comment drives mu when its first line token is the literal word `mu`
//! followed by a known verb. Flags before a literal `--` belong to mu,
//! flags after it are passed through to terraform.

mod apply_command;
mod command;
mod flag_scanner;
mod import_command;
mod plan_command;
mod state_command;
mod unlock_command;

pub use command::{parse, Command, CommandKind, ParseCommandError};
