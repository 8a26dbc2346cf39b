//! Workflow-command log lines. The runner renders one record per line,
//! so embedded newlines are escaped as `%0A`.

fn emit(command: &str, level: &str, message: &str) {
    println!("::{command}::{level} {}", escape(message));
}

fn escape(message: &str) -> String {
    message.replace('\n', "%0A")
}

pub fn log_debug(message: &str) {
    emit("debug", "DEBUG", message);
}

pub fn log_notice(message: &str) {
    emit("notice", "INFO", message);
}

pub fn log_warning(message: &str) {
    emit("warning", "WARN", message);
}

pub fn log_error(message: &str) {
    emit("error", "ERROR", message);
}
