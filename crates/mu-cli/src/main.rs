use std::process::ExitCode;
use std::sync::Arc;

use mu_action::{input, log_debug, log_error, owner, repo};
use mu_app::{App, Params};
use mu_github::{event_from_env, GithubClient, GithubError};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn fail(message: &str) -> ExitCode {
    log_error(message);
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    println!("mu (version={VERSION})");

    let event = match event_from_env() {
        Ok(event) => event,
        Err(GithubError::UnsupportedEvent(name)) => {
            // Workflows may wire the action to triggers we do not handle.
            log_debug(&format!("ignoring event {name:?}"));
            return ExitCode::SUCCESS;
        }
        Err(error) => return fail(&format!("failed to decode event: {error}")),
    };

    let token = input("github_token");
    if token.is_empty() {
        return fail("invalid github_token");
    }
    let config_path = input("config_path");
    if config_path.is_empty() {
        return fail("invalid config_path");
    }
    let disable_summary_log = match input("disable_summary_log").trim().parse::<bool>() {
        Ok(value) => value,
        Err(_) => return fail("invalid disable_summary_log"),
    };
    let allow_commands: Vec<String> = input("allow_commands")
        .to_lowercase()
        .split(',')
        .map(|command| command.trim().to_string())
        .filter(|command| !command.is_empty())
        .collect();

    let github = match GithubClient::new(&token, &owner(), &repo()) {
        Ok(client) => Arc::new(client),
        Err(error) => return fail(&format!("failed to setup github client: {error}")),
    };

    let app = App::new(Params {
        github,
        config_path,
        default_terraform_version: input("default_terraform_version"),
        upload_artifact_version: input("upload_artifact_version"),
        upload_artifact_dir: input("upload_artifact_dir"),
        allow_commands,
        disable_summary_log,
        emoji_reaction: input("emoji_reaction"),
    });

    tokio::select! {
        result = app.execute(event) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => fail(&error.to_string()),
        },
        _ = tokio::signal::ctrl_c() => fail("interrupted"),
    }
}
