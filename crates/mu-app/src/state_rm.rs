use mu_command::Command;
use mu_config::Config;
use mu_terraform::StateRmParams;

use crate::app::App;
use crate::errors::Result;
use crate::message::state_rm_message;

impl App {
    pub(crate) async fn execute_state_rm(
        &self,
        pr_number: u64,
        sha: &str,
        config: &Config,
        command: &Command,
    ) -> Result<()> {
        let Command::StateRm {
            project,
            addresses,
            dry_run,
            ..
        } = command
        else {
            return Ok(());
        };

        self.with_progress(pr_number, sha, async {
            let modified_files = self.github.list_files(pr_number).await?;
            let projects = self.select_projects(config, project, &modified_files);
            let [target] = projects.as_slice() else {
                self.github
                    .create_issue_comment(pr_number, "Please limit to one target project.")
                    .await?;
                return Ok(());
            };

            let terraform = self.prepare_terraform(target).await?;
            self.run_project_init(terraform.as_ref(), target, pr_number, None)
                .await?;

            let mut comment = String::new();
            for address in addresses {
                self.action.start_group(&format!(
                    "mu state --project={} --workspace={} rm {address}",
                    target.name, target.workspace
                ));
                let removed = terraform
                    .state_rm(
                        &StateRmParams {
                            address: address.clone(),
                            dry_run: *dry_run,
                        },
                        true,
                    )
                    .await;
                self.action.end_group();
                let removed = removed?;

                self.add_run_summary(
                    &format!("## mu state rm\n\n**address: {address}**"),
                    target,
                    &removed.result,
                );
                comment.push_str(&state_rm_message(address, &removed.result));
                comment.push('\n');
            }

            self.github.create_issue_comment(pr_number, &comment).await?;
            Ok(())
        })
        .await
        .map(|_| ())
    }
}
