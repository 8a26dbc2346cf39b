use mu_command::Command;
use mu_config::Config;
use mu_terraform::ImportParams;

use crate::app::App;
use crate::errors::{AppError, Result};
use crate::message::import_message;

impl App {
    pub(crate) async fn execute_import(
        &self,
        pr_number: u64,
        sha: &str,
        config: &Config,
        command: &Command,
    ) -> Result<()> {
        let Command::Import {
            project,
            address,
            id,
            vars,
            var_files,
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

            self.action.start_group(&format!(
                "mu import --project={} --workspace={}",
                target.name, target.workspace
            ));
            let imported = terraform
                .import_resource(
                    &ImportParams {
                        address: address.clone(),
                        id: id.clone(),
                        vars: vars.clone(),
                        var_files: var_files.clone(),
                    },
                    true,
                )
                .await;
            self.action.end_group();
            let imported = imported?;

            self.add_run_summary("## mu import", target, &imported.result);
            self.github
                .create_issue_comment(
                    pr_number,
                    &import_message(&target.name, address, id, &imported.result),
                )
                .await?;
            if imported.has_error {
                return Err(AppError::ImportFailed);
            }
            Ok(())
        })
        .await
        .map(|_| ())
    }
}
