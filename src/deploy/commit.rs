//! Publish the output directory with `ghp-import`.

use super::DeployError;
use crate::{
    config::SiteConfig,
    logger::Logger,
    utils::{
        exec::{Cmd, CommandRunner},
        git::RevisionSource,
    },
};

/// Commit message for the deploy branch: source revision, then tool version.
pub fn commit_message(revision: &str) -> String {
    format!(
        "Skiff auto commit.\n\nSource commit: {}\nSkiff version: {}",
        revision.trim(),
        env!("CARGO_PKG_VERSION")
    )
}

/// `<helper> -n -m <message> -p -r <remote> -b <deploy_branch> <output>`,
/// run from the site root.
pub fn helper_command(config: &SiteConfig, message: &str) -> Cmd {
    let github = &config.deploy.github;
    Cmd::new(&github.helper)
        .args(["-n", "-m", message, "-p"])
        .args(["-r", github.remote_name.as_str()])
        .args(["-b", github.deploy_branch.as_str()])
        .arg(&config.build.output)
        .cwd(config.get_root())
}

/// Resolve the source branch and push the output directory.
///
/// Returns the revision the deployment was made from.
pub fn publish(
    config: &SiteConfig,
    runner: &dyn CommandRunner,
    revisions: &dyn RevisionSource,
    logger: &Logger,
) -> Result<String, DeployError> {
    let branch = &config.deploy.github.source_branch;
    let revision = revisions
        .resolve(branch)
        .map_err(|e| DeployError::Revision {
            branch: branch.clone(),
            source: e.into(),
        })?;
    logger.debug(format!("source branch `{branch}` is at {revision}"));

    let cmd = helper_command(config, &commit_message(&revision));
    let command = cmd.to_string();
    logger.info(format!("==> {command}"));

    let code = match runner.status(cmd) {
        Ok(code) => code,
        Err(e) => {
            // Spawn failure after a successful availability check: report as "command not found".
            logger.debug(format!("failed to start helper: {e}"));
            127
        }
    };

    if code != 0 {
        return Err(DeployError::Publish { command, code });
    }

    logger.info("Successful deployment");
    Ok(revision.trim().to_string())
}
