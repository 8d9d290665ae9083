//! Availability check for the publishing helper.

use super::DeployError;
use crate::{
    logger::Logger,
    utils::exec::{Cmd, CommandRunner},
};
use std::path::Path;

const PACKAGE: &str = "ghp-import";
const FEATURE: &str = "deploy the site to GitHub Pages";
const INSTALL: &str = "pip install ghp-import";

/// Fail with [`DeployError::MissingDependency`] unless `helper -h` starts.
///
/// The exit code of `-h` is ignored: any helper that runs is present.
pub fn ensure_helper(
    runner: &dyn CommandRunner,
    helper: &Path,
    logger: &Logger,
) -> Result<(), DeployError> {
    match runner.run_silent(Cmd::new(helper).arg("-h")) {
        Ok(0) => Ok(()),
        Ok(code) => {
            logger.debug(format!("`{} -h` exited with {code}", helper.display()));
            Ok(())
        }
        Err(source) => Err(DeployError::MissingDependency {
            package: PACKAGE,
            feature: FEATURE,
            install: INSTALL,
            source,
        }),
    }
}
