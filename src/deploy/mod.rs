//! `github-deploy`: build the site and publish it to GitHub Pages.
//!
//! # Pipeline
//!
//! ```text
//! Checking ─► Building ─► Cleaning ─► Committing ─► Recording
//!  ghp-import   build       remove      ghp-import     cache/
//!  -h check     entry       stale       -n -m -p       lastdeploy
//!                           outputs     -r -b
//! ```
//!
//! Each stage either completes or stops the run with a [`DeployError`].
//! Nothing is rolled back. [`GithubDeploy::run`] never exits the process;
//! `main` maps the error to an exit code.

mod check;
mod clean;
mod commit;
mod error;
mod record;

#[cfg(test)]
mod tests;

pub use error::DeployError;
pub use record::{LAST_DEPLOY_FILE, last_deploy};

use crate::{
    cli::build::build_entry,
    config::SiteConfig,
    logger::Logger,
    utils::{exec::CommandRunner, git::RevisionSource},
};
use chrono::NaiveDateTime;
use std::{fmt, path::PathBuf};

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checking,
    Building,
    Cleaning,
    Committing,
    Recording,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Checking => "checking",
            Self::Building => "building",
            Self::Cleaning => "cleaning",
            Self::Committing => "committing",
            Self::Recording => "recording",
        })
    }
}

/// Runs the site build and reports its status (0 means success).
pub trait SiteBuild {
    fn build(&self, config: &SiteConfig) -> i32;
}

/// The regular `skiff build`, run in this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessBuild;

impl SiteBuild for InProcessBuild {
    fn build(&self, config: &SiteConfig) -> i32 {
        build_entry(config)
    }
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    /// Source branch revision named in the commit message.
    pub revision: String,
    /// Stale output files deleted before publishing.
    pub removed: Vec<PathBuf>,
    /// Timestamp written to `<cache>/lastdeploy`.
    pub recorded_at: NaiveDateTime,
}

/// One `github-deploy` invocation.
pub struct GithubDeploy<'a> {
    config: &'a SiteConfig,
    builder: &'a dyn SiteBuild,
    runner: &'a dyn CommandRunner,
    revisions: &'a dyn RevisionSource,
    logger: Logger,
}

impl<'a> GithubDeploy<'a> {
    pub fn new(
        config: &'a SiteConfig,
        builder: &'a dyn SiteBuild,
        runner: &'a dyn CommandRunner,
        revisions: &'a dyn RevisionSource,
    ) -> Self {
        Self {
            config,
            builder,
            runner,
            revisions,
            logger: Logger::new("github_deploy"),
        }
    }

    /// Replace the terminal logger.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Run every stage. The error is logged before it is returned.
    pub fn run(&self) -> Result<Deployed, DeployError> {
        self.run_stages().inspect_err(|err| {
            self.logger.debug(format!("stopped while {}", err.stage()));
            self.logger.error(err.report());
        })
    }

    fn run_stages(&self) -> Result<Deployed, DeployError> {
        let config = self.config;
        let logger = &self.logger;

        match last_deploy(&config.build.cache) {
            Ok(Some(at)) => logger.debug(format!("previous deployment at {at} UTC")),
            Ok(None) => logger.debug("no previous deployment recorded"),
            Err(e) => logger.debug(format!("{e:#}")),
        }

        check::ensure_helper(self.runner, &config.deploy.github.helper, logger)?;

        let status = self.builder.build(config);
        if status != 0 {
            return Err(DeployError::Build { status });
        }

        let diff = clean::stale_files(config)?;
        let removed = clean::remove_stale(config, diff, logger)?;

        let revision = commit::publish(config, self.runner, self.revisions, logger)?;

        let recorded_at = record::record_deploy(&config.build.cache)?;
        logger.debug(format!(
            "recorded deployment in {}",
            config
                .root_relative(config.build.cache.join(LAST_DEPLOY_FILE))
                .display()
        ));

        Ok(Deployed {
            revision,
            removed,
            recorded_at,
        })
    }
}
