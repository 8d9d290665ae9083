//! `[deploy]` section configuration.
//!
//! Only GitHub Pages is supported: the output directory is committed to a
//! branch and pushed by the `ghp-import` helper.
//!
//! # Example
//!
//! ```toml
//! [deploy.github]
//! source_branch = "src"       # Branch holding the site sources
//! deploy_branch = "master"    # Branch served by GitHub Pages
//! remote_name = "origin"      # Remote to push to
//! helper = "ghp-import"       # Publishing helper (name or path, `~` expanded)
//! ```
//!
//! The uppercase names `GITHUB_SOURCE_BRANCH`, `GITHUB_DEPLOY_BRANCH` and
//! `GITHUB_REMOTE_NAME` are accepted as aliases.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deploy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// GitHub Pages deployment settings.
    pub github: GithubDeployConfig,
}

impl DeployConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        self.github.validate(diag);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubDeployConfig {
    #[serde(alias = "GITHUB_SOURCE_BRANCH")]
    pub source_branch: String,

    #[serde(alias = "GITHUB_DEPLOY_BRANCH")]
    pub deploy_branch: String,

    #[serde(alias = "GITHUB_REMOTE_NAME")]
    pub remote_name: String,

    /// Executable used to commit and push the output directory.
    pub helper: PathBuf,
}

impl Default for GithubDeployConfig {
    fn default() -> Self {
        Self {
            source_branch: "src".to_string(),
            deploy_branch: "master".to_string(),
            remote_name: "origin".to_string(),
            helper: PathBuf::from("ghp-import"),
        }
    }
}

impl GithubDeployConfig {
    pub const SOURCE_BRANCH: FieldPath = FieldPath::new("deploy.github.source_branch");
    pub const DEPLOY_BRANCH: FieldPath = FieldPath::new("deploy.github.deploy_branch");
    pub const REMOTE_NAME: FieldPath = FieldPath::new("deploy.github.remote_name");

    /// Validate deploy configuration.
    ///
    /// # Checks
    /// - Branch and remote names must be non-empty.
    /// - Source and deploy branch must differ: the helper replaces the deploy
    ///   branch's tree with the output directory.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, value) in [
            (Self::SOURCE_BRANCH, &self.source_branch),
            (Self::DEPLOY_BRANCH, &self.deploy_branch),
            (Self::REMOTE_NAME, &self.remote_name),
        ] {
            if value.trim().is_empty() {
                diag.error(field, format!("{} must not be empty", field.as_str()));
            }
        }

        if !self.source_branch.is_empty() && self.source_branch == self.deploy_branch {
            diag.error_with_hint(
                Self::DEPLOY_BRANCH,
                format!(
                    "source and deploy branch are both `{}`",
                    self.deploy_branch
                ),
                "deploying would overwrite the site sources; use e.g. `gh-pages`",
            );
        }
    }
}
