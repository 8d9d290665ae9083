//! Deployment error types.

use super::Stage;
use std::{error::Error as StdError, io, path::PathBuf};
use thiserror::Error;

/// Boxed error from `anyhow`-based helpers (build plan, git).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Why a `github-deploy` run stopped.
///
/// Every variant belongs to one [`Stage`] and maps to the process exit code
/// `main` terminates with.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{package} is required to {feature}, install it with `{install}`")]
    MissingDependency {
        package: &'static str,
        feature: &'static str,
        install: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Build failed, not deploying to GitHub")]
    Build { status: i32 },

    #[error("Failed to determine which output files are stale")]
    Scan(#[source] BoxError),

    #[error("Failed to remove stale output file `{}`", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resolve source branch `{branch}`")]
    Revision {
        branch: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed GitHub deployment: command `{command}` returned {code}")]
    Publish { command: String, code: i32 },

    #[error("Failed to record deployment time in `{}`", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeployError {
    /// Stage the pipeline was in when this error occurred.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::MissingDependency { .. } => Stage::Checking,
            Self::Build { .. } => Stage::Building,
            Self::Scan(_) | Self::Cleanup { .. } => Stage::Cleaning,
            Self::Revision { .. } | Self::Publish { .. } => Stage::Committing,
            Self::Record { .. } => Stage::Recording,
        }
    }

    /// Process exit code for this failure.
    ///
    /// Build and publish failures propagate the child's own status.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingDependency { .. } => 5,
            Self::Build { status } => *status,
            Self::Publish { code, .. } => *code,
            Self::Scan(_) | Self::Cleanup { .. } | Self::Revision { .. } | Self::Record { .. } => 1,
        }
    }

    /// The message followed by its chain of causes, `: `-separated.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
