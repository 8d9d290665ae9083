//! Last-deployment timestamp under the cache directory.
//!
//! The file holds one naive UTC timestamp such as
//! `2024-05-01T09:30:12.048211` and is overwritten on every deployment.

use super::DeployError;
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use std::{fs, io, path::Path};

/// File name inside `build.cache`.
pub const LAST_DEPLOY_FILE: &str = "lastdeploy";

const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
// `%.f` also accepts timestamps without a fractional part.
const READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Record the current UTC time as the last successful deployment.
///
/// Returns the time as written, truncated to microseconds.
pub fn record_deploy(cache: &Path) -> Result<NaiveDateTime, DeployError> {
    let now = Utc::now().naive_utc().trunc_subsecs(6);
    record_deploy_at(cache, now)?;
    Ok(now)
}

/// Write `at` to `<cache>/lastdeploy`, creating `cache` as needed.
pub fn record_deploy_at(cache: &Path, at: NaiveDateTime) -> Result<(), DeployError> {
    let path = cache.join(LAST_DEPLOY_FILE);
    let error = |source| DeployError::Record {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(cache).map_err(error)?;
    fs::write(&path, at.format(WRITE_FORMAT).to_string()).map_err(error)
}

/// Read the last deployment time, `None` if there has not been one.
pub fn last_deploy(cache: &Path) -> Result<Option<NaiveDateTime>> {
    let path = cache.join(LAST_DEPLOY_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    let at = NaiveDateTime::parse_from_str(text.trim(), READ_FORMAT)
        .with_context(|| format!("invalid timestamp in {}", path.display()))?;
    Ok(Some(at))
}
