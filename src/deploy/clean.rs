//! Output diff filter: remove output files no source maps to.
//!
//! Deletion is fail-fast with no rollback. When removing one file fails,
//! files removed before it stay removed and the pipeline stops.

use super::DeployError;
use crate::{compiler, config::SiteConfig, logger::Logger, utils::plural_count};
use rustc_hash::FxHashSet;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Difference between the files in the output directory and the files the
/// current sources produce.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSetDiff {
    /// In the output directory but not produced by any source (stale).
    pub only_on_output: Vec<PathBuf>,
    /// Produced by a source but missing from the output directory.
    pub only_on_input: Vec<PathBuf>,
}

impl FileSetDiff {
    /// Compare actual output files against expected ones. Both sides sorted.
    pub fn between<A, E>(actual: A, expected: E) -> Self
    where
        A: IntoIterator<Item = PathBuf>,
        E: IntoIterator<Item = PathBuf>,
    {
        let actual: FxHashSet<PathBuf> = actual.into_iter().collect();
        let expected: FxHashSet<PathBuf> = expected.into_iter().collect();

        let mut only_on_output: Vec<_> = actual.difference(&expected).cloned().collect();
        let mut only_on_input: Vec<_> = expected.difference(&actual).cloned().collect();
        only_on_output.sort();
        only_on_input.sort();

        Self {
            only_on_output,
            only_on_input,
        }
    }
}

/// Every file under `output`, walked the same way as the content directory.
///
/// A missing output directory holds no files.
pub fn scan_output(output: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !output.is_dir() {
        return Ok(Vec::new());
    }
    compiler::walk_files(output)
}

/// Diff the output directory against the current build plan.
pub fn stale_files(config: &SiteConfig) -> Result<FileSetDiff, DeployError> {
    let plan = compiler::plan(config).map_err(|e| DeployError::Scan(e.into()))?;
    let actual = scan_output(&config.build.output).map_err(|e| DeployError::Scan(e.into()))?;
    let expected = plan.tasks.into_iter().map(|task| task.output);
    Ok(FileSetDiff::between(actual, expected))
}

/// Delete `diff.only_on_output`, returning the removed paths.
///
/// `only_on_input` is reported at debug level only.
pub fn remove_stale(
    config: &SiteConfig,
    diff: FileSetDiff,
    logger: &Logger,
) -> Result<Vec<PathBuf>, DeployError> {
    for missing in &diff.only_on_input {
        logger.debug(format!(
            "expected but not in output: {}",
            config.root_relative(missing).display()
        ));
    }

    for path in &diff.only_on_output {
        logger.debug(format!("removing {}", config.root_relative(path).display()));
        fs::remove_file(path).map_err(|source| DeployError::Cleanup {
            path: path.clone(),
            source,
        })?;
    }

    if !diff.only_on_output.is_empty() {
        logger.info(format!(
            "removed {}",
            plural_count(diff.only_on_output.len(), "stale file")
        ));
    }

    Ok(diff.only_on_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::test_site_config, logger::Level};

    fn write(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_between() {
        let diff = FileSetDiff::between(
            [PathBuf::from("o/b"), PathBuf::from("o/a"), PathBuf::from("o/keep")],
            [PathBuf::from("o/keep"), PathBuf::from("o/new")],
        );
        assert_eq!(diff.only_on_output, vec![PathBuf::from("o/a"), PathBuf::from("o/b")]);
        assert_eq!(diff.only_on_input, vec![PathBuf::from("o/new")]);
    }

    #[test]
    fn test_scan_output_includes_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join(".nojekyll"));
        write(&dir.path().join("a/b.html"));

        let mut files = scan_output(dir.path()).unwrap();
        files.sort();
        assert_eq!(files, vec![dir.path().join(".nojekyll"), dir.path().join("a/b.html")]);
        assert!(scan_output(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_output_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared");
        write(&shared.join("logo.png"));
        let output = dir.path().join("output");
        fs::create_dir(&output).unwrap();
        std::os::unix::fs::symlink(&shared, output.join("img")).unwrap();

        assert_eq!(scan_output(&output).unwrap(), vec![output.join("img/logo.png")]);
    }

    #[test]
    fn test_remove_stale_keeps_expected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("content/index.md"));
        write(&root.join("output/index.html"));
        write(&root.join("output/old/post.html"));
        write(&root.join("output/img.png"));
        let config = test_site_config(root, "");

        let diff = stale_files(&config).unwrap();
        assert!(diff.only_on_input.is_empty());

        let logger = Logger::capture("github_deploy");
        let removed = remove_stale(&config, diff, &logger).unwrap();

        assert_eq!(
            removed,
            vec![root.join("output/img.png"), root.join("output/old/post.html")]
        );
        assert!(root.join("output/index.html").exists());
        assert!(!root.join("output/img.png").exists());
        assert!(
            logger
                .captured()
                .contains(&(Level::Info, "removed 2 stale files".to_string()))
        );
    }

    #[test]
    fn test_missing_outputs_only_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("content/about.md"));
        let config = test_site_config(root, "");

        let diff = stale_files(&config).unwrap();
        assert_eq!(diff.only_on_input, vec![root.join("output/about.html")]);

        let logger = Logger::capture("github_deploy");
        assert!(remove_stale(&config, diff, &logger).unwrap().is_empty());
        let lines = logger.captured();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::Debug);
    }

    #[test]
    fn test_remove_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let diff = FileSetDiff {
            only_on_output: vec![dir.path().join("vanished.html")],
            only_on_input: Vec::new(),
        };
        let config = test_site_config(dir.path(), "");

        let err = remove_stale(&config, diff, &Logger::capture("github_deploy")).unwrap_err();
        assert!(matches!(err, DeployError::Cleanup { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
