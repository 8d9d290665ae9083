//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"     # Markdown sources and static files
//! output = "output"       # Generated site (published by `github-deploy`)
//! cache = "cache"         # Tool state, e.g. the last deployment timestamp
//! ```
//!
//! `OUTPUT_FOLDER` and `CACHE_FOLDER` are accepted as aliases of `output`
//! and `cache`.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Build settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Source directory.
    pub content: PathBuf,

    /// Output directory.
    #[serde(alias = "OUTPUT_FOLDER")]
    pub output: PathBuf,

    /// Cache directory.
    #[serde(alias = "CACHE_FOLDER")]
    pub cache: PathBuf,

    /// Remove the output directory before building (CLI only).
    #[serde(skip)]
    pub clean: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            content: "content".into(),
            output: "output".into(),
            cache: "cache".into(),
            clean: false,
        }
    }
}

impl BuildSectionConfig {
    pub const CONTENT: FieldPath = FieldPath::new("build.content");
    pub const OUTPUT: FieldPath = FieldPath::new("build.output");
    pub const CACHE: FieldPath = FieldPath::new("build.cache");

    /// Validate normalized build paths.
    ///
    /// # Checks
    /// - `content` must be an existing directory.
    /// - `output` and `content` must not overlap.
    /// - `cache` must not overlap `output` or `content`.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.content.is_dir() {
            diag.error(
                Self::CONTENT,
                format!("content directory not found: {}", self.content.display()),
            );
        }
        if overlaps(&self.content, &self.output) {
            diag.error_with_hint(
                Self::OUTPUT,
                format!(
                    "output directory {} overlaps the content directory",
                    self.output.display()
                ),
                "stale output files are deleted on deploy; use a separate directory",
            );
        }
        if overlaps(&self.cache, &self.output) {
            diag.error_with_hint(
                Self::CACHE,
                format!(
                    "cache directory {} overlaps the output directory",
                    self.cache.display()
                ),
                "files under the output directory that no source produces are deleted on deploy",
            );
        }
        if overlaps(&self.cache, &self.content) {
            diag.error_with_hint(
                Self::CACHE,
                format!(
                    "cache directory {} overlaps the content directory",
                    self.cache.display()
                ),
                "cache files would be copied into the output as assets",
            );
        }
    }
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
