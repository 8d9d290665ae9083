//! Mapping from content sources to output files.
//!
//! The build plan is the single source of truth for "what the output
//! directory should contain": the build writes it, and deployment deletes
//! everything in the output directory that it does not name.

pub mod markdown;

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::SiteConfig;

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Every file under `dir`, following symlinks, hidden files included.
///
/// Unreadable directories and broken links are errors rather than gaps: a
/// file missing from a scan would otherwise look deleted.
pub fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).skip_hidden(false) {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Collect all source files from a directory recursively
pub fn collect_all_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = walk_files(dir)?;
    files.retain(|path| {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        !IGNORED_FILES.contains(&name)
    });
    Ok(files)
}

/// How a source file turns into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Rendered to `.html`.
    Markdown,
    /// Copied verbatim.
    Asset,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md" | "markdown") => Self::Markdown,
            _ => Self::Asset,
        }
    }

    /// Progress counter name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Asset => "assets",
        }
    }
}

/// One source file and the output it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: SourceKind,
}

/// Everything the current sources produce.
#[derive(Debug, Default)]
pub struct BuildPlan {
    pub tasks: Vec<BuildTask>,
    /// Markdown sources marked `draft = true`, left out of `tasks`.
    pub drafts: Vec<PathBuf>,
}

impl BuildPlan {
    pub fn count(&self, kind: SourceKind) -> usize {
        self.tasks.iter().filter(|t| t.kind == kind).count()
    }

    /// Absolute output paths, in plan order.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.tasks.iter().map(|t| t.output.as_path())
    }
}

/// Scan `build.content` and map every source to its output path.
///
/// Fails when two sources would write the same output (`a.md` next to
/// `a.html`), or a markdown source has malformed frontmatter.
pub fn plan(config: &SiteConfig) -> Result<BuildPlan> {
    let content = &config.build.content;
    let output = &config.build.output;

    let mut sources = collect_all_files(content)?;
    sources.sort();

    let mut plan = BuildPlan::default();
    let mut claimed: FxHashMap<PathBuf, PathBuf> = FxHashMap::default();

    for source in sources {
        let Ok(relative) = source.strip_prefix(content) else {
            continue;
        };
        let kind = SourceKind::from_path(&source);

        if kind == SourceKind::Markdown && is_draft(&source)? {
            plan.drafts.push(source);
            continue;
        }

        let target = match kind {
            SourceKind::Markdown => output.join(relative).with_extension("html"),
            SourceKind::Asset => output.join(relative),
        };

        if let Some(previous) = claimed.insert(target.clone(), source.clone()) {
            bail!(
                "`{}` and `{}` both produce `{}`",
                config.root_relative(&previous).display(),
                config.root_relative(&source).display(),
                config.root_relative(&target).display()
            );
        }

        plan.tasks.push(BuildTask {
            source,
            output: target,
            kind,
        });
    }

    Ok(plan)
}

fn is_draft(source: &Path) -> Result<bool> {
    let text = fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    let (meta, _) =
        markdown::split_frontmatter(&text).with_context(|| format!("in {}", source.display()))?;
    Ok(meta.draft)
}
