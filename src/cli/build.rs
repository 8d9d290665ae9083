//! Site building orchestration.
//!
//! Build pipeline phases:
//! - **Init** - Clear output with `--clean`, ensure the output directory exists
//! - **Plan** - Map content files to outputs
//! - **Compile** - Render markdown and copy assets in parallel
//! - **Finalize** - Report what changed

use crate::{
    compiler::{self, BuildPlan, BuildTask, SourceKind, markdown},
    config::SiteConfig,
    freshness, log,
    logger::ProgressLine,
    utils::plural_count,
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Outcome of a successful build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Markdown pages whose output changed.
    pub rendered: usize,
    /// Assets whose output changed.
    pub copied: usize,
    /// Outputs that already held the right bytes.
    pub unchanged: usize,
    /// Drafts left out of the output.
    pub drafts: usize,
}

/// Build entrypoint used by `github-deploy`: 0 on success, 1 on failure.
///
/// The error is logged here; callers only see the status.
pub fn build_entry(config: &SiteConfig) -> i32 {
    match build_site(config, false) {
        Ok(_) => 0,
        Err(e) => {
            log!("error"; "build failed: {:#}", e);
            1
        }
    }
}

/// Build the entire site.
///
/// Pipeline: init -> plan -> compile -> finalize
pub fn build_site(config: &SiteConfig, quiet: bool) -> Result<BuildReport> {
    init_build(config)?;

    let plan = compiler::plan(config)?;
    let progress = create_progress(&plan, quiet);
    let report = compile_all(config, &plan, progress.as_ref())?;

    if let Some(p) = progress {
        p.finish();
    }

    if !quiet {
        log_build_result(&report);
    }

    Ok(report)
}

/// Initialize build environment
fn init_build(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;

    if config.build.clean && output.exists() {
        fs::remove_dir_all(output).with_context(|| {
            format!("Failed to clear output directory: {}", output.display())
        })?;
    }

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// Create progress display if not quiet
fn create_progress(plan: &BuildPlan, quiet: bool) -> Option<ProgressLine> {
    if quiet {
        return None;
    }
    Some(ProgressLine::new(&[
        (SourceKind::Markdown.name(), plan.count(SourceKind::Markdown)),
        (SourceKind::Asset.name(), plan.count(SourceKind::Asset)),
    ]))
}

/// Process every task in parallel, stopping at the first failure.
fn compile_all(
    config: &SiteConfig,
    plan: &BuildPlan,
    progress: Option<&ProgressLine>,
) -> Result<BuildReport> {
    let has_error = AtomicBool::new(false);
    let rendered = AtomicUsize::new(0);
    let copied = AtomicUsize::new(0);
    let unchanged = AtomicUsize::new(0);

    plan.tasks.par_iter().try_for_each(|task| {
        if has_error.load(Ordering::Relaxed) {
            return Err(anyhow!("Aborted"));
        }

        match process_task(task, config) {
            Ok(false) => {
                unchanged.fetch_add(1, Ordering::Relaxed);
            }
            Ok(true) => {
                let counter = match task.kind {
                    SourceKind::Markdown => &rendered,
                    SourceKind::Asset => &copied,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                if !has_error.swap(true, Ordering::Relaxed) {
                    log!("error"; "{}: {:#}", config.root_relative(&task.source).display(), e);
                }
                return Err(anyhow!("Build failed"));
            }
        }

        if let Some(p) = progress {
            p.inc(task.kind.name());
        }
        Ok(())
    })?;

    Ok(BuildReport {
        rendered: rendered.into_inner(),
        copied: copied.into_inner(),
        unchanged: unchanged.into_inner(),
        drafts: plan.drafts.len(),
    })
}

/// Produce one output. Returns whether the file on disk changed.
fn process_task(task: &BuildTask, config: &SiteConfig) -> Result<bool> {
    let bytes = match task.kind {
        SourceKind::Markdown => render_markdown(&task.source, &config.site.title)?.into_bytes(),
        SourceKind::Asset => fs::read(&task.source)
            .with_context(|| format!("Failed to read {}", task.source.display()))?,
    };

    freshness::write_if_changed(&task.output, &bytes)
        .with_context(|| format!("Failed to write {}", task.output.display()))
}

fn render_markdown(source: &Path, site_title: &str) -> Result<String> {
    let text = fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let (meta, body) = markdown::split_frontmatter(&text)?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    Ok(markdown::render_page(&meta, body, site_title, &stem))
}

fn log_build_result(report: &BuildReport) {
    if report.drafts > 0 {
        log!("build"; "{} skipped", plural_count(report.drafts, "draft"));
    }

    let changed = report.rendered + report.copied;
    if changed + report.unchanged == 0 {
        log!("warn"; "output is empty, check if content has .md files");
    } else if changed == 0 {
        log!("build"; "done, output unchanged");
    } else {
        log!(
            "build";
            "done, {} and {} written",
            plural_count(report.rendered, "page"),
            plural_count(report.copied, "asset")
        );
    }
}
