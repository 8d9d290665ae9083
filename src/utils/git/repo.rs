use anyhow::{Context, Result};
use gix::ThreadSafeRepository;
use std::path::{Path, PathBuf};

/// Resolves revision specs (branch names, tags, `HEAD~1`, ...) to commit ids.
pub trait RevisionSource {
    fn resolve(&self, spec: &str) -> Result<String>;
}

/// Resolves revisions in the git repository containing `root`.
#[derive(Debug, Clone)]
pub struct GitRevisions {
    root: PathBuf,
}

impl GitRevisions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RevisionSource for GitRevisions {
    fn resolve(&self, spec: &str) -> Result<String> {
        let repo = open_repo(&self.root)?;
        resolve_revision(&repo, spec)
    }
}

/// Open the repository containing `root`, searching parent directories.
pub fn open_repo(root: &Path) -> Result<ThreadSafeRepository> {
    let repo = gix::discover(root)
        .with_context(|| format!("No git repository found at {}", root.display()))?;
    Ok(repo.into_sync())
}

/// Resolve `spec` to the full hex id of the object it names.
pub fn resolve_revision(repo: &ThreadSafeRepository, spec: &str) -> Result<String> {
    let repo_local = repo.to_thread_local();
    let id = repo_local
        .rev_parse_single(spec)
        .with_context(|| format!("Failed to resolve revision `{spec}`"))?;
    Ok(id.detach().to_string())
}
