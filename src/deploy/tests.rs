use super::*;
use crate::{
    config::test_site_config,
    logger::Level,
    utils::exec::Cmd,
};
use anyhow::{Result, anyhow};
use chrono::Utc;
use std::{
    cell::{Cell, RefCell},
    fs, io,
    path::Path,
};

const REVISION: &str = "3f2a9c1e0b7d4e5f6a8b9c0d1e2f3a4b5c6d7e8f";

// ============================================================================
// Fakes
// ============================================================================

struct FakeBuild {
    status: i32,
    calls: Cell<usize>,
}

impl FakeBuild {
    fn new(status: i32) -> Self {
        Self {
            status,
            calls: Cell::new(0),
        }
    }
}

impl SiteBuild for FakeBuild {
    fn build(&self, _config: &SiteConfig) -> i32 {
        self.calls.set(self.calls.get() + 1);
        self.status
    }
}

/// Records every command; `status` reports which watched paths existed at
/// the moment the helper ran.
struct FakeRunner {
    installed: bool,
    exit_code: i32,
    watch: Vec<PathBuf>,
    silent_runs: RefCell<Vec<Cmd>>,
    runs: RefCell<Vec<(Cmd, Vec<bool>)>>,
}

impl FakeRunner {
    fn new(exit_code: i32) -> Self {
        Self {
            installed: true,
            exit_code,
            watch: Vec::new(),
            silent_runs: RefCell::default(),
            runs: RefCell::default(),
        }
    }

    fn missing() -> Self {
        Self {
            installed: false,
            ..Self::new(0)
        }
    }

    fn watching(mut self, paths: &[PathBuf]) -> Self {
        self.watch = paths.to_vec();
        self
    }

    fn run_count(&self) -> usize {
        self.runs.borrow().len()
    }
}

impl CommandRunner for FakeRunner {
    fn run_silent(&self, cmd: Cmd) -> io::Result<i32> {
        self.silent_runs.borrow_mut().push(cmd);
        if self.installed {
            Ok(2)
        } else {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn status(&self, cmd: Cmd) -> io::Result<i32> {
        let seen = self.watch.iter().map(|p| p.exists()).collect();
        self.runs.borrow_mut().push((cmd, seen));
        Ok(self.exit_code)
    }
}

struct FakeRevisions(Option<&'static str>);

impl RevisionSource for FakeRevisions {
    fn resolve(&self, spec: &str) -> Result<String> {
        self.0
            .map(|rev| format!("{rev}\n"))
            .ok_or_else(|| anyhow!("unknown revision `{spec}`"))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Site with one page, its rendered output, and one stale output file.
fn site(root: &Path) -> SiteConfig {
    write(&root.join("content/index.md"), "# Home");
    write(&root.join("output/index.html"), "<h1>Home</h1>");
    write(&root.join("output/posts/removed.html"), "gone");
    test_site_config(root, "")
}

fn stamp_path(config: &SiteConfig) -> PathBuf {
    config.build.cache.join(LAST_DEPLOY_FILE)
}

fn deploy<'a>(
    config: &'a SiteConfig,
    builder: &'a FakeBuild,
    runner: &'a FakeRunner,
    revisions: &'a FakeRevisions,
    logger: &Logger,
) -> Result<Deployed, DeployError> {
    GithubDeploy::new(config, builder, runner, revisions)
        .with_logger(logger.clone())
        .run()
}

fn infos(logger: &Logger) -> Vec<String> {
    logger
        .captured()
        .into_iter()
        .filter(|(level, _)| *level == Level::Info)
        .map(|(_, line)| line)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_successful_deploy() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    let (builder, runner) = (FakeBuild::new(0), FakeRunner::new(0));
    let logger = Logger::capture("github_deploy");

    let before = Utc::now().naive_utc();
    let deployed = deploy(&config, &builder, &runner, &FakeRevisions(Some(REVISION)), &logger)
        .unwrap();

    assert_eq!(builder.calls.get(), 1);
    assert_eq!(runner.run_count(), 1);
    assert_eq!(deployed.revision, REVISION);
    assert_eq!(deployed.removed, vec![config.build.output.join("posts/removed.html")]);

    let recorded = last_deploy(&config.build.cache).unwrap().unwrap();
    assert_eq!(recorded, deployed.recorded_at);
    let drift = (recorded - before).num_seconds();
    assert!((0..5).contains(&drift), "timestamp off by {drift}s");

    let lines = infos(&logger);
    assert!(lines.iter().any(|l| l.starts_with("==> ghp-import -n -m ")));
    assert_eq!(lines.last().map(String::as_str), Some("Successful deployment"));
}

#[test]
fn test_availability_check_uses_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    let runner = FakeRunner::new(0);

    deploy(
        &config,
        &FakeBuild::new(0),
        &runner,
        &FakeRevisions(Some(REVISION)),
        &Logger::capture("github_deploy"),
    )
    .unwrap();

    let silent_runs = runner.silent_runs.borrow();
    assert_eq!(silent_runs.len(), 1);
    assert_eq!(silent_runs[0].to_string(), "ghp-import -h");
}

#[test]
fn test_build_failure_stops_before_helper() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    let runner = FakeRunner::new(0);
    let logger = Logger::capture("github_deploy");

    let err = deploy(&config, &FakeBuild::new(3), &runner, &FakeRevisions(Some(REVISION)), &logger)
        .unwrap_err();

    assert!(matches!(err, DeployError::Build { status: 3 }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(err.stage(), Stage::Building);
    assert_eq!(runner.run_count(), 0);
    assert!(config.build.output.join("posts/removed.html").exists());
    assert!(!stamp_path(&config).exists());
    assert!(
        logger
            .captured()
            .contains(&(Level::Error, "Build failed, not deploying to GitHub".to_string()))
    );
}

#[test]
fn test_helper_failure_keeps_previous_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    write(&stamp_path(&config), "2020-01-01T00:00:00.000000");
    let logger = Logger::capture("github_deploy");

    let err = deploy(
        &config,
        &FakeBuild::new(0),
        &FakeRunner::new(128),
        &FakeRevisions(Some(REVISION)),
        &logger,
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), 128);
    assert_eq!(err.stage(), Stage::Committing);
    assert_eq!(
        fs::read_to_string(stamp_path(&config)).unwrap(),
        "2020-01-01T00:00:00.000000"
    );

    let errors: Vec<_> = logger
        .captured()
        .into_iter()
        .filter(|(level, _)| *level == Level::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.starts_with("Failed GitHub deployment: command `ghp-import -n"));
    assert!(errors[0].1.ends_with("returned 128"));
}

#[test]
fn test_stale_files_removed_before_publish() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    let stale = config.build.output.join("posts/removed.html");
    let expected = config.build.output.join("index.html");
    let runner = FakeRunner::new(0).watching(&[stale.clone(), expected.clone()]);

    deploy(
        &config,
        &FakeBuild::new(0),
        &runner,
        &FakeRevisions(Some(REVISION)),
        &Logger::capture("github_deploy"),
    )
    .unwrap();

    let runs = runner.runs.borrow();
    assert_eq!(runs[0].1, vec![false, true]);
    assert!(expected.exists());
}

#[test]
fn test_helper_receives_message_and_targets() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_site_config(
        dir.path(),
        "[deploy.github]\nremote_name = \"upstream\"\ndeploy_branch = \"gh-pages\"",
    );
    fs::create_dir_all(&config.build.content).unwrap();
    let runner = FakeRunner::new(0);

    deploy(
        &config,
        &FakeBuild::new(0),
        &runner,
        &FakeRevisions(Some(REVISION)),
        &Logger::capture("github_deploy"),
    )
    .unwrap();

    let runs = runner.runs.borrow();
    let args: Vec<_> = runs[0]
        .0
        .get_args()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    assert_eq!(&args[..2], ["-n", "-m"]);
    assert_eq!(&args[3..8], ["-p", "-r", "upstream", "-b", "gh-pages"]);
    assert_eq!(args[8], config.build.output.to_string_lossy());

    let message = &args[2];
    let rev_at = message.find(REVISION).unwrap();
    let version_at = message.find(env!("CARGO_PKG_VERSION")).unwrap();
    assert!(rev_at < version_at);
    assert!(!message.contains(&format!("{REVISION}\n\n")));
}

#[test]
fn test_two_deploys_overwrite_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    let revisions = FakeRevisions(Some(REVISION));
    let logger = Logger::capture("github_deploy");

    let first = deploy(&config, &FakeBuild::new(0), &FakeRunner::new(0), &revisions, &logger)
        .unwrap();
    let second = deploy(&config, &FakeBuild::new(0), &FakeRunner::new(0), &revisions, &logger)
        .unwrap();

    assert!(second.removed.is_empty());
    assert!(second.recorded_at >= first.recorded_at);
    let text = fs::read_to_string(stamp_path(&config)).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert_eq!(last_deploy(&config.build.cache).unwrap(), Some(second.recorded_at));
}

#[test]
fn test_missing_helper() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    let builder = FakeBuild::new(0);
    let runner = FakeRunner::missing();

    let err = deploy(
        &config,
        &builder,
        &runner,
        &FakeRevisions(Some(REVISION)),
        &Logger::capture("github_deploy"),
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), 5);
    assert_eq!(err.stage(), Stage::Checking);
    let message = err.to_string();
    assert!(message.contains("ghp-import"));
    assert!(message.contains("deploy the site to GitHub Pages"));
    assert!(message.contains("pip install ghp-import"));
    assert_eq!(builder.calls.get(), 0);
    assert_eq!(runner.run_count(), 0);
}

#[test]
fn test_unresolvable_source_branch() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    let runner = FakeRunner::new(0);

    let err = deploy(
        &config,
        &FakeBuild::new(0),
        &runner,
        &FakeRevisions(None),
        &Logger::capture("github_deploy"),
    )
    .unwrap_err();

    assert!(matches!(&err, DeployError::Revision { branch, .. } if branch == "src"));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(runner.run_count(), 0);
    // cleanup already happened and is not undone
    assert!(!config.build.output.join("posts/removed.html").exists());
}

#[test]
fn test_in_process_build_then_deploy() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("content/index.md"), "# Home");
    write(&root.join("content/.nojekyll"), "");
    write(&root.join("output/old.html"), "old");
    let config = test_site_config(root, "[site]\ntitle = \"Notes\"");

    let deployed = GithubDeploy::new(
        &config,
        &InProcessBuild,
        &FakeRunner::new(0),
        &FakeRevisions(Some(REVISION)),
    )
    .with_logger(Logger::capture("github_deploy"))
    .run()
    .unwrap();

    assert_eq!(deployed.removed, vec![config.build.output.join("old.html")]);
    assert!(config.build.output.join("index.html").exists());
    assert!(config.build.output.join(".nojekyll").exists());
}

#[cfg(unix)]
#[test]
fn test_symlinked_asset_survives_deploy() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("shared/logo.png"), "png");
    write(&root.join("content/index.md"), "# Home");
    std::os::unix::fs::symlink(root.join("shared/logo.png"), root.join("content/logo.png"))
        .unwrap();
    write(&root.join("output/logo.png"), "png");
    let config = test_site_config(root, "");

    let deployed = GithubDeploy::new(
        &config,
        &InProcessBuild,
        &FakeRunner::new(0),
        &FakeRevisions(Some(REVISION)),
    )
    .with_logger(Logger::capture("github_deploy"))
    .run()
    .unwrap();

    assert!(deployed.removed.is_empty());
    assert_eq!(fs::read_to_string(config.build.output.join("logo.png")).unwrap(), "png");
}

#[cfg(unix)]
#[test]
fn test_unreadable_content_stops_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    std::os::unix::fs::symlink(dir.path().join("gone"), config.build.content.join("posts"))
        .unwrap();
    let runner = FakeRunner::new(0);

    let err = deploy(
        &config,
        &FakeBuild::new(0),
        &runner,
        &FakeRevisions(Some(REVISION)),
        &Logger::capture("github_deploy"),
    )
    .unwrap_err();

    assert!(matches!(err, DeployError::Scan(_)));
    assert_eq!(err.stage(), Stage::Cleaning);
    assert_eq!(err.exit_code(), 1);
    assert_eq!(runner.run_count(), 0);
    assert!(config.build.output.join("posts/removed.html").exists());
    assert!(config.build.output.join("index.html").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_output_stops_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let config = site(dir.path());
    std::os::unix::fs::symlink(dir.path().join("gone"), config.build.output.join("dangling"))
        .unwrap();

    let err = deploy(
        &config,
        &FakeBuild::new(0),
        &FakeRunner::new(0),
        &FakeRevisions(Some(REVISION)),
        &Logger::capture("github_deploy"),
    )
    .unwrap_err();

    assert!(matches!(err, DeployError::Scan(_)));
    assert!(config.build.output.join("posts/removed.html").exists());
}
