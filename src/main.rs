//! Skiff - A small static site generator that deploys to GitHub Pages.

mod cli;
mod compiler;
mod config;
mod deploy;
mod freshness;
mod logger;
mod utils;

use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, build::build_entry};
use config::SiteConfig;
use deploy::{GithubDeploy, InProcessBuild};
use std::process;
use utils::{exec::SystemRunner, git::GitRevisions};

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = match SiteConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            logger::log_error("error", &format!("{e:#}"));
            process::exit(1);
        }
    };

    let code = match &cli.command {
        Commands::Build { .. } => build_entry(&config),
        Commands::GithubDeploy => github_deploy(&config),
    };

    process::exit(code);
}

/// Run the deploy pipeline against the real build, processes and repository.
fn github_deploy(config: &SiteConfig) -> i32 {
    let revisions = GitRevisions::new(config.get_root());
    let pipeline = GithubDeploy::new(config, &InProcessBuild, &SystemRunner, &revisions);

    match pipeline.run() {
        Ok(deployed) => {
            debug!(
                "github_deploy";
                "deployed {} at {} UTC, {} removed",
                deployed.revision,
                deployed.recorded_at,
                utils::plural_count(deployed.removed.len(), "stale file")
            );
            0
        }
        Err(e) => e.exit_code(),
    }
}
