//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Skiff static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Output directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Config file path (default: skiff.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "skiff.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site
    #[command(visible_alias = "b")]
    Build {
        /// Clean output directory completely before building
        #[arg(short, long)]
        clean: bool,
    },

    /// Deploy the site to GitHub Pages
    ///
    /// Builds the site, removes output files no source maps to, and publishes
    /// the output directory to the deploy branch with ghp-import.
    #[command(visible_alias = "gd")]
    GithubDeploy,
}
