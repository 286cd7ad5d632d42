use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use scenecheck::cli::check::{self, CheckOptions};

#[derive(Parser)]
#[command(name = "scenecheck", version)]
#[command(about = "Render the python examples in animation skill docs", long_about = None)]
struct Cli {
    /// Test a single markdown file (path, or name inside the rules directory)
    file: Option<String>,

    /// Number of files tested in parallel (default: available cores)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Rule set and renderer: community (manim) or interactive (manimgl)
    #[arg(long)]
    dialect: Option<String>,

    /// Directory of skill markdown files
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Per-scene render timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to config file (defaults to ./scenecheck.toml or ~/.config/scenecheck/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each block's verdict without rendering anything
    #[arg(long)]
    classify_only: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl From<Cli> for CheckOptions {
    fn from(cli: Cli) -> Self {
        Self {
            file: cli.file,
            jobs: cli.jobs,
            dialect: cli.dialect,
            rules_dir: cli.rules_dir,
            timeout: cli.timeout,
            config: cli.config,
            classify_only: cli.classify_only,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Progress goes to stdout, logs to stderr
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = check::run(cli.into()).await?;
    Ok(ExitCode::from(code))
}
