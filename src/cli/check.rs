//! The `scenecheck` command: single-file and whole-directory runs
//!
//! Loads the config, applies command-line overrides and picks the mode.
//! A named file is tested directly on the calling task; a rules directory
//! goes through the parallel orchestrator. Exit code 1 means a block
//! failed, a file errored, or there was nothing to test.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::ScenecheckError;
use crate::orchestrator::{discover_markdown_files, Orchestrator};
use crate::runner::{display_name, FileRunner, FileTester};

/// Command-line overrides, applied on top of the loaded config
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Single file to test instead of the whole rules directory
    pub file: Option<String>,
    pub jobs: Option<usize>,
    pub dialect: Option<String>,
    pub rules_dir: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub config: Option<PathBuf>,
    pub classify_only: bool,
}

/// Run the checker and return the process exit code
pub async fn run(opts: CheckOptions) -> Result<u8> {
    let config = resolve_config(&opts)?;
    let rules_dir = config.rules_dir();
    info!("Dialect: {}", config.dialect);
    info!("Rules directory: {}", rules_dir.display());

    let runner = FileRunner::from_config(&config)?;

    if let Some(file) = &opts.file {
        // Single file: no worker pool
        let path = match resolve_skill_file(file, &rules_dir) {
            Ok(path) => path,
            Err(e) => {
                println!("Error: {}", e);
                return Ok(1);
            }
        };
        debug!("Resolved {} to {}", file, path.display());

        if opts.classify_only {
            print_verdicts(&runner, &[path])?;
            return Ok(0);
        }

        let counts = runner.test_file(&path)?;
        if counts.failed > 0 {
            return Ok(1);
        }
        println!("\n✓ All tests passed!");
        return Ok(0);
    }

    let files = discover_markdown_files(&rules_dir)?;
    if files.is_empty() {
        println!("Error: {}", ScenecheckError::NoMarkdownFiles(rules_dir));
        return Ok(1);
    }

    if opts.classify_only {
        print_verdicts(&runner, &files)?;
        return Ok(0);
    }

    let orchestrator = Orchestrator::new(Arc::new(runner), config.jobs());
    let report = orchestrator.run(files).await;
    report.print_summary();
    Ok(report.exit_code())
}

/// Loaded config with command-line overrides applied
pub fn resolve_config(opts: &CheckOptions) -> Result<Config> {
    let mut config = Config::load_with_path(opts.config.as_deref())?;

    if let Some(dialect) = &opts.dialect {
        config.dialect = Dialect::from_str(dialect)?;
    }
    if let Some(dir) = &opts.rules_dir {
        config.rules_dir = Some(dir.clone());
    }
    if let Some(jobs) = opts.jobs {
        config.jobs = Some(jobs);
    }
    if let Some(timeout) = opts.timeout {
        if timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }
        let mut renderer = config.renderer();
        renderer.timeout = timeout;
        config.renderer = Some(renderer);
    }
    config.validate()?;
    Ok(config)
}

/// The named file as given, else relative to the rules directory
pub fn resolve_skill_file(file: &str, rules_dir: &Path) -> Result<PathBuf, ScenecheckError> {
    let literal = PathBuf::from(file);
    if literal.exists() {
        return Ok(literal);
    }
    let in_rules = rules_dir.join(file);
    if in_rules.exists() {
        return Ok(in_rules);
    }
    Err(ScenecheckError::FileNotFound(file.to_string()))
}

fn print_verdicts(runner: &FileRunner, files: &[PathBuf]) -> Result<()> {
    let mut runnable = 0;
    let mut skipped = 0;
    for path in files {
        println!("{}", display_name(path));
        for (block, verdict) in runner.classify_file(path)? {
            if verdict.is_runnable() {
                runnable += 1;
            } else {
                skipped += 1;
            }
            println!("  Block {}: {}", block.index, verdict);
        }
    }
    println!("\n{} runnable, {} skipped", runnable, skipped);
    Ok(())
}
