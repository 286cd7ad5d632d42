//! Parallel test run over a directory of skill files
//!
//! Every file is tested on a blocking worker thread; at most `jobs` files
//! are in flight at once. Workers hand back a [`FileSummary`] and only the
//! coordinating task prints and aggregates, so no state is shared between
//! workers.

use anyhow::Result;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use crate::error::ScenecheckError;
use crate::runner::{display_name, FileCounts, FileTester};

/// Outcome of testing one file, tagged with its submission position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// 1-based position in submission order
    pub index: usize,
    pub total: usize,
    pub file: String,
    pub counts: FileCounts,
    pub error: Option<String>,
}

impl FileSummary {
    pub fn completed(index: usize, total: usize, file: String, counts: FileCounts) -> Self {
        Self {
            index,
            total,
            file,
            counts,
            error: None,
        }
    }

    /// A file whose test run blew up counts as exactly one failure
    pub fn errored(index: usize, total: usize, file: String, message: String) -> Self {
        Self {
            index,
            total,
            file,
            counts: FileCounts {
                passed: 0,
                failed: 1,
                skipped: 0,
            },
            error: Some(message),
        }
    }

    pub fn print_progress(&self) {
        let status = if self.counts.failed == 0 { "✓" } else { "✗" };
        println!(
            "{} [{}/{}] {}: {} passed, {} failed, {} skipped",
            status,
            self.index,
            self.total,
            self.file,
            self.counts.passed,
            self.counts.failed,
            self.counts.skipped
        );
        if let Some(error) = &self.error {
            println!("    Error: {}", error);
        }
    }
}

/// Running totals over all files. Totals do not depend on the order
/// summaries arrive in; failing files are listed in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub files: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    failing: Vec<(usize, String)>,
}

impl AggregateReport {
    pub fn record(&mut self, summary: &FileSummary) {
        self.files += 1;
        self.passed += summary.counts.passed;
        self.failed += summary.counts.failed;
        self.skipped += summary.counts.skipped;
        if summary.counts.failed > 0 {
            let pos = self
                .failing
                .partition_point(|(index, _)| *index <= summary.index);
            let entry = (summary.index, summary.file.clone());
            self.failing.insert(pos, entry);
        }
    }

    /// Files with at least one failed block, in submission order
    pub fn failed_files(&self) -> Vec<&str> {
        self.failing.iter().map(|(_, file)| file.as_str()).collect()
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("OVERALL SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Total: {}/{} passed",
            self.passed,
            self.passed + self.failed
        );
        println!("Failed: {}", self.failed);
        println!("Skipped: {}", self.skipped);

        if self.failing.is_empty() {
            println!("\n✓ All tests passed!");
        } else {
            println!("\nFiles with failures:");
            for file in self.failed_files() {
                println!("  - {}", file);
            }
        }
    }
}

/// Sorted `*.md` files directly inside `dir`
pub fn discover_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.md", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(ScenecheckError::InvalidPattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    debug!(
        "Discovered {} markdown files in {}",
        files.len(),
        dir.display()
    );
    Ok(files)
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("worker cancelled: {}", err);
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", msg)
    } else {
        "worker panicked".to_string()
    }
}

pub struct Orchestrator {
    tester: Arc<dyn FileTester>,
    jobs: usize,
}

impl Orchestrator {
    pub fn new(tester: Arc<dyn FileTester>, jobs: usize) -> Self {
        Self { tester, jobs }
    }

    /// `min(jobs, files)`, never zero
    pub fn worker_count(&self, files: usize) -> usize {
        self.jobs.min(files).max(1)
    }

    /// Test every file, printing each summary as it arrives, and return the
    /// aggregate once all files are done
    pub async fn run(&self, files: Vec<PathBuf>) -> AggregateReport {
        let total = files.len();
        let workers = self.worker_count(total);
        println!("Found {} markdown files to test", total);
        println!("Using {} parallel workers\n", workers);

        let permits = Arc::new(Semaphore::new(workers));
        let mut join_set = JoinSet::new();
        for (idx, path) in files.into_iter().enumerate() {
            let index = idx + 1;
            let tester = Arc::clone(&self.tester);
            let permits = Arc::clone(&permits);
            join_set.spawn(async move {
                let file = display_name(&path);
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return FileSummary::errored(index, total, file, e.to_string()),
                };
                debug!("Worker picked up [{}/{}] {}", index, total, file);
                let outcome = tokio::task::spawn_blocking(move || tester.test_file(&path));
                match outcome.await {
                    Ok(Ok(counts)) => FileSummary::completed(index, total, file, counts),
                    Ok(Err(e)) => FileSummary::errored(index, total, file, format!("{:#}", e)),
                    Err(join_err) => {
                        FileSummary::errored(index, total, file, panic_message(join_err))
                    }
                }
            });
        }

        let mut report = AggregateReport::default();
        while let Some(joined) = join_set.join_next().await {
            let summary = match joined {
                Ok(summary) => summary,
                Err(e) => {
                    warn!("File task failed: {}", e);
                    FileSummary::errored(0, total, "<unknown>".to_string(), panic_message(e))
                }
            };
            summary.print_progress();
            report.record(&summary);
        }
        report
    }
}
