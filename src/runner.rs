//! Tests every python block of one skill markdown file

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::classifier::{Classifier, Verdict};
use crate::config::Config;
use crate::executor::{RendererExecutor, SceneExecutor};
use crate::markdown::{extract_python_blocks, CodeBlock};
use crate::synthesizer::{test_name_for, Synthesizer};
use crate::util::truncate_chars;

const CODE_EXCERPT_CHARS: usize = 200;
const ERROR_EXCERPT_CHARS: usize = 500;

/// Block outcome counts for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl FileCounts {
    /// Blocks that were judged runnable and executed
    pub fn tested(&self) -> usize {
        self.passed + self.failed
    }

    pub fn total(&self) -> usize {
        self.tested() + self.skipped
    }
}

/// Anything that can test a whole markdown file.
/// The orchestrator only depends on this seam.
pub trait FileTester: Send + Sync {
    fn test_file(&self, path: &Path) -> Result<FileCounts>;
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract → classify → synthesize → execute, one block at a time
pub struct FileRunner {
    classifier: Classifier,
    synthesizer: Synthesizer,
    executor: Box<dyn SceneExecutor>,
}

impl FileRunner {
    pub fn new(
        classifier: Classifier,
        synthesizer: Synthesizer,
        executor: Box<dyn SceneExecutor>,
    ) -> Self {
        Self {
            classifier,
            synthesizer,
            executor,
        }
    }

    /// Runner for the configured dialect, rendering with the configured renderer
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Classifier::for_dialect(config.dialect)?,
            Synthesizer::new(config.dialect),
            Box::new(RendererExecutor::new(config.renderer())),
        ))
    }

    /// Test the blocks of already loaded markdown. Blocks run strictly in
    /// document order and progress is printed as each one finishes.
    pub fn test_markdown(&self, path: &Path, markdown: &str) -> FileCounts {
        println!("\n{}", "=".repeat(60));
        let name = display_name(path);
        println!("Testing: {}", name);
        println!("{}", "=".repeat(60));

        let mut counts = FileCounts::default();
        for block in extract_python_blocks(markdown) {
            if let Verdict::Skip(rule) = self.classifier.classify(&block.code) {
                debug!("{} block {} skipped ({})", name, block.index, rule);
                counts.skipped += 1;
                continue;
            }

            if self.run_block(path, &block) {
                counts.passed += 1;
            } else {
                counts.failed += 1;
            }
        }

        println!(
            "\n  Summary: {}/{} passed, {} failed, {} skipped",
            counts.passed,
            counts.tested(),
            counts.failed,
            counts.skipped
        );
        counts
    }

    fn run_block(&self, path: &Path, block: &CodeBlock) -> bool {
        let test_name = test_name_for(path, block.index);
        let program = self.synthesizer.synthesize(&block.code, &test_name);

        print!(
            "\n  Block {}: Testing {}... ",
            block.index, program.scene_name
        );
        if let Err(e) = std::io::stdout().flush() {
            debug!("Failed to flush stdout: {}", e);
        }

        let result = self.executor.execute(&program);
        if result.is_pass() {
            println!("✓ PASSED");
            true
        } else {
            println!("✗ FAILED");
            println!(
                "    Code:\n{}...",
                truncate_chars(&block.code, CODE_EXCERPT_CHARS)
            );
            println!(
                "    Error: {}",
                truncate_chars(&result.diagnostic(), ERROR_EXCERPT_CHARS)
            );
            false
        }
    }

    /// Verdict for every block of a file, without running anything
    pub fn classify_file(&self, path: &Path) -> Result<Vec<(CodeBlock, Verdict)>> {
        let markdown = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(extract_python_blocks(&markdown)
            .into_iter()
            .map(|block| {
                let verdict = self.classifier.classify(&block.code);
                (block, verdict)
            })
            .collect())
    }
}

impl FileTester for FileRunner {
    fn test_file(&self, path: &Path) -> Result<FileCounts> {
        let markdown = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.test_markdown(path, &markdown))
    }
}
