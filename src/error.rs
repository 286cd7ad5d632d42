use std::path::PathBuf;
use thiserror::Error;

/// Conditions that stop a run before any file is tested
#[derive(Debug, Error)]
pub enum ScenecheckError {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("No markdown files found in {}", .0.display())]
    NoMarkdownFiles(PathBuf),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[source] glob::PatternError),
}
