//! scenecheck - Execute the python examples embedded in animation skill docs
//!
//! Extracts every ```` ```python ```` block from a directory of markdown
//! skill files, decides heuristically which blocks are complete enough to
//! run, wraps bare statements into a scene class and renders each one with
//! the external renderer. Files are tested in parallel and results are
//! reported per block, per file and overall.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod markdown;
pub mod orchestrator;
pub mod runner;
pub mod synthesizer;
pub mod util;
