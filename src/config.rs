use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dialect::Dialect;

/// Default wall-clock limit for one scene render (seconds)
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Which rule set, scene template and renderer to use
    #[serde(default)]
    pub dialect: Dialect,

    /// Worker pool size (default: available parallelism)
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Directory holding the skill markdown files
    #[serde(default)]
    pub rules_dir: Option<PathBuf>,

    /// Overrides the dialect's default renderer command
    #[serde(default)]
    pub renderer: Option<RendererConfig>,
}

/// External renderer invocation.
/// `{file}` and `{scene}` in `args` are replaced with the program path and
/// the scene name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RendererConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Timeout for one render in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_RENDER_TIMEOUT_SECS
}

impl RendererConfig {
    pub fn for_dialect(dialect: Dialect) -> Self {
        let (program, args): (&str, &[&str]) = match dialect {
            // Low quality, no cache, last frame only as png
            Dialect::Community => (
                "uv",
                &[
                    "run",
                    "manim",
                    "-ql",
                    "--disable_caching",
                    "--format",
                    "png",
                    "-s",
                    "{file}",
                    "{scene}",
                ],
            ),
            // --write_file renders without opening the interactive window
            Dialect::Interactive => ("manimgl", &["{file}", "{scene}", "--write_file"]),
        };
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout: DEFAULT_RENDER_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a specific path, or search `./scenecheck.toml`
    /// then the user config directory
    pub fn load_with_path(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!(
                "Loading config from explicit path: {}",
                config_path.display()
            );
            return Self::load_from_path(config_path);
        }

        // Per-project config first
        if let Ok(config) = Self::load_from_path("scenecheck.toml") {
            debug!("Loaded config from ./scenecheck.toml");
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("scenecheck").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Reject values that would make every render fail
    pub fn validate(&self) -> Result<()> {
        if let Some(renderer) = &self.renderer {
            if renderer.timeout == 0 {
                bail!("renderer timeout must be at least 1 second");
            }
        }
        Ok(())
    }

    /// Renderer to use: the configured one, else the dialect default
    pub fn renderer(&self) -> RendererConfig {
        self.renderer
            .clone()
            .unwrap_or_else(|| RendererConfig::for_dialect(self.dialect))
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.rules_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.dialect.default_rules_dir()))
    }

    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
