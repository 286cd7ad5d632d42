use anyhow::{bail, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Which flavour of the animation library the skill files document.
/// Selects the classifier rule set, the synthesized scene template and the
/// default renderer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Manim Community Edition (`manim`)
    #[default]
    Community,
    /// ManimGL (`manimlib`), with its interactive tooling
    Interactive,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Community => "community",
            Dialect::Interactive => "interactive",
        }
    }

    /// Python module the examples import from
    pub fn library(&self) -> &'static str {
        match self {
            Dialect::Community => "manim",
            Dialect::Interactive => "manimlib",
        }
    }

    pub fn star_import(&self) -> String {
        format!("from {} import *", self.library())
    }

    /// Base class for scenes synthesized around bare statements
    pub fn default_scene_base(&self) -> &'static str {
        match self {
            Dialect::Community => "Scene",
            Dialect::Interactive => "InteractiveScene",
        }
    }

    /// Rules directory used when neither the CLI nor the config names one
    pub fn default_rules_dir(&self) -> &'static str {
        match self {
            Dialect::Community => "skills/manimce-best-practices/rules",
            Dialect::Interactive => "skills/manimgl-best-practices/rules",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "community" | "ce" | "manim" | "manimce" => Ok(Dialect::Community),
            "interactive" | "gl" | "manimgl" | "manimlib" => Ok(Dialect::Interactive),
            other => bail!(
                "Unknown dialect '{}'. Expected 'community' or 'interactive'",
                other
            ),
        }
    }
}
