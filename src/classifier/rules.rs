//! Token tables for the executability classifier, one set per dialect.
//!
//! The two sets disagree in places (which markers mean "not python", which
//! placeholder names the docs use). They are kept as separate data rather
//! than merged.

use crate::dialect::Dialect;

/// Immutable policy data consumed by [`super::Classifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub dialect: Dialect,
    /// Substrings that mark a block as shell/CLI/config text
    pub non_source_markers: &'static [&'static str],
    /// Substrings that count as creating an object, besides `=`
    pub creation_tokens: &'static [&'static str],
    /// Conventional stand-in names from API docs
    pub placeholders: &'static [&'static str],
    /// Lowercase object name paired with the constructor call that creates it
    pub shapes: &'static [(&'static str, &'static str)],
    /// Extra rules for the interactive tooling dialect
    pub interactive: Option<InteractiveRules>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveRules {
    /// Call that drops into an interactive shell; always skipped
    pub embed_call: &'static str,
    /// Lowercase markers of checkpoint/undo features; skipped outside a scene class
    pub session_markers: &'static [&'static str],
    /// Prefix of config access snippets
    pub config_prefix: &'static str,
}

const COMMUNITY_MARKERS: &[&str] = &["manim -", "pip install", "manim checkhealth", "```bash"];

const COMMUNITY_CREATION: &[&str] = &["Circle(", "Square(", "Text(", "class "];

const COMMUNITY_PLACEHOLDERS: &[&str] = &["mobject1", "mobject2", "mobject3", "mob1", "mob2"];

const COMMUNITY_SHAPES: &[(&str, &str)] = &[
    ("circle", "Circle("),
    ("square", "Square("),
    ("text", "Text("),
];

const INTERACTIVE_MARKERS: &[&str] = &[
    "manimgl ",
    "pip install",
    "```bash",
    "[CLI]",
    "[output]",
    "[renderer]",
];

const INTERACTIVE_PLACEHOLDERS: &[&str] = &[
    "mobject",
    "mobject1",
    "mobject2",
    "mobject3",
    "mob",
    "mob1",
    "mob2",
    "target",
    "leader",
    "follower",
    "updater_function",
    "mobjects",
    "objects",
    "circles",
    "squares",
    "dots",
    "group1",
    "group2",
    "group_copy",
    "new_start",
    "new_end",
    "start_point",
    "end_point",
    "other",
    "shape",
    "text",
    "equation",
    "frame",
    "light",
    "formula",
];

const INTERACTIVE_SHAPES: &[(&str, &str)] = &[
    ("circle", "Circle("),
    ("square", "Square("),
    ("text", "Text("),
    ("line", "Line("),
    ("dot", "Dot("),
    ("arrow", "Arrow("),
    ("axes", "Axes("),
    ("graph", "FunctionGraph("),
    ("rect", "Rectangle("),
    ("arc", "Arc("),
];

const INTERACTIVE_SESSION_MARKERS: &[&str] =
    &["checkpoint_paste", "save_state", "undo", ".embed()"];

impl RuleSet {
    pub fn community() -> Self {
        Self {
            dialect: Dialect::Community,
            non_source_markers: COMMUNITY_MARKERS,
            creation_tokens: COMMUNITY_CREATION,
            placeholders: COMMUNITY_PLACEHOLDERS,
            shapes: COMMUNITY_SHAPES,
            interactive: None,
        }
    }

    pub fn interactive() -> Self {
        Self {
            dialect: Dialect::Interactive,
            non_source_markers: INTERACTIVE_MARKERS,
            creation_tokens: &[],
            placeholders: INTERACTIVE_PLACEHOLDERS,
            shapes: INTERACTIVE_SHAPES,
            interactive: Some(InteractiveRules {
                embed_call: ".embed()",
                session_markers: INTERACTIVE_SESSION_MARKERS,
                config_prefix: "config.",
            }),
        }
    }

    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Community => Self::community(),
            Dialect::Interactive => Self::interactive(),
        }
    }
}
