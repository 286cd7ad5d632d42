//! Executability classifier
//!
//! Decides whether a fenced python block from a skill file is a complete
//! example worth rendering, or an API fragment that would fail for reasons
//! unrelated to the documentation being correct. Each check is a named rule
//! evaluated over a [`BlockView`] that is computed once per block.

pub mod rules;

use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

pub use rules::{InteractiveRules, RuleSet};

use crate::dialect::Dialect;
use crate::synthesizer::has_scene_class;

/// A reason for skipping a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Nothing but comments, or only the star import
    Empty,
    /// Shell commands, install instructions, config file sections
    NonSourceMarker,
    /// Reads of the global `config` object
    ConfigSnippet,
    /// Only `self.method(...)` calls with nothing created
    ImplicitReceiverCalls,
    /// Interactive shell, checkpoints, undo
    InteractiveFeature,
    /// Doc placeholder name that is used but never bound
    UnboundPlaceholder,
    /// Lowercase shape name used without its constructor
    UncreatedShape,
    /// Only bare calls, an API listing
    BareCalls,
    /// Only comma separated UPPER_CASE constants
    ConstantList,
    /// Several lines of bare names
    IdentifierList,
}

impl RuleKind {
    /// Evaluation order. The first rule that fires decides the verdict.
    pub const ORDER: [RuleKind; 10] = [
        RuleKind::Empty,
        RuleKind::NonSourceMarker,
        RuleKind::ConfigSnippet,
        RuleKind::ImplicitReceiverCalls,
        RuleKind::InteractiveFeature,
        RuleKind::UnboundPlaceholder,
        RuleKind::UncreatedShape,
        RuleKind::BareCalls,
        RuleKind::ConstantList,
        RuleKind::IdentifierList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Empty => "empty",
            RuleKind::NonSourceMarker => "non-source-marker",
            RuleKind::ConfigSnippet => "config-snippet",
            RuleKind::ImplicitReceiverCalls => "implicit-receiver-calls",
            RuleKind::InteractiveFeature => "interactive-feature",
            RuleKind::UnboundPlaceholder => "unbound-placeholder",
            RuleKind::UncreatedShape => "uncreated-shape",
            RuleKind::BareCalls => "bare-calls",
            RuleKind::ConstantList => "constant-list",
            RuleKind::IdentifierList => "identifier-list",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Runnable,
    Skip(RuleKind),
}

impl Verdict {
    pub fn is_runnable(&self) -> bool {
        matches!(self, Verdict::Runnable)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Runnable => write!(f, "runnable"),
            Verdict::Skip(rule) => write!(f, "skip ({})", rule),
        }
    }
}

/// Regexes for finding names a block reads and names it binds
struct NamePatterns {
    identifier: Regex,
    assignment: Regex,
    annotated: Regex,
    tuple_assignment: Regex,
    definition: Regex,
    def_params: Regex,
    lambda_params: Regex,
    for_targets: Regex,
    as_target: Regex,
    import_names: Regex,
    paren_aside: Regex,
}

impl NamePatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            // Attribute accesses (`self.frame`) are not references to a name
            identifier: Regex::new(r"(?:^|[^\w.])([A-Za-z_]\w*)")?,
            assignment: Regex::new(r"([A-Za-z_]\w*)\s*(?:\*\*|//|>>|<<|[-+*/%&|^@])?=(?:[^=]|$)")?,
            annotated: Regex::new(r"^([A-Za-z_]\w*)\s*:[^=]*=(?:[^=]|$)")?,
            tuple_assignment: Regex::new(
                r"^\(?([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)+)\)?\s*=(?:[^=]|$)",
            )?,
            definition: Regex::new(r"\b(?:def|class)\s+([A-Za-z_]\w*)")?,
            def_params: Regex::new(r"\bdef\s+[A-Za-z_]\w*\s*\(([^)]*)\)")?,
            lambda_params: Regex::new(r"\blambda\b([^:]*):")?,
            for_targets: Regex::new(r"\bfor\s+(.+?)\s+in\b")?,
            as_target: Regex::new(r"\bas\s+([A-Za-z_]\w*)")?,
            import_names: Regex::new(r"^(?:from\s+\S+\s+)?import\s+(.+)$")?,
            paren_aside: Regex::new(r"\([^)]*\)")?,
        })
    }
}

struct ShapeMatcher {
    name: &'static str,
    constructor: &'static str,
    /// `(name`, `, name` or `name.`
    usage: Regex,
}

/// Pre-computed facts about one block, shared by every rule
struct BlockView<'a> {
    raw: &'a str,
    lower: String,
    /// Non-empty lines that are not whole-line comments, trimmed
    lines: Vec<&'a str>,
    /// `lines` without import statements
    body: Vec<&'a str>,
    /// `lines` with trailing comments cut, joined
    code: String,
    has_scene_class: bool,
    has_object_creation: bool,
    referenced: HashSet<String>,
    bound: HashSet<String>,
}

fn is_import(line: &str) -> bool {
    line.starts_with("from ") || line.starts_with("import ")
}

/// A call shown on its own: nothing assigned, nothing defined
fn is_bare_call(line: &str) -> bool {
    line.contains('(') && line.contains(')') && !line.contains('=') && !line.starts_with("def ")
}

fn strip_inline_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("").trim_end()
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// A single name on its own, with at least one non-underscore character
fn is_bare_identifier(text: &str) -> bool {
    is_identifier(text) && text.chars().any(|c| c != '_')
}

/// Parameter names out of a `def`/`lambda` parameter list
fn param_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').filter_map(|param| {
        let name = param
            .trim()
            .trim_start_matches('*')
            .split([':', '='])
            .next()
            .unwrap_or("")
            .trim();
        is_identifier(name).then_some(name)
    })
}

impl<'a> BlockView<'a> {
    fn new(raw: &'a str, patterns: &NamePatterns, rules: &RuleSet) -> Self {
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        let body: Vec<&str> = lines.iter().copied().filter(|l| !is_import(l)).collect();
        let code_lines: Vec<&str> = lines.iter().map(|l| strip_inline_comment(l)).collect();
        let code = code_lines.join("\n");

        let has_object_creation = lines.iter().any(|line| {
            line.contains('=') || rules.creation_tokens.iter().any(|t| line.contains(t))
        });

        let mut referenced = HashSet::new();
        let mut bound = HashSet::new();
        for line in &code_lines {
            for caps in patterns.identifier.captures_iter(line) {
                referenced.insert(caps[1].to_string());
            }
            Self::collect_bindings(line, patterns, &mut bound);
        }

        Self {
            raw,
            lower: raw.to_lowercase(),
            has_scene_class: has_scene_class(&code),
            lines,
            body,
            code,
            has_object_creation,
            referenced,
            bound,
        }
    }

    fn collect_bindings(line: &str, patterns: &NamePatterns, bound: &mut HashSet<String>) {
        // Includes keyword arguments (`f(mob=...)`), which docs use to name
        // the value they talk about.
        for caps in patterns.assignment.captures_iter(line) {
            bound.insert(caps[1].to_string());
        }
        if let Some(caps) = patterns.annotated.captures(line) {
            bound.insert(caps[1].to_string());
        }
        if let Some(caps) = patterns.tuple_assignment.captures(line) {
            bound.extend(caps[1].split(',').map(|n| n.trim().to_string()));
        }
        for caps in patterns.definition.captures_iter(line) {
            bound.insert(caps[1].to_string());
        }
        for caps in patterns.def_params.captures_iter(line) {
            bound.extend(param_names(&caps[1]).map(str::to_string));
        }
        for caps in patterns.lambda_params.captures_iter(line) {
            bound.extend(param_names(&caps[1]).map(str::to_string));
        }
        for caps in patterns.for_targets.captures_iter(line) {
            for target in patterns.identifier.captures_iter(&caps[1]) {
                bound.insert(target[1].to_string());
            }
        }
        for caps in patterns.as_target.captures_iter(line) {
            bound.insert(caps[1].to_string());
        }
        if let Some(caps) = patterns.import_names.captures(line) {
            bound.extend(param_names(&caps[1].replace(" as ", ",")).map(str::to_string));
        }
    }
}

/// Rule-based executability predicate for one dialect
pub struct Classifier {
    rules: RuleSet,
    star_import: String,
    patterns: NamePatterns,
    shapes: Vec<ShapeMatcher>,
}

impl Classifier {
    pub fn new(rules: RuleSet) -> Result<Self> {
        let shapes = rules
            .shapes
            .iter()
            .map(|&(name, constructor)| {
                let escaped = regex::escape(name);
                let usage = Regex::new(&format!(
                    r"(?m)(?:\(\s*|,\s*){escaped}\b|(?:^|[^\w.]){escaped}\."
                ))?;
                Ok(ShapeMatcher {
                    name,
                    constructor,
                    usage,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            star_import: rules.dialect.star_import(),
            patterns: NamePatterns::new()?,
            shapes,
            rules,
        })
    }

    pub fn for_dialect(dialect: Dialect) -> Result<Self> {
        Self::new(RuleSet::for_dialect(dialect))
    }

    pub fn is_executable(&self, code: &str) -> bool {
        self.classify(code).is_runnable()
    }

    pub fn classify(&self, code: &str) -> Verdict {
        let view = BlockView::new(code, &self.patterns, &self.rules);
        for rule in RuleKind::ORDER {
            if self.fires(rule, &view) {
                debug!("Block skipped by rule {}", rule);
                return Verdict::Skip(rule);
            }
        }
        Verdict::Runnable
    }

    fn fires(&self, rule: RuleKind, view: &BlockView) -> bool {
        match rule {
            RuleKind::Empty => view.lines.is_empty() || view.lines.join("\n") == self.star_import,
            RuleKind::NonSourceMarker => self.has_non_source_marker(view),
            RuleKind::ConfigSnippet => self.is_config_snippet(view),
            RuleKind::ImplicitReceiverCalls => Self::only_implicit_receiver_calls(view),
            RuleKind::InteractiveFeature => self.uses_interactive_feature(view),
            RuleKind::UnboundPlaceholder => self.has_unbound_placeholder(view),
            RuleKind::UncreatedShape => self.has_uncreated_shape(view),
            RuleKind::BareCalls => Self::is_call_listing(view),
            RuleKind::ConstantList => self.is_constant_listing(view),
            RuleKind::IdentifierList => Self::is_identifier_listing(view),
        }
    }

    /// No scene class and nothing created: a candidate reference listing
    fn is_listing(view: &BlockView) -> bool {
        !view.has_scene_class && !view.has_object_creation
    }

    fn has_non_source_marker(&self, view: &BlockView) -> bool {
        let markers = self.rules.non_source_markers;
        markers.iter().any(|m| view.raw.contains(m))
    }

    fn is_config_snippet(&self, view: &BlockView) -> bool {
        let Some(interactive) = &self.rules.interactive else {
            return false;
        };
        let constructs = view.raw.lines().any(|l| l.contains('=') && l.contains('('));
        view.raw.contains(interactive.config_prefix) && !view.raw.contains("class") && !constructs
    }

    /// `self.` calls with nothing created for them to act on
    fn only_implicit_receiver_calls(view: &BlockView) -> bool {
        let implicit = |l: &&str| l.starts_with("self.") || is_import(l);
        !view.has_object_creation && view.lines.iter().all(implicit)
    }

    fn uses_interactive_feature(&self, view: &BlockView) -> bool {
        let Some(interactive) = &self.rules.interactive else {
            return false;
        };
        if view.raw.contains(interactive.embed_call) {
            return true;
        }
        let markers = interactive.session_markers;
        !view.has_scene_class && markers.iter().any(|m| view.lower.contains(m))
    }

    fn has_unbound_placeholder(&self, view: &BlockView) -> bool {
        if view.has_scene_class {
            return false;
        }
        self.rules
            .placeholders
            .iter()
            .any(|p| view.referenced.contains(*p) && !view.bound.contains(*p))
    }

    fn has_uncreated_shape(&self, view: &BlockView) -> bool {
        if view.has_scene_class {
            return false;
        }
        for shape in &self.shapes {
            if !view.raw.contains(shape.constructor) && shape.usage.is_match(&view.code) {
                debug!("'{}' used without {}", shape.name, shape.constructor);
                return true;
            }
        }
        false
    }

    fn is_call_listing(view: &BlockView) -> bool {
        Self::is_listing(view) && view.body.iter().all(|l| is_bare_call(l))
    }

    fn is_constant_listing(&self, view: &BlockView) -> bool {
        Self::is_listing(view) && view.body.iter().all(|l| self.is_constant_list_line(l))
    }

    fn is_identifier_listing(view: &BlockView) -> bool {
        let identifier = |l: &&str| is_bare_identifier(strip_inline_comment(l).trim());
        Self::is_listing(view) && view.body.len() > 1 && view.body.iter().all(identifier)
    }

    /// `RED, GREEN, BLUE` style lines; parenthesized asides like `(or GRAY)`
    /// are ignored
    fn is_constant_list_line(&self, line: &str) -> bool {
        let cleaned = self.patterns.paren_aside.replace_all(line, "");
        let parts: Vec<&str> = cleaned
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return false;
        }
        parts.iter().all(|part| {
            let letters: String = part.chars().filter(|&c| c != '_').collect();
            !letters.is_empty() && letters.chars().all(char::is_uppercase)
        })
    }
}
