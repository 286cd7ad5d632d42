//! Turns a runnable code block into a complete scene program

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::dialect::Dialect;
use crate::util::title_case;

/// `class Name(...Scene...):` on one line
const SCENE_CLASS_PATTERN: &str = r"class\s+(\w+)\s*\(([^)\n]*Scene[^)\n]*)\)\s*:";

static SCENE_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(SCENE_CLASS_PATTERN).expect("scene class regex is valid"));

/// Names of the scene classes declared in `code`, in order
pub fn scene_class_names(code: &str) -> Vec<String> {
    SCENE_CLASS_RE
        .captures_iter(code)
        .map(|caps| caps[1].to_string())
        .collect()
}

pub fn has_scene_class(code: &str) -> bool {
    SCENE_CLASS_RE.is_match(code)
}

/// Scene name for block `index` of `path`: `animation-groups.md`, 3 ->
/// `TestAnimationGroups_3`
pub fn test_name_for(path: &Path, index: usize) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Test{}_{}", title_case(&stem).replace('-', ""), index)
}

/// A complete program and the scene the renderer should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedProgram {
    pub source: String,
    pub scene_name: String,
}

pub struct Synthesizer {
    dialect: Dialect,
}

impl Synthesizer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn has_library_import(&self, code: &str) -> bool {
        let lib = self.dialect.library();
        code.contains(&format!("from {} import", lib)) || code.contains(&format!("import {}", lib))
    }

    /// Build a runnable program from `code`. Blocks that already declare a
    /// scene are kept as they are; anything else is wrapped in a
    /// `construct` method of a new scene called `test_name`.
    pub fn synthesize(&self, code: &str, test_name: &str) -> SynthesizedProgram {
        let source = if has_scene_class(code) {
            if self.has_library_import(code) {
                code.to_string()
            } else {
                format!("{}\n\n{}", self.dialect.star_import(), code)
            }
        } else {
            let body = code
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| format!("        {}", line))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "{}\n\nclass {}({}):\n    def construct(self):\n{}\n",
                self.dialect.star_import(),
                test_name,
                self.dialect.default_scene_base(),
                body
            )
        };

        let scene_name = scene_class_names(&source)
            .into_iter()
            .next()
            .unwrap_or_else(|| test_name.to_string());

        SynthesizedProgram { source, scene_name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_class_names() {
        let code = concat!(
            "class A(Scene):\n    pass\n",
            "class Helper:\n    pass\n",
            "class B(MovingCameraScene):\n    pass\n",
        );
        assert_eq!(scene_class_names(code), vec!["A", "B"]);
        assert!(!has_scene_class("class Helper(VGroup):\n    pass\n"));
    }

    #[test]
    fn test_test_name_for() {
        assert_eq!(
            test_name_for(Path::new("rules/animation-groups.md"), 3),
            "TestAnimationGroups_3"
        );
        assert_eq!(test_name_for(Path::new("scenes.md"), 0), "TestScenes_0");
    }

    #[test]
    fn test_wraps_bare_statements() {
        let synth = Synthesizer::new(Dialect::Community);
        let code = "circle = Circle()\n\nself.play(Create(circle))\n";
        let program = synth.synthesize(code, "TestShapes_0");

        assert_eq!(program.scene_name, "TestShapes_0");
        let expected = concat!(
            "from manim import *\n\n",
            "class TestShapes_0(Scene):\n",
            "    def construct(self):\n",
            "        circle = Circle()\n",
            "        self.play(Create(circle))\n",
        );
        assert_eq!(program.source, expected);
        assert_eq!(program.source.matches("from manim import *").count(), 1);
        assert_eq!(scene_class_names(&program.source), vec!["TestShapes_0"]);
    }

    #[test]
    fn test_wrap_keeps_relative_indentation() {
        let synth = Synthesizer::new(Dialect::Community);
        let code = "for i in range(3):\n    self.add(Dot())\n";
        let program = synth.synthesize(code, "TestLoops_1");
        let wrapped_loop = "        for i in range(3):\n            self.add(Dot())\n";
        assert!(program.source.contains(wrapped_loop));
    }

    #[test]
    fn test_interactive_wrap_uses_interactive_scene() {
        let synth = Synthesizer::new(Dialect::Interactive);
        let program = synth.synthesize("square = Square()\nself.add(square)\n", "TestX_2");
        assert!(program.source.starts_with("from manimlib import *\n\n"));
        let header = "class TestX_2(InteractiveScene):";
        assert!(program.source.contains(header));
    }

    #[test]
    fn test_scene_block_with_import_unchanged() {
        let synth = Synthesizer::new(Dialect::Community);
        let code = concat!(
            "from manim import *\n\n",
            "class Intro(Scene):\n",
            "    def construct(self):\n",
            "        self.add(Circle())\n",
        );
        let program = synth.synthesize(code, "TestIntro_0");
        assert_eq!(program.source, code);
        assert_eq!(program.scene_name, "Intro");
    }

    #[test]
    fn test_scene_block_without_import_gets_one() {
        let synth = Synthesizer::new(Dialect::Community);
        let code = "class Intro(Scene):\n    def construct(self):\n        pass\n";
        let program = synth.synthesize(code, "TestIntro_0");
        assert_eq!(program.source, format!("from manim import *\n\n{}", code));
        assert_eq!(program.scene_name, "Intro");
    }

    #[test]
    fn test_first_scene_class_is_entry_point() {
        let synth = Synthesizer::new(Dialect::Interactive);
        let code = concat!(
            "from manimlib import *\n",
            "class First(InteractiveScene):\n    pass\n",
            "class Second(Scene):\n    pass\n",
        );
        assert_eq!(synth.synthesize(code, "TestMany_4").scene_name, "First");
    }
}
