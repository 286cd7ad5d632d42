//! Extraction, classification and synthesis over realistic skill documents

use scenecheck::classifier::{Classifier, RuleKind, Verdict};
use scenecheck::dialect::Dialect;
use scenecheck::markdown::extract_python_blocks;
use scenecheck::synthesizer::{test_name_for, Synthesizer};
use std::path::Path;

const COMMUNITY_DOC: &str = r#"# Transforms

Install first:

```bash
pip install manim
```

```python
from manim import *
```

Morph one shape into another:

```python
square = Square()
circle = Circle()
self.play(Transform(square, circle))
```

Full scene:

```python
from manim import *

class MorphScene(Scene):
    def construct(self):
        self.play(Transform(mobject, Circle()))
```

Reference:

```python
Transform(a, b)
ReplacementTransform(a, b)
```

```python
self.play(FadeIn(mobject1))
```
"#;

const INTERACTIVE_DOC: &str = r#"# Interactive development

```python
class Sketch(InteractiveScene):
    def construct(self):
        square = Square()
        self.add(square)
        self.embed()
```

```python
[CLI]
manimgl scene.py Sketch
```

```python
config.camera.background_color = BLACK
```

```python
square.shift(UP)
```

```python
dots = VGroup(*(Dot() for _ in range(5)))
dots.arrange(RIGHT)
self.play(ShowCreation(dots))
```
"#;

fn verdicts(dialect: Dialect, doc: &str) -> Vec<Verdict> {
    let classifier = Classifier::for_dialect(dialect).unwrap();
    extract_python_blocks(doc)
        .iter()
        .map(|block| classifier.classify(&block.code))
        .collect()
}

#[test]
fn test_community_document_verdicts() {
    assert_eq!(
        verdicts(Dialect::Community, COMMUNITY_DOC),
        vec![
            Verdict::Skip(RuleKind::Empty),
            Verdict::Runnable,
            Verdict::Runnable,
            Verdict::Skip(RuleKind::BareCalls),
            Verdict::Skip(RuleKind::ImplicitReceiverCalls),
        ]
    );
}

#[test]
fn test_interactive_document_verdicts() {
    assert_eq!(
        verdicts(Dialect::Interactive, INTERACTIVE_DOC),
        vec![
            Verdict::Skip(RuleKind::InteractiveFeature),
            Verdict::Skip(RuleKind::NonSourceMarker),
            Verdict::Skip(RuleKind::ConfigSnippet),
            Verdict::Skip(RuleKind::UncreatedShape),
            Verdict::Runnable,
        ]
    );
}

#[test]
fn test_runnable_blocks_become_complete_programs() {
    let classifier = Classifier::for_dialect(Dialect::Community).unwrap();
    let synthesizer = Synthesizer::new(Dialect::Community);
    let path = Path::new("rules/transforms.md");

    let programs: Vec<_> = extract_python_blocks(COMMUNITY_DOC)
        .into_iter()
        .filter(|block| classifier.is_executable(&block.code))
        .map(|block| synthesizer.synthesize(&block.code, &test_name_for(path, block.index)))
        .collect();

    assert_eq!(programs.len(), 2);

    let wrapped = &programs[0];
    assert_eq!(wrapped.scene_name, "TestTransforms_1");
    assert_eq!(wrapped.source.matches("from manim import *").count(), 1);
    assert_eq!(wrapped.source.matches("class ").count(), 1);
    let header = concat!(
        "class TestTransforms_1(Scene):\n",
        "    def construct(self):\n",
        "        square = Square()\n",
    );
    assert!(wrapped.source.contains(header));
    let last_line = "        self.play(Transform(square, circle))\n";
    assert!(wrapped.source.ends_with(last_line));

    let complete = &programs[1];
    assert_eq!(complete.scene_name, "MorphScene");
    let header = "from manim import *\n\nclass MorphScene(Scene):";
    assert!(complete.source.starts_with(header));
    assert_eq!(complete.source.matches("from manim import *").count(), 1);
}

#[test]
fn test_interactive_programs_use_manimlib() {
    let synthesizer = Synthesizer::new(Dialect::Interactive);
    let program = synthesizer.synthesize("dot = Dot()\nself.add(dot)\n", "TestDots_0");
    assert!(program.source.starts_with("from manimlib import *\n\n"));
    let header = "class TestDots_0(InteractiveScene):";
    assert!(program.source.contains(header));
    assert_eq!(program.scene_name, "TestDots_0");
}
