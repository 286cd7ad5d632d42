//! Fenced code block extraction from skill markdown files

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening fence must be exactly ```` ```python ```` followed by a newline;
/// the block ends at the first closing fence.
static PYTHON_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```python\n(.*?)```").expect("python block regex is valid"));

/// One fenced python block, as written in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Zero-based position among the python blocks of the document
    pub index: usize,
    pub code: String,
}

/// Extract every python code block from markdown, in document order.
pub fn extract_python_blocks(markdown: &str) -> Vec<CodeBlock> {
    PYTHON_BLOCK_RE
        .captures_iter(markdown)
        .enumerate()
        .filter_map(|(index, caps)| {
            caps.get(1).map(|m| CodeBlock {
                index,
                code: m.as_str().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_blocks() {
        assert!(extract_python_blocks("").is_empty());
        assert!(extract_python_blocks("# Title\n\nJust prose.\n").is_empty());
    }

    #[test]
    fn test_ignores_other_languages() {
        let md = "```bash\nmanim -pql scene.py\n```\n\n```\nplain\n```\n";
        assert!(extract_python_blocks(md).is_empty());
    }

    #[test]
    fn test_extracts_in_order_with_exact_text() {
        let md = r#"
## First

```python
circle = Circle()
self.play(Create(circle))
```

Some text.

```python
x = 1
```
"#;
        let blocks = extract_python_blocks(md);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].index, 0);
        assert_eq!(
            blocks[0].code,
            "circle = Circle()\nself.play(Create(circle))\n"
        );
        assert_eq!(blocks[1].index, 1);
        assert_eq!(blocks[1].code, "x = 1\n");
    }

    #[test]
    fn test_first_closing_fence_wins() {
        let md = "```python\na = 1\n```\nprose\n```\n";
        let blocks = extract_python_blocks(md);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].code, "a = 1\n");
    }

    #[test]
    fn test_tag_must_be_followed_by_newline() {
        // ```python3 or ```python title="x" are not picked up
        let md = "```python3\na = 1\n```\n```python title=\"x\"\nb = 2\n```\n";
        assert!(extract_python_blocks(md).is_empty());
    }
}
