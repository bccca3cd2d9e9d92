//! Tree documents: the nested node-with-children format used by the current
//! editor generation.
//!
//! A document is a single root node of kind `"doc"`. Leaf text nodes carry an
//! ordered list of inline marks. Nodes keep any JSON fields this crate does
//! not model in `extra`, so forward-compatible content survives a read/write
//! cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

/// Heading levels supported by the tree family.
pub const HEADING_LEVELS: std::ops::RangeInclusive<u8> = 1..=3;

/// One node in a tree document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(rename = "type")]
    pub kind: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<TreeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TreeNode {
    pub const DOC: &'static str = "doc";
    pub const PARAGRAPH: &'static str = "paragraph";
    pub const HEADING: &'static str = "heading";
    pub const TEXT: &'static str = "text";
    pub const IMAGE: &'static str = "image";
    pub const HARD_BREAK: &'static str = "hardBreak";
    pub const BULLET_LIST: &'static str = "bulletList";
    pub const ORDERED_LIST: &'static str = "orderedList";
    pub const LIST_ITEM: &'static str = "listItem";
    pub const BLOCKQUOTE: &'static str = "blockquote";

    fn bare(kind: &'static str) -> Self {
        Self {
            kind: SmolStr::new_static(kind),
            attrs: None,
            content: None,
            text: None,
            marks: None,
            extra: Map::new(),
        }
    }

    pub fn doc(content: Vec<TreeNode>) -> Self {
        Self {
            content: Some(content),
            ..Self::bare(Self::DOC)
        }
    }

    pub fn paragraph(content: Vec<TreeNode>) -> Self {
        Self {
            content: Some(content),
            ..Self::bare(Self::PARAGRAPH)
        }
    }

    /// An empty paragraph: the universal fallback cursor target.
    pub fn empty_paragraph() -> Self {
        Self::paragraph(Vec::new())
    }

    pub fn heading(level: u8, content: Vec<TreeNode>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("level".into(), Value::from(level));
        Self {
            attrs: Some(attrs),
            content: Some(content),
            ..Self::bare(Self::HEADING)
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::bare(Self::TEXT)
        }
    }

    pub fn text_marked(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            marks: Some(marks),
            ..Self::text(text)
        }
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("src".into(), Value::from(src.into()));
        attrs.insert("alt".into(), Value::from(alt.into()));
        Self {
            attrs: Some(attrs),
            ..Self::bare(Self::IMAGE)
        }
    }

    pub fn is_doc(&self) -> bool {
        self.kind == Self::DOC
    }

    pub fn is_text(&self) -> bool {
        self.kind == Self::TEXT
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[TreeNode] {
        self.content.as_deref().unwrap_or_default()
    }

    /// A string attribute, if present.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(name)?.as_str()
    }

    /// The heading level, clamped into [`HEADING_LEVELS`]. Missing or
    /// non-numeric levels fall back to 2.
    pub fn heading_level(&self) -> u8 {
        let level = self
            .attrs
            .as_ref()
            .and_then(|a| a.get("level"))
            .and_then(Value::as_u64)
            .unwrap_or(2);
        (level.min(u64::from(u8::MAX)) as u8).clamp(*HEADING_LEVELS.start(), *HEADING_LEVELS.end())
    }

    /// The image source (`attrs.src`), if present and non-blank.
    pub fn image_src(&self) -> Option<&str> {
        let src = self.attr_str("src")?;
        (!src.trim().is_empty()).then_some(src)
    }
}

/// An inline mark on a text node: bold, italic, underline, code, or a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl Mark {
    pub const BOLD: &'static str = "bold";
    pub const ITALIC: &'static str = "italic";
    pub const UNDERLINE: &'static str = "underline";
    pub const CODE: &'static str = "code";
    pub const LINK: &'static str = "link";

    fn simple(kind: &'static str) -> Self {
        Self {
            kind: SmolStr::new_static(kind),
            attrs: None,
        }
    }

    pub fn bold() -> Self {
        Self::simple(Self::BOLD)
    }

    pub fn italic() -> Self {
        Self::simple(Self::ITALIC)
    }

    pub fn underline() -> Self {
        Self::simple(Self::UNDERLINE)
    }

    pub fn code() -> Self {
        Self::simple(Self::CODE)
    }

    pub fn link(href: impl Into<String>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("href".into(), Value::from(href.into()));
        Self {
            kind: SmolStr::new_static(Self::LINK),
            attrs: Some(attrs),
        }
    }

    /// The link target for link marks, defaulting to the empty string.
    pub fn href(&self) -> &str {
        self.attrs
            .as_ref()
            .and_then(|a| a.get("href"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}
