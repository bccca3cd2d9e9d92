//! Block-sequence documents: the flat list-of-typed-blocks format used by the
//! legacy editor generation.
//!
//! A block is a kind tag plus an untyped JSON payload. Known kinds expose
//! typed views over the payload; unknown kinds keep their payload untouched
//! so future block types round-trip byte-equal through coercion.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::now_millis;

/// Schema version written on newly synthesized block documents.
pub const BLOCK_VERSION: &str = "2.0.0";

/// Heading levels supported by the block family.
pub const HEADER_LEVELS: std::ops::RangeInclusive<u8> = 2..=4;

/// A block-sequence document: `{ time, version, blocks }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl BlockDocument {
    /// Build a document around the given blocks, stamped with the current time.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            time: now_millis(),
            version: BLOCK_VERSION.to_string(),
            blocks,
        }
    }

    /// The minimal valid document: one empty paragraph.
    pub fn empty() -> Self {
        Self::new(vec![Block::paragraph("")])
    }
}

/// One block: a kind tag and a kind-specific JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: SmolStr,
    #[serde(default)]
    pub data: Value,
    /// Fields this crate does not model (e.g. the editor's per-block `id`),
    /// preserved so stored blocks round-trip unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Block {
    pub const PARAGRAPH: &'static str = "paragraph";
    pub const HEADER: &'static str = "header";
    pub const IMAGE: &'static str = "image";

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: SmolStr::new_static(Self::PARAGRAPH),
            data: serde_json::json!({ "text": text.into() }),
            extra: serde_json::Map::new(),
        }
    }

    pub fn header(text: impl Into<String>, level: u8) -> Self {
        Self {
            kind: SmolStr::new_static(Self::HEADER),
            data: serde_json::json!({ "text": text.into(), "level": level }),
            extra: serde_json::Map::new(),
        }
    }

    pub fn image(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            kind: SmolStr::new_static(Self::IMAGE),
            data: serde_json::json!({
                "file": { "url": url.into() },
                "caption": caption.into(),
            }),
            extra: serde_json::Map::new(),
        }
    }

    /// The `text` payload field, for paragraph and header blocks.
    pub fn text(&self) -> &str {
        self.data
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The heading level, clamped into [`HEADER_LEVELS`]. Missing or
    /// non-numeric levels fall back to 2.
    pub fn header_level(&self) -> u8 {
        let level = self
            .data
            .get("level")
            .and_then(Value::as_u64)
            .unwrap_or(u64::from(*HEADER_LEVELS.start()));
        (level.min(u64::from(u8::MAX)) as u8)
            .clamp(*HEADER_LEVELS.start(), *HEADER_LEVELS.end())
    }

    /// The image URL (`data.file.url`), if present and non-blank.
    pub fn image_url(&self) -> Option<&str> {
        let url = self
            .data
            .get("file")
            .and_then(|f| f.get("url"))
            .and_then(Value::as_str)?;
        let trimmed = url.trim();
        (!trimmed.is_empty()).then_some(url)
    }

    /// The image caption, defaulting to the empty string.
    pub fn image_caption(&self) -> &str {
        self.data
            .get("caption")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_level_clamps_and_defaults() {
        assert_eq!(Block::header("t", 3).header_level(), 3);
        assert_eq!(Block::header("t", 9).header_level(), 4);
        assert_eq!(Block::header("t", 1).header_level(), 2);
        assert_eq!(Block::paragraph("t").header_level(), 2);
    }

    #[test]
    fn blank_image_url_is_none() {
        assert_eq!(Block::image("", "cap").image_url(), None);
        assert_eq!(Block::image("  ", "cap").image_url(), None);
        assert_eq!(
            Block::image("https://cdn.test/a.png", "").image_url(),
            Some("https://cdn.test/a.png")
        );
    }

    #[test]
    fn block_serializes_with_type_tag() {
        let json = serde_json::to_value(Block::paragraph("hi")).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["data"]["text"], "hi");
    }
}
