//! The tagged wrapper that records which document family a stored value uses.

use serde::{Deserialize, Serialize};

use crate::block::BlockDocument;
use crate::tree::TreeNode;

/// Wrapper schema version. Bumped only if the envelope itself changes shape.
pub const WRAPPER_VERSION: u8 = 1;

/// A stored post body, tagged with the document family it belongs to.
///
/// The persistence layer is a single untyped column, so this tag is the only
/// authoritative record of which schema a row was written under. Detection of
/// untagged legacy rows lives in [`crate::coerce::to_rich_content`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RichContent {
    Tiptap { version: u8, doc: TreeNode },
    EditorJs { version: u8, doc: BlockDocument },
}

impl RichContent {
    pub fn tiptap(doc: TreeNode) -> Self {
        Self::Tiptap {
            version: WRAPPER_VERSION,
            doc,
        }
    }

    pub fn editorjs(doc: BlockDocument) -> Self {
        Self::EditorJs {
            version: WRAPPER_VERSION,
            doc,
        }
    }

    /// The wire tag of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tiptap { .. } => "tiptap",
            Self::EditorJs { .. } => "editorjs",
        }
    }
}

impl From<TreeNode> for RichContent {
    fn from(doc: TreeNode) -> Self {
        Self::tiptap(doc)
    }
}

impl From<BlockDocument> for RichContent {
    fn from(doc: BlockDocument) -> Self {
        Self::editorjs(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_tag_on_the_wire() {
        let rich = RichContent::tiptap(TreeNode::doc(vec![TreeNode::empty_paragraph()]));
        let json = serde_json::to_value(&rich).unwrap();
        assert_eq!(json["kind"], "tiptap");
        assert_eq!(json["version"], 1);
        assert_eq!(json["doc"]["type"], "doc");
    }

    #[test]
    fn editorjs_tag_round_trips() {
        let rich = RichContent::editorjs(BlockDocument::empty());
        let json = serde_json::to_value(&rich).unwrap();
        assert_eq!(json["kind"], "editorjs");
        let back: RichContent = serde_json::from_value(json).unwrap();
        assert_eq!(back, rich);
    }
}
