//! Total format coercion: any stored value in, a well-formed sanitized
//! document out.
//!
//! Nothing in this module returns an error. Malformed historical rows must
//! never block page rendering, so every path degrades to the minimal valid
//! document (a single empty paragraph) instead of surfacing a parse failure.
//!
//! Detection order matters and is deliberate: a wrapper tag beats shape
//! inference, and tree shape beats block shape, because a malformed object
//! can ambiguously satisfy the weaker predicates.

use serde_json::{Map, Value};
use tracing::trace;

use crate::block::{Block, BlockDocument, HEADER_LEVELS};
use crate::rich::{RichContent, WRAPPER_VERSION};
use crate::tree::{Mark, TreeNode};

/// Parse a stored string as JSON, tolerating one level of accidental
/// double-encoding (a JSON string whose contents are themselves JSON).
///
/// Returns `None` when the string should be treated as legacy plain text.
pub fn parse_loose(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Plain prose never starts with a JSON opener; skip the parse attempt.
    if !(trimmed.starts_with('{') || trimmed.starts_with('[') || trimmed.starts_with('"')) {
        return None;
    }
    let first: Value = serde_json::from_str(trimmed).ok()?;
    match first {
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        other => Some(other),
    }
}

/// Interpret a stored value as a [`RichContent`] wrapper.
///
/// Priority: wrapper tag, then bare tree document, then bare block sequence,
/// then legacy plain text. Total; the fallback is an empty tree document.
pub fn to_rich_content(raw: &Value) -> RichContent {
    if let Value::String(s) = raw {
        return match parse_loose(s) {
            Some(parsed) => to_rich_content(&parsed),
            None => RichContent::tiptap(tree_from_text(s)),
        };
    }

    if let Some(obj) = raw.as_object() {
        if wrapper_doc(obj, "tiptap").is_some() {
            let doc = &obj["doc"];
            return RichContent::tiptap(coerce_tree(doc));
        }
        if wrapper_doc(obj, "editorjs").is_some() {
            let doc = &obj["doc"];
            return RichContent::editorjs(coerce_blocks(doc));
        }
        if obj.get("type").and_then(Value::as_str) == Some(TreeNode::DOC) {
            return RichContent::tiptap(coerce_tree(raw));
        }
        if obj.get("blocks").is_some_and(Value::is_array) {
            return RichContent::editorjs(coerce_blocks(raw));
        }
    }

    trace!("unrecognized stored content shape, degrading to empty document");
    RichContent::tiptap(empty_tree())
}

/// Check for a well-formed wrapper envelope with the given tag.
fn wrapper_doc<'v>(obj: &'v Map<String, Value>, tag: &str) -> Option<&'v Value> {
    if obj.get("kind").and_then(Value::as_str) != Some(tag) {
        return None;
    }
    if obj.get("version").and_then(Value::as_u64) != Some(u64::from(WRAPPER_VERSION)) {
        return None;
    }
    obj.get("doc").filter(|d| d.is_object())
}

// === Tree family ===

/// Coerce any stored value into a sanitized tree document. Total.
pub fn coerce_tree(raw: &Value) -> TreeNode {
    match raw {
        Value::Object(obj) => {
            if let Some(doc) = wrapper_doc(obj, "tiptap") {
                return coerce_tree(doc);
            }
            match node_from_value(raw) {
                Some(node) if node.is_doc() => sanitize_tree(node),
                _ => empty_tree(),
            }
        }
        Value::String(s) => match parse_loose(s) {
            Some(parsed) => coerce_tree(&parsed),
            None => tree_from_text(s),
        },
        _ => empty_tree(),
    }
}

fn empty_tree() -> TreeNode {
    TreeNode::doc(vec![TreeNode::empty_paragraph()])
}

/// Legacy plain text: one paragraph per non-empty line.
fn tree_from_text(text: &str) -> TreeNode {
    let paragraphs: Vec<TreeNode> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| TreeNode::paragraph(vec![TreeNode::text(line)]))
        .collect();
    if paragraphs.is_empty() {
        empty_tree()
    } else {
        TreeNode::doc(paragraphs)
    }
}

/// Lenient per-node conversion. A node missing its kind tag is dropped; a
/// field of the wrong type degrades to absent instead of failing the whole
/// document.
fn node_from_value(raw: &Value) -> Option<TreeNode> {
    let obj = raw.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    let mut node = TreeNode {
        kind: kind.into(),
        attrs: None,
        content: None,
        text: None,
        marks: None,
        extra: Map::new(),
    };
    for (key, value) in obj {
        match key.as_str() {
            "type" => {}
            "attrs" => node.attrs = value.as_object().cloned(),
            "text" => node.text = value.as_str().map(str::to_owned),
            "content" => {
                node.content = value
                    .as_array()
                    .map(|items| items.iter().filter_map(node_from_value).collect());
            }
            "marks" => {
                node.marks = value
                    .as_array()
                    .map(|items| items.iter().filter_map(mark_from_value).collect());
            }
            _ => {
                node.extra.insert(key.clone(), value.clone());
            }
        }
    }
    Some(node)
}

fn mark_from_value(raw: &Value) -> Option<Mark> {
    let obj = raw.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    Some(Mark {
        kind: kind.into(),
        attrs: obj.get("attrs").and_then(Value::as_object).cloned(),
    })
}

fn sanitize_tree(mut node: TreeNode) -> TreeNode {
    if node.kind == TreeNode::HEADING {
        let attrs = node.attrs.get_or_insert_with(Map::new);
        if !attrs.get("level").is_some_and(Value::is_u64) {
            attrs.insert("level".into(), Value::from(2));
        }
    }
    if let Some(children) = node.content.take() {
        let kept: Vec<TreeNode> = children
            .into_iter()
            .filter(|child| !(child.kind == TreeNode::IMAGE && child.image_src().is_none()))
            .map(sanitize_tree)
            .collect();
        node.content = Some(kept);
    }
    if node.is_doc() {
        let content = node.content.get_or_insert_with(Vec::new);
        if content.is_empty() {
            content.push(TreeNode::empty_paragraph());
        }
    }
    node
}

// === Block family ===

/// Coerce any stored value into a sanitized block document. Total.
pub fn coerce_blocks(raw: &Value) -> BlockDocument {
    match raw {
        Value::Object(obj) => {
            if let Some(doc) = wrapper_doc(obj, "editorjs") {
                return coerce_blocks(doc);
            }
            match obj.get("blocks").and_then(Value::as_array) {
                Some(blocks) => sanitize_blocks(BlockDocument {
                    time: obj.get("time").and_then(Value::as_i64).unwrap_or_default(),
                    version: obj
                        .get("version")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    blocks: blocks.iter().filter_map(block_from_value).collect(),
                }),
                None => BlockDocument::empty(),
            }
        }
        Value::String(s) => match parse_loose(s) {
            Some(parsed) => coerce_blocks(&parsed),
            None => blocks_from_text(s),
        },
        _ => BlockDocument::empty(),
    }
}

/// Legacy plain text: one paragraph block per non-empty line.
fn blocks_from_text(text: &str) -> BlockDocument {
    let blocks: Vec<Block> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Block::paragraph)
        .collect();
    if blocks.is_empty() {
        BlockDocument::empty()
    } else {
        BlockDocument::new(blocks)
    }
}

fn block_from_value(raw: &Value) -> Option<Block> {
    let obj = raw.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    let mut block = Block {
        kind: kind.into(),
        data: obj.get("data").cloned().unwrap_or(Value::Null),
        extra: Map::new(),
    };
    for (key, value) in obj {
        if key != "type" && key != "data" {
            block.extra.insert(key.clone(), value.clone());
        }
    }
    Some(block)
}

fn sanitize_blocks(doc: BlockDocument) -> BlockDocument {
    let mut blocks = Vec::with_capacity(doc.blocks.len());
    for mut block in doc.blocks {
        match block.kind.as_str() {
            Block::PARAGRAPH | Block::HEADER => {
                let is_header = block.kind == Block::HEADER;
                let data = ensure_object(&mut block.data);
                if !data.get("text").is_some_and(Value::is_string) {
                    data.insert("text".into(), Value::from(""));
                }
                if is_header {
                    let level = data
                        .get("level")
                        .and_then(Value::as_u64)
                        .map(|l| (l.min(u64::from(u8::MAX)) as u8))
                        .unwrap_or(*HEADER_LEVELS.start())
                        .clamp(*HEADER_LEVELS.start(), *HEADER_LEVELS.end());
                    data.insert("level".into(), Value::from(level));
                }
            }
            Block::IMAGE => {
                if block.image_url().is_none() {
                    // Never render a broken source.
                    continue;
                }
                let data = ensure_object(&mut block.data);
                if !data.get("caption").is_some_and(Value::is_string) {
                    data.insert("caption".into(), Value::from(""));
                }
            }
            // Unknown kinds pass through untouched for forward compatibility.
            _ => {}
        }
        blocks.push(block);
    }
    if blocks.is_empty() {
        blocks.push(Block::paragraph(""));
    }
    BlockDocument {
        time: doc.time,
        version: doc.version,
        blocks,
    }
}

fn ensure_object(data: &mut Value) -> &mut Map<String, Value> {
    if !data.is_object() {
        *data = Value::Object(Map::new());
    }
    data.as_object_mut().expect("just ensured object")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn totality_over_junk_inputs() {
        for raw in [
            Value::Null,
            json!(42),
            json!([1, 2, 3]),
            json!({ "unexpected": true }),
            json!(""),
            json!("   "),
            json!("{ not json"),
        ] {
            let rich = to_rich_content(&raw);
            let RichContent::Tiptap { doc, .. } = rich else {
                panic!("junk input should degrade to a tree document");
            };
            assert_eq!(doc.children().len(), 1);
            assert_eq!(doc.children()[0].kind, TreeNode::PARAGRAPH);
        }
    }

    #[test]
    fn legacy_text_splits_into_paragraphs() {
        let doc = coerce_blocks(&json!("Hello\n\nWorld"));
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].text(), "Hello");
        assert_eq!(doc.blocks[1].text(), "World");

        let tree = coerce_tree(&json!("Hello\n\nWorld"));
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[0].children()[0].text.as_deref(), Some("Hello"));
        assert_eq!(tree.children()[1].children()[0].text.as_deref(), Some("World"));
    }

    #[test]
    fn double_encoded_json_unwraps() {
        let inner = json!({ "type": "doc", "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": "hi" }] }
        ] });
        let once = serde_json::to_string(&inner).unwrap();
        let twice = serde_json::to_string(&once).unwrap();
        let rich = to_rich_content(&Value::String(twice));
        assert_eq!(rich.kind(), "tiptap");
        let RichContent::Tiptap { doc, .. } = rich else { unreachable!() };
        assert_eq!(doc.children()[0].children()[0].text.as_deref(), Some("hi"));
    }

    #[test]
    fn blank_image_blocks_are_dropped() {
        let doc = coerce_blocks(&json!({
            "time": 7, "version": "2.0.0",
            "blocks": [
                { "type": "image", "data": { "file": { "url": "" }, "caption": "x" } },
                { "type": "paragraph", "data": { "text": "kept" } },
            ],
        }));
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].text(), "kept");

        let tree = coerce_tree(&json!({ "type": "doc", "content": [
            { "type": "image", "attrs": { "src": "" } },
        ] }));
        // Dropping the only child substitutes the empty paragraph.
        assert_eq!(tree.children().len(), 1);
        assert_eq!(tree.children()[0].kind, TreeNode::PARAGRAPH);
    }

    #[test]
    fn dropping_every_block_leaves_an_empty_paragraph() {
        let doc = coerce_blocks(&json!({ "blocks": [
            { "type": "image", "data": {} },
        ] }));
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind, Block::PARAGRAPH);
        assert_eq!(doc.blocks[0].text(), "");
    }

    #[test]
    fn unknown_kinds_are_preserved() {
        let doc = coerce_blocks(&json!({ "blocks": [
            { "type": "embed", "data": { "service": "maps", "zoom": 9 }, "id": "abc" },
        ] }));
        assert_eq!(doc.blocks[0].kind, "embed");
        assert_eq!(doc.blocks[0].data["zoom"], 9);
        assert_eq!(doc.blocks[0].extra["id"], "abc");

        let tree = coerce_tree(&json!({ "type": "doc", "content": [
            { "type": "callout", "tone": "info", "content": [
                { "type": "text", "text": "note" },
            ] },
        ] }));
        assert_eq!(tree.children()[0].kind, "callout");
        assert_eq!(tree.children()[0].extra["tone"], "info");
        assert_eq!(tree.children()[0].children()[0].text.as_deref(), Some("note"));
    }

    #[test]
    fn coercion_is_idempotent() {
        let inputs = [
            json!("Hello\n\nWorld"),
            json!({ "blocks": [
                { "type": "header", "data": { "text": "T", "level": 9 } },
                { "type": "image", "data": { "file": { "url": "https://a/b.png" } } },
            ] }),
            json!({ "type": "doc", "content": [
                { "type": "heading", "content": [{ "type": "text", "text": "T" }] },
            ] }),
            json!(null),
        ];
        for raw in inputs {
            let once = to_rich_content(&raw);
            let twice = to_rich_content(&serde_json::to_value(&once).unwrap());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn wrapper_tag_beats_shape_inference() {
        // An object that is simultaneously a valid wrapper and carries a
        // stray `blocks` array must be read by its tag.
        let raw = json!({
            "kind": "tiptap", "version": 1,
            "doc": { "type": "doc", "content": [] },
            "blocks": [],
        });
        assert_eq!(to_rich_content(&raw).kind(), "tiptap");

        // Tree shape beats block shape.
        let ambiguous = json!({ "type": "doc", "content": [], "blocks": [] });
        assert_eq!(to_rich_content(&ambiguous).kind(), "tiptap");
    }

    #[test]
    fn tree_round_trip_matches_sanitized_input() {
        let doc = json!({ "type": "doc", "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": "hi" }] },
        ] });
        let rich = to_rich_content(&doc);
        assert_eq!(rich.kind(), "tiptap");
        let RichContent::Tiptap { doc: got, .. } = rich else { unreachable!() };
        assert_eq!(got, coerce_tree(&doc));
    }

    #[test]
    fn header_defaults_materialize() {
        let doc = coerce_blocks(&json!({ "blocks": [
            { "type": "header", "data": { "text": "T" } },
        ] }));
        assert_eq!(doc.blocks[0].data["level"], 2);

        let tree = coerce_tree(&json!({ "type": "doc", "content": [
            { "type": "heading", "content": [] },
        ] }));
        assert_eq!(tree.children()[0].heading_level(), 2);
    }
}
