//! Plain-text extraction and the derived read-time estimate.
//!
//! Extraction feeds two consumers: the `"{n} min read"` badge on previews
//! and fallback excerpts when a post has no manual one.

use crate::block::Block;
use crate::rich::RichContent;
use crate::tree::TreeNode;

/// Words per minute assumed by the read-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Flatten a normalized document into plain text.
///
/// Tree documents contribute every leaf text node in document order; block
/// documents contribute the tag-stripped text of paragraph and header blocks.
/// Runs of whitespace collapse to single spaces and the result is trimmed.
pub fn plain_text(content: &RichContent) -> String {
    let mut pieces: Vec<String> = Vec::new();
    match content {
        RichContent::Tiptap { doc, .. } => collect_text(doc, &mut pieces),
        RichContent::EditorJs { doc, .. } => {
            for block in &doc.blocks {
                if block.kind == Block::PARAGRAPH || block.kind == Block::HEADER {
                    let text = strip_tags(block.text());
                    if !text.is_empty() {
                        pieces.push(text);
                    }
                }
            }
        }
    }
    let joined = pieces.join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: &TreeNode, out: &mut Vec<String>) {
    if node.is_text() {
        if let Some(text) = node.text.as_deref()
            && !text.is_empty()
        {
            out.push(text.to_owned());
        }
        return;
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

/// Remove inline markup tags from a string, keeping their text content.
///
/// This is a tag stripper, not a parser: anything between `<` and the next
/// `>` is discarded, and a dangling `<` is kept verbatim.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Estimated reading time for a body of text, e.g. `"2 min read"`.
///
/// Word count divided by 200 words per minute, rounded up, never below one
/// minute.
pub fn read_time(text: &str) -> String {
    let words = text.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// Truncate extracted text for use as a fallback excerpt.
///
/// Cuts at a word boundary at or before `max_chars` and appends an ellipsis
/// when anything was dropped.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut = 0;
    let mut chars = 0;
    for (offset, word) in text.split_whitespace().map(|w| {
        let offset = w.as_ptr() as usize - text.as_ptr() as usize;
        (offset, w)
    }) {
        let end = offset + word.len();
        chars = text[..end].chars().count();
        if chars > max_chars {
            break;
        }
        cut = end;
    }
    if cut == 0 {
        // Single oversized word: hard cut at the character budget.
        let hard: String = text.chars().take(max_chars).collect();
        return format!("{hard}…");
    }
    format!("{}…", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::to_rich_content;
    use serde_json::json;

    #[test]
    fn plain_text_walks_tree_leaves_in_order() {
        let rich = to_rich_content(&json!({ "type": "doc", "content": [
            { "type": "heading", "attrs": { "level": 2 }, "content": [
                { "type": "text", "text": "Title" },
            ] },
            { "type": "paragraph", "content": [
                { "type": "text", "text": "one" },
                { "type": "text", "text": "two" },
            ] },
        ] }));
        assert_eq!(plain_text(&rich), "Title one two");
    }

    #[test]
    fn plain_text_strips_block_markup() {
        let rich = to_rich_content(&json!({ "blocks": [
            { "type": "paragraph", "data": { "text": "Open <b>house</b>  this\u{a0}week" } },
            { "type": "image", "data": { "file": { "url": "https://a/b.png" } } },
            { "type": "header", "data": { "text": "Details", "level": 3 } },
        ] }));
        // U+00A0 is Unicode whitespace, so collapsing normalizes it too.
        assert_eq!(plain_text(&rich), "Open house this week Details");
    }

    #[test]
    fn read_time_rounds_up_with_floor_of_one() {
        let words_400 = vec!["word"; 400].join(" ");
        assert_eq!(read_time(&words_400), "2 min read");
        assert_eq!(read_time("word"), "1 min read");
        assert_eq!(read_time(""), "1 min read");
        let words_201 = vec!["word"; 201].join(" ");
        assert_eq!(read_time(&words_201), "2 min read");
    }

    #[test]
    fn strip_tags_keeps_dangling_bracket() {
        assert_eq!(strip_tags("a <b>bold</b> move"), "a bold move");
        assert_eq!(strip_tags("5 < 6"), "5 < 6");
    }

    #[test]
    fn excerpt_cuts_on_word_boundaries() {
        assert_eq!(excerpt("short text", 80), "short text");
        assert_eq!(excerpt("alpha beta gamma", 10), "alpha beta…");
        assert_eq!(excerpt("abcdefghij", 4), "abcd…");
    }
}
