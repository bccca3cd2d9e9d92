//! HTML writers for both document families.

use gable_content::block::Block;
use gable_content::rich::RichContent;
use gable_content::tree::{Mark, TreeNode};
use pulldown_cmark_escape::{StrWrite, escape_href, escape_html, escape_html_body_text};

use crate::inline::write_inline;
use crate::safe_href;

/// Render a normalized document to an HTML fragment.
pub fn render(content: &RichContent) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = HtmlWriter::new(&mut out).run(content);
    out
}

struct HtmlWriter<W> {
    writer: W,
}

impl<W: StrWrite> HtmlWriter<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }

    fn run(mut self, content: &RichContent) -> Result<(), W::Error> {
        match content {
            RichContent::Tiptap { doc, .. } => self.tree_children(doc),
            RichContent::EditorJs { doc, .. } => {
                for block in &doc.blocks {
                    self.block(block)?;
                }
                Ok(())
            }
        }
    }

    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    // === Tree family ===

    fn tree_children(&mut self, node: &TreeNode) -> Result<(), W::Error> {
        for child in node.children() {
            self.tree_node(child)?;
        }
        Ok(())
    }

    fn tree_node(&mut self, node: &TreeNode) -> Result<(), W::Error> {
        match node.kind.as_str() {
            TreeNode::TEXT => self.text_leaf(node),
            TreeNode::PARAGRAPH => self.wrapped("<p>", node, "</p>\n"),
            TreeNode::HEADING => {
                let level = node.heading_level();
                self.write(match level {
                    1 => "<h1>",
                    3 => "<h3>",
                    _ => "<h2>",
                })?;
                self.tree_children(node)?;
                self.write(match level {
                    1 => "</h1>\n",
                    3 => "</h3>\n",
                    _ => "</h2>\n",
                })
            }
            TreeNode::BULLET_LIST => self.wrapped("<ul>\n", node, "</ul>\n"),
            TreeNode::ORDERED_LIST => self.wrapped("<ol>\n", node, "</ol>\n"),
            TreeNode::LIST_ITEM => self.wrapped("<li>", node, "</li>\n"),
            TreeNode::BLOCKQUOTE => self.wrapped("<blockquote>\n", node, "</blockquote>\n"),
            TreeNode::HARD_BREAK => self.write("<br>"),
            TreeNode::IMAGE => {
                // Coercion already dropped sourceless images; re-check anyway.
                let Some(src) = node.image_src() else {
                    return Ok(());
                };
                let alt = node
                    .attr_str("alt")
                    .filter(|a| !a.is_empty())
                    .or_else(|| node.attr_str("title"))
                    .unwrap_or_default();
                let title = node.attr_str("title").unwrap_or_default();
                self.figure(src, alt, title)
            }
            // Unknown node kinds pass their children through so nested
            // inline content from future types is not lost.
            _ => self.tree_children(node),
        }
    }

    fn wrapped(&mut self, open: &str, node: &TreeNode, close: &str) -> Result<(), W::Error> {
        self.write(open)?;
        self.tree_children(node)?;
        self.write(close)
    }

    fn text_leaf(&mut self, node: &TreeNode) -> Result<(), W::Error> {
        let text = node.text.as_deref().unwrap_or_default();
        let marks: Vec<(String, &'static str)> = node
            .marks
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(mark_tags)
            .collect();
        // Marks wrap outward in order, so the first mark is innermost:
        // opens are emitted in reverse, closes in mark order.
        for (open, _) in marks.iter().rev() {
            self.write(open)?;
        }
        escape_html_body_text(&mut self.writer, text)?;
        for (_, close) in &marks {
            self.write(close)?;
        }
        Ok(())
    }

    // === Block family ===

    fn block(&mut self, block: &Block) -> Result<(), W::Error> {
        match block.kind.as_str() {
            Block::PARAGRAPH => {
                self.write("<p>")?;
                write_inline(&mut self.writer, block.text())?;
                self.write("</p>\n")
            }
            Block::HEADER => {
                let level = block.header_level();
                self.write(match level {
                    3 => "<h3>",
                    4 => "<h4>",
                    _ => "<h2>",
                })?;
                write_inline(&mut self.writer, block.text())?;
                self.write(match level {
                    3 => "</h3>\n",
                    4 => "</h4>\n",
                    _ => "</h2>\n",
                })
            }
            Block::IMAGE => match block.image_url() {
                Some(url) => self.figure(url, block.image_caption(), block.image_caption()),
                None => Ok(()),
            },
            // Unknown block kinds render nothing.
            _ => Ok(()),
        }
    }

    // === Shared ===

    fn figure(&mut self, src: &str, alt: &str, caption: &str) -> Result<(), W::Error> {
        self.write("<figure><img src=\"")?;
        escape_href(&mut self.writer, src)?;
        self.write("\" alt=\"")?;
        escape_html(&mut self.writer, alt)?;
        self.write("\" loading=\"lazy\">")?;
        if !caption.is_empty() {
            self.write("<figcaption>")?;
            escape_html_body_text(&mut self.writer, caption)?;
            self.write("</figcaption>")?;
        }
        self.write("</figure>\n")
    }
}

/// Open/close tag pair for an inline mark; `None` for unrecognized marks.
fn mark_tags(mark: &Mark) -> Option<(String, &'static str)> {
    match mark.kind.as_str() {
        Mark::BOLD => Some(("<strong>".into(), "</strong>")),
        Mark::ITALIC => Some(("<em>".into(), "</em>")),
        Mark::UNDERLINE => Some(("<u>".into(), "</u>")),
        Mark::CODE => Some(("<code>".into(), "</code>")),
        Mark::LINK => {
            let mut href = String::new();
            // Writing into a String cannot fail.
            let _ = escape_href(&mut href, safe_href(mark.href()));
            Some((
                format!("<a href=\"{href}\" target=\"_blank\" rel=\"noopener noreferrer\">"),
                "</a>",
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::render;
    use gable_content::coerce::to_rich_content;
    use serde_json::json;

    fn render_raw(raw: serde_json::Value) -> String {
        render(&to_rich_content(&raw))
    }

    #[test]
    fn tree_paragraph_with_marks() {
        let html = render_raw(json!({ "type": "doc", "content": [
            { "type": "paragraph", "content": [
                { "type": "text", "text": "plain " },
                { "type": "text", "text": "bold link", "marks": [
                    { "type": "bold" },
                    { "type": "link", "attrs": { "href": "https://example.com" } },
                ] },
            ] },
        ] }));
        insta::assert_snapshot!(html.trim_end(), @r###"<p>plain <a href="https://example.com" target="_blank" rel="noopener noreferrer"><strong>bold link</strong></a></p>"###);
    }

    #[test]
    fn javascript_href_is_stripped() {
        let html = render_raw(json!({ "type": "doc", "content": [
            { "type": "paragraph", "content": [
                { "type": "text", "text": "x", "marks": [
                    { "type": "link", "attrs": { "href": "javascript:alert(1)" } },
                ] },
            ] },
        ] }));
        assert!(html.contains("href=\"\""));
        assert!(!html.contains("javascript"));
    }

    #[test]
    fn heading_levels_clamp_to_supported_range() {
        let html = render_raw(json!({ "type": "doc", "content": [
            { "type": "heading", "attrs": { "level": 9 }, "content": [
                { "type": "text", "text": "deep" },
            ] },
            { "type": "heading", "attrs": { "level": 1 }, "content": [
                { "type": "text", "text": "top" },
            ] },
        ] }));
        assert!(html.contains("<h3>deep</h3>"));
        assert!(html.contains("<h1>top</h1>"));
    }

    #[test]
    fn unknown_tree_nodes_pass_children_through() {
        let html = render_raw(json!({ "type": "doc", "content": [
            { "type": "callout", "content": [
                { "type": "text", "text": "still here" },
            ] },
        ] }));
        assert_eq!(html, "still here");
    }

    #[test]
    fn lists_and_quotes_nest() {
        let html = render_raw(json!({ "type": "doc", "content": [
            { "type": "bulletList", "content": [
                { "type": "listItem", "content": [
                    { "type": "paragraph", "content": [{ "type": "text", "text": "a" }] },
                ] },
            ] },
            { "type": "blockquote", "content": [
                { "type": "paragraph", "content": [{ "type": "text", "text": "q" }] },
            ] },
        ] }));
        insta::assert_snapshot!(html, @r###"
        <ul>
        <li><p>a</p>
        </li>
        </ul>
        <blockquote>
        <p>q</p>
        </blockquote>
        "###);
    }

    #[test]
    fn block_document_renders_paragraph_header_image() {
        let html = render_raw(json!({ "blocks": [
            { "type": "paragraph", "data": { "text": "Open <b>house</b>" } },
            { "type": "header", "data": { "text": "Details", "level": 3 } },
            { "type": "image", "data": { "file": { "url": "https://cdn.test/a.png" }, "caption": "yard" } },
            { "type": "embed", "data": { "service": "maps" } },
        ] }));
        insta::assert_snapshot!(html, @r###"
        <p>Open <b>house</b></p>
        <h3>Details</h3>
        <figure><img src="https://cdn.test/a.png" alt="yard" loading="lazy"><figcaption>yard</figcaption></figure>
        "###);
    }

    #[test]
    fn sourceless_images_render_nothing() {
        let html = render_raw(json!({ "blocks": [
            { "type": "image", "data": { "file": { "url": "" } } },
        ] }));
        assert_eq!(html, "<p></p>\n");
    }

    #[test]
    fn deterministic_output() {
        let raw = json!({ "type": "doc", "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": "same" }] },
        ] });
        assert_eq!(render_raw(raw.clone()), render_raw(raw));
    }
}
