//! Document model and normalization pipeline for stored post content.
//!
//! Post bodies live in a single untyped JSON/text column that has accumulated
//! several shapes over the product's lifetime: a tagged [`RichContent`]
//! wrapper, a bare tree document, a bare block-sequence document, any of
//! those JSON-encoded once or twice, or legacy plain text. Everything that
//! reads that column goes through [`coerce::to_rich_content`], which is total
//! and never fails — malformed history degrades to an empty paragraph rather
//! than breaking a page.
//!
//! The tree ("tiptap") family is the canonical authoring format; the block
//! ("editorjs") family is kept as a read path for legacy rows.

pub mod block;
pub mod coerce;
pub mod rich;
pub mod text;
pub mod tree;

pub use block::{Block, BlockDocument};
pub use coerce::{coerce_blocks, coerce_tree, parse_loose, to_rich_content};
pub use rich::RichContent;
pub use text::{excerpt, plain_text, read_time, strip_tags};
pub use tree::{Mark, TreeNode};

/// Current epoch milliseconds, for block-document timestamps.
pub(crate) fn now_millis() -> i64 {
    use web_time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
