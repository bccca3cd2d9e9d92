//! Pure HTML rendering for normalized post content.
//!
//! [`render`] is deterministic and side-effect free: the same document always
//! produces the same markup. Inline formatting is whitelisted, link targets
//! are re-validated even though coercion already sanitized them, and image
//! nodes without a source are skipped.

mod html;
mod inline;

pub use html::render;

/// Validate a link target, returning it only when it is an absolute
/// `http://` or `https://` URL. Anything else (e.g. `javascript:`) collapses
/// to the empty string.
pub fn safe_href(href: &str) -> &str {
    if href.starts_with("http://") || href.starts_with("https://") {
        href
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::safe_href;

    #[test]
    fn safe_href_rejects_non_http_schemes() {
        assert_eq!(safe_href("https://example.com/a"), "https://example.com/a");
        assert_eq!(safe_href("http://example.com"), "http://example.com");
        assert_eq!(safe_href("javascript:alert(1)"), "");
        assert_eq!(safe_href("ftp://example.com"), "");
        assert_eq!(safe_href("/relative/path"), "");
        assert_eq!(safe_href(""), "");
    }
}
