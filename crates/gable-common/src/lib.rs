//! Shared infrastructure for the gable workspace: configuration loading,
//! the error taxonomy, and a couple of small helpers used by every layer.

pub mod config;
pub mod error;

pub use config::{DEFAULT_IMAGES_BUCKET, DEFAULT_POST_IMAGE, GableConfig};
pub use error::ConfigError;

/// Derive a URL-safe slug from a title.
///
/// Lowercases and collapses every run of non-alphanumeric characters into a
/// single `-`, matching the slugs already stored alongside historical posts.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Spring 2025 Market Update  "), "spring-2025-market-update");
        assert_eq!(slugify("---"), "");
    }
}
