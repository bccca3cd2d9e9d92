//! Environment-driven configuration.
//!
//! Every knob comes from the environment so the CLI and any future service
//! share one loading path. Required vars fail fast with a [`ConfigError`];
//! optional ones carry the defaults the production project has always used.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Default storage bucket for post images.
pub const DEFAULT_IMAGES_BUCKET: &str = "blog-images";

/// Fallback card image for posts without one.
pub const DEFAULT_POST_IMAGE: &str = "/remax_logo.png";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GableConfig {
    /// Base URL of the Supabase project (e.g. `https://xyz.supabase.co`).
    pub supabase_url: Url,
    /// Anonymous API key sent as both `apikey` and bearer token.
    pub anon_key: String,
    /// Storage bucket for uploaded post images.
    pub images_bucket: String,
    /// Optional endpoint that accepts contact-form submissions.
    pub contact_endpoint: Option<Url>,
}

impl GableConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`: project base URL
    /// - `SUPABASE_ANON_KEY`: anonymous API key
    ///
    /// Optional:
    /// - `BLOG_IMAGES_BUCKET`: storage bucket (default `blog-images`)
    /// - `CONTACT_ENDPOINT`: contact-form submission URL
    pub fn from_env() -> Result<Self, ConfigError> {
        let url_str = std::env::var("SUPABASE_URL")
            .map_err(|_| ConfigError::MissingEnv { var: "SUPABASE_URL" })?;
        let supabase_url = Url::parse(&url_str).map_err(|e| ConfigError::UrlParse {
            var: "SUPABASE_URL",
            url: url_str,
            source: e,
        })?;

        let anon_key = std::env::var("SUPABASE_ANON_KEY").map_err(|_| ConfigError::MissingEnv {
            var: "SUPABASE_ANON_KEY",
        })?;

        let images_bucket = std::env::var("BLOG_IMAGES_BUCKET")
            .unwrap_or_else(|_| DEFAULT_IMAGES_BUCKET.to_string());

        let contact_endpoint = match std::env::var("CONTACT_ENDPOINT") {
            Ok(raw) => Some(Url::parse(&raw).map_err(|e| ConfigError::UrlParse {
                var: "CONTACT_ENDPOINT",
                url: raw,
                source: e,
            })?),
            Err(_) => None,
        };

        Ok(Self {
            supabase_url,
            anon_key,
            images_bucket,
            contact_endpoint,
        })
    }
}
