//! Image uploads into Supabase object storage.

use gable_editor::ImageStore;
use reqwest::Method;
use tracing::debug;

use crate::client::{Supabase, expect_success};
use crate::error::StoreError;

impl Supabase {
    /// Upload raw bytes to `path` inside the configured images bucket and
    /// return the stable public URL.
    pub async fn upload_image(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        let bucket = &self.config.images_bucket;
        let url = self.storage(&format!("object/{bucket}/{path}"));
        let size = bytes.len();

        let resp = self
            .request(Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(StoreError::http("image upload"))?;
        expect_success(resp, "image upload").await?;

        let public = self.public_image_url(path);
        debug!(path, size, %public, "uploaded image");
        Ok(public)
    }

    /// Public URL an uploaded object is served from.
    pub fn public_image_url(&self, path: &str) -> String {
        let bucket = &self.config.images_bucket;
        self.storage(&format!("object/public/{bucket}/{path}"))
            .to_string()
    }
}

/// Lets the editor adapter push its uploads straight through this client.
impl ImageStore for Supabase {
    type Error = StoreError;

    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, Self::Error> {
        self.upload_image(path, content_type, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use gable_common::GableConfig;
    use url::Url;

    use super::*;

    #[test]
    fn public_url_shape() {
        let client = Supabase::new(GableConfig {
            supabase_url: Url::parse("https://xyz.supabase.co").unwrap(),
            anon_key: "anon".into(),
            images_bucket: "blog-images".into(),
            contact_endpoint: None,
        });
        assert_eq!(
            client.public_image_url("editor/17-abc.png"),
            "https://xyz.supabase.co/storage/v1/object/public/blog-images/editor/17-abc.png"
        );
    }
}
