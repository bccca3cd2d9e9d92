use gable_common::GableConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::error::StoreError;

/// HTTP client for one Supabase project.
///
/// Cheap to clone; the inner [`reqwest::Client`] is already an `Arc`.
#[derive(Debug, Clone)]
pub struct Supabase {
    pub(crate) config: GableConfig,
    pub(crate) http: reqwest::Client,
}

impl Supabase {
    pub fn new(config: GableConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &GableConfig {
        &self.config
    }

    /// URL of a PostgREST table endpoint.
    pub(crate) fn rest(&self, table: &str) -> Url {
        let mut url = self.config.supabase_url.clone();
        // Url::join would eat the project path on hosts that carry one.
        url.set_path(&format!("/rest/v1/{table}"));
        url
    }

    /// URL under the storage API, e.g. `object/{bucket}/{path}`.
    pub(crate) fn storage(&self, tail: &str) -> Url {
        let mut url = self.config.supabase_url.clone();
        url.set_path(&format!("/storage/v1/{tail}"));
        url
    }

    /// Auth headers every Supabase request carries.
    pub(crate) fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.config.anon_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.config.anon_key)) {
            headers.insert(reqwest::header::AUTHORIZATION, bearer);
        }
        headers
    }

    pub(crate) fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http.request(method, url).headers(self.auth_headers())
    }
}

/// Pass a response through, turning non-2xx statuses into [`StoreError::Backend`].
pub(crate) async fn expect_success(
    resp: reqwest::Response,
    context: &'static str,
) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Backend {
        context,
        status,
        body,
    })
}

/// Total row count from a PostgREST `content-range` header, e.g. `0-9/42`.
pub(crate) fn parse_content_range(raw: &str) -> Option<usize> {
    let (_, total) = raw.rsplit_once('/')?;
    total.parse().ok()
}
