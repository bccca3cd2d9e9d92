//! Categories table access.

use gable_common::slugify;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::{Supabase, expect_success};
use crate::error::StoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "crate::posts::de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Supabase {
    /// All categories, alphabetical.
    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut url = self.rest("categories");
        url.query_pairs_mut()
            .append_pair("select", "id,name,slug")
            .append_pair("order", "name.asc");

        let resp = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(StoreError::http("category listing"))?;
        let resp = expect_success(resp, "category listing").await?;

        let rows: Vec<Category> = resp
            .json()
            .await
            .map_err(StoreError::http("category listing"))?;
        debug!(count = rows.len(), "fetched categories");
        Ok(rows)
    }

    /// Case-insensitive lookup by display name.
    pub async fn category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let rows = self.categories().await?;
        Ok(rows
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, StoreError> {
        let body = json!({ "name": name, "slug": slugify(name) });
        let resp = self
            .request(Method::POST, self.rest("categories"))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(StoreError::http("category insert"))?;
        let resp = expect_success(resp, "category insert").await?;

        let mut rows: Vec<Category> = resp
            .json()
            .await
            .map_err(StoreError::http("category insert"))?;
        rows.pop().ok_or_else(|| StoreError::Backend {
            context: "category insert",
            status: reqwest::StatusCode::OK,
            body: "insert returned no representation".to_string(),
        })
    }

    /// Rename a category, refreshing its slug to match.
    pub async fn rename_category(&self, from: &str, to: &str) -> Result<Category, StoreError> {
        let existing = self
            .category_by_name(from)
            .await?
            .ok_or_else(|| StoreError::UnknownCategory(from.to_string()))?;

        let mut url = self.rest("categories");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", existing.id));

        let body = json!({ "name": to, "slug": slugify(to) });
        let resp = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(StoreError::http("category rename"))?;
        let resp = expect_success(resp, "category rename").await?;

        let mut rows: Vec<Category> = resp
            .json()
            .await
            .map_err(StoreError::http("category rename"))?;
        rows.pop().ok_or_else(|| StoreError::Backend {
            context: "category rename",
            status: reqwest::StatusCode::OK,
            body: "rename matched no category".to_string(),
        })
    }

    /// Delete by name. Posts keep their `category_id` and simply render as
    /// uncategorized afterwards.
    pub async fn delete_category(&self, name: &str) -> Result<(), StoreError> {
        let existing = self
            .category_by_name(name)
            .await?
            .ok_or_else(|| StoreError::UnknownCategory(name.to_string()))?;

        let mut url = self.rest("categories");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", existing.id));

        let resp = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(StoreError::http("category delete"))?;
        expect_success(resp, "category delete").await?;
        Ok(())
    }
}
