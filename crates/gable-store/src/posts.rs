//! Posts table access.
//!
//! Rows come back in whatever shape the database has accumulated over the
//! years; mapping into [`Post`] fills every gap with the site's historical
//! defaults so callers never deal with missing fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gable_common::{DEFAULT_POST_IMAGE, slugify};
use gable_content::{RichContent, excerpt, plain_text, read_time, to_rich_content};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{Supabase, expect_success, parse_content_range};
use crate::error::StoreError;

const PREVIEW_SELECT: &str = "id,title,slug,excerpt,type,image,read_time,created_at,categories(name)";
const FULL_SELECT: &str = "*,categories(name)";

/// A post as the rest of the system sees it: every field present, content
/// already normalized.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Only populated by [`Supabase::post_by_id`]; previews skip the column.
    pub content: Option<RichContent>,
    pub category: String,
    pub kind: String,
    pub image: String,
    pub date: String,
    pub read_time: String,
}

/// Fields for a new post. Slug, read time, and a missing excerpt are
/// derived from the title and content at insert time.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: RichContent,
    pub category_id: Option<String>,
    pub kind: String,
    pub image: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<RichContent>,
    pub category_id: Option<String>,
    pub kind: Option<String>,
    pub image: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PostRow {
    #[serde(deserialize_with = "de_id")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    read_time: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    categories: Option<CategoryRef>,
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CategoryRef {
    name: String,
}

/// Ids are uuids today but were integers in an earlier schema.
pub(crate) fn de_id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {other}"
        ))),
    }
}

impl PostRow {
    fn into_post(self, with_content: bool) -> Post {
        let content = if with_content {
            self.content.as_ref().map(to_rich_content)
        } else {
            None
        };
        let title = self.title.unwrap_or_default();
        let excerpt = self
            .excerpt
            .filter(|e| !e.trim().is_empty())
            .or_else(|| Some(title.clone()).filter(|t| !t.is_empty()))
            .or_else(|| content.as_ref().map(|c| excerpt(&plain_text(c), 160)))
            .unwrap_or_default();
        Post {
            id: self.id,
            title,
            slug: self.slug.unwrap_or_default(),
            excerpt,
            content,
            category: self
                .categories
                .map(|c| c.name)
                .unwrap_or_else(|| "Uncategorized".to_string()),
            kind: self.kind.unwrap_or_else(|| "article".to_string()),
            image: self
                .image
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_POST_IMAGE.to_string()),
            date: self
                .created_at
                .as_deref()
                .map(display_date)
                .unwrap_or_default(),
            read_time: self
                .read_time
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "5 min read".to_string()),
        }
    }
}

/// `2024-03-08T12:00:00Z` -> `Mar 8, 2024`. Unparseable timestamps pass
/// through untouched rather than erroring a whole listing.
fn display_date(raw: &str) -> String {
    let date: Option<NaiveDate> = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

fn derived_read_time(kind: &str, plain: &str) -> String {
    if kind == "video" {
        "5 min watch".to_string()
    } else {
        read_time(plain)
    }
}

impl Supabase {
    /// Published posts, newest first, without their content column.
    ///
    /// Returns the page plus the total number of published posts, taken
    /// from the `content-range` header PostgREST sends back when asked
    /// for an exact count.
    pub async fn post_previews(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Post>, usize), StoreError> {
        let mut url = self.rest("posts");
        url.query_pairs_mut()
            .append_pair("select", PREVIEW_SELECT)
            .append_pair("published", "eq.true")
            .append_pair("order", "created_at.desc")
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());

        let resp = self
            .request(Method::GET, url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(StoreError::http("post listing"))?;
        let resp = expect_success(resp, "post listing").await?;

        let total = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        let rows: Vec<PostRow> = resp
            .json()
            .await
            .map_err(StoreError::http("post listing"))?;
        debug!(page = rows.len(), total, "fetched post previews");

        let count = total.unwrap_or(rows.len());
        Ok((rows.into_iter().map(|r| r.into_post(false)).collect(), count))
    }

    /// Number of published posts, via a HEAD request with an exact count.
    pub async fn post_count(&self) -> Result<usize, StoreError> {
        let mut url = self.rest("posts");
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("published", "eq.true");

        let resp = self
            .request(Method::HEAD, url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(StoreError::http("post count"))?;
        let resp = expect_success(resp, "post count").await?;

        Ok(resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .unwrap_or(0))
    }

    /// One published post with its content normalized, or `None` when the
    /// id matches nothing. PostgREST signals the empty case with a 406
    /// under the single-object `Accept` header.
    pub async fn post_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let mut url = self.rest("posts");
        url.query_pairs_mut()
            .append_pair("select", FULL_SELECT)
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("published", "eq.true");

        let resp = self
            .request(Method::GET, url)
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(StoreError::http("post fetch"))?;
        if resp.status() == StatusCode::NOT_ACCEPTABLE {
            return Ok(None);
        }
        let resp = expect_success(resp, "post fetch").await?;

        let row: PostRow = resp.json().await.map_err(StoreError::http("post fetch"))?;
        Ok(Some(row.into_post(true)))
    }

    /// Insert a published post and return it as stored.
    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post, StoreError> {
        let plain = plain_text(&draft.content);
        let body = json!({
            "title": draft.title,
            "slug": slugify(&draft.title),
            "excerpt": draft
                .excerpt
                .as_deref()
                .filter(|e| !e.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| excerpt(&plain, 160)),
            "content": encode_content(&draft.content)?,
            "category_id": draft.category_id,
            "type": draft.kind,
            "image": draft.image,
            "read_time": derived_read_time(&draft.kind, &plain),
            "published": true,
        });

        let resp = self
            .request(Method::POST, self.rest("posts"))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(StoreError::http("post insert"))?;
        let resp = expect_success(resp, "post insert").await?;

        let mut rows: Vec<PostRow> =
            resp.json().await.map_err(StoreError::http("post insert"))?;
        rows.pop()
            .map(|r| r.into_post(true))
            .ok_or_else(|| StoreError::Backend {
                context: "post insert",
                status: StatusCode::OK,
                body: "insert returned no representation".to_string(),
            })
    }

    /// Apply the set fields of `patch` to one post and return the result.
    /// A new title re-derives the slug; new content re-derives the read time.
    pub async fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post, StoreError> {
        let mut body = serde_json::Map::new();
        if let Some(title) = &patch.title {
            body.insert("title".into(), json!(title));
            body.insert("slug".into(), json!(slugify(title)));
        }
        if let Some(excerpt) = &patch.excerpt {
            body.insert("excerpt".into(), json!(excerpt));
        }
        if let Some(content) = &patch.content {
            body.insert("content".into(), json!(encode_content(content)?));
            let kind = patch.kind.as_deref().unwrap_or("article");
            body.insert(
                "read_time".into(),
                json!(derived_read_time(kind, &plain_text(content))),
            );
        }
        if let Some(category_id) = &patch.category_id {
            body.insert("category_id".into(), json!(category_id));
        }
        if let Some(kind) = &patch.kind {
            body.insert("type".into(), json!(kind));
        }
        if let Some(image) = &patch.image {
            body.insert("image".into(), json!(image));
        }
        if let Some(published) = patch.published {
            body.insert("published".into(), json!(published));
        }

        let mut url = self.rest("posts");
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));

        let resp = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(StoreError::http("post update"))?;
        let resp = expect_success(resp, "post update").await?;

        let mut rows: Vec<PostRow> =
            resp.json().await.map_err(StoreError::http("post update"))?;
        rows.pop()
            .map(|r| r.into_post(true))
            .ok_or_else(|| StoreError::Backend {
                context: "post update",
                status: StatusCode::OK,
                body: "update matched no post".to_string(),
            })
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        let mut url = self.rest("posts");
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));

        let resp = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(StoreError::http("post delete"))?;
        expect_success(resp, "post delete").await?;
        Ok(())
    }
}

/// The content column is text holding serialized rich content; readers
/// re-normalize on the way out, so the exact encoding only has to be
/// something [`to_rich_content`] accepts.
fn encode_content(content: &RichContent) -> Result<String, StoreError> {
    serde_json::to_string(content).map_err(StoreError::encode("post content"))
}
