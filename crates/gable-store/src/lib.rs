//! Data-access layer for the blog backend.
//!
//! Talks to a Supabase deployment over plain HTTP: PostgREST for the
//! `posts` and `categories` tables, the storage API for editor image
//! uploads, and an optional contact-form endpoint. All rich content read
//! back from the database goes through [`gable_content::to_rich_content`]
//! before it reaches callers, so the rest of the system only ever sees
//! normalized documents.

mod categories;
mod client;
mod contact;
mod error;
mod posts;
mod storage;

pub use categories::Category;
pub use client::Supabase;
pub use contact::ContactMessage;
pub use error::StoreError;
pub use posts::{Post, PostDraft, PostPatch};
