//! Seams toward the two external collaborators: the editing surface itself
//! and the object store that image uploads land in.

use std::future::Future;

use gable_content::rich::RichContent;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

/// Failure channel of the editing surface.
///
/// `Busy` covers transient states (serializing mid-mutation during rapid
/// edits); the adapter drops those silently and lets the next debounced
/// attempt succeed.
#[derive(Debug, Error, Diagnostic)]
pub enum SurfaceError {
    #[error("editor is busy: {0}")]
    #[diagnostic(code(gable::editor::busy))]
    Busy(String),

    #[error("editor surface already disposed")]
    #[diagnostic(code(gable::editor::disposed))]
    Disposed,
}

/// The opaque third-party editing surface.
///
/// Implementations wrap whatever the embedding layer provides (a WYSIWYG
/// widget, a webview bridge, a headless buffer in tests). The adapter never
/// models the surface's internals — only this command set.
pub trait EditorSurface: Send + 'static {
    /// Serialize the current editor state to document JSON.
    fn save(&mut self) -> Result<Value, SurfaceError>;

    /// Replace the editor content. Called once at mount and again only on
    /// intentional transitions (e.g. an existing post finished loading).
    fn set_content(&mut self, content: &RichContent);

    /// Insert an image node at the cursor once its upload resolved.
    fn insert_image(&mut self, url: &str, alt: &str);

    /// Route an upload failure into the surface's own error UI.
    fn report_upload_failure(&mut self, message: &str);

    /// Dispose the underlying editor instance.
    fn destroy(&mut self);
}

/// The object-storage collaborator: a binary file plus a destination path in,
/// a stable public URL out.
pub trait ImageStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
