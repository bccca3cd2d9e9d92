//! The editor adapter: debounced saves gated by an in-flight upload counter.
//!
//! Scheduling is cooperative: a cancellable timer task per pending save and a
//! plain counter, no locks held across awaits. The ordering guarantee is that
//! a save never fires while an upload is in flight, and the ≥1 → 0 in-flight
//! transition triggers exactly one zero-delay catch-up save.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use gable_content::coerce::to_rich_content;
use gable_content::rich::RichContent;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

use crate::surface::{EditorSurface, ImageStore};
use crate::DEBOUNCE;

type SaveFn = dyn FnMut(RichContent) + Send;
type UploadingFn = dyn FnMut(bool) + Send;

/// Bridges one editing surface to the application's persistence callback.
///
/// Clones share the same underlying session; [`EditorAdapter::close`] ends it
/// for all of them. Callbacks run outside the state lock but must not block.
pub struct EditorAdapter<S: EditorSurface> {
    inner: Arc<Mutex<Inner<S>>>,
}

impl<S: EditorSurface> Clone for EditorAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S> {
    surface: S,
    uploads_in_flight: usize,
    uploading: bool,
    pending_save: Option<JoinHandle<()>>,
    closed: bool,
    self_weak: Weak<Mutex<Inner<S>>>,
    on_save: Arc<Mutex<Box<SaveFn>>>,
    on_uploading: Option<Arc<Mutex<Box<UploadingFn>>>>,
}

impl<S: EditorSurface> EditorAdapter<S> {
    /// Mount the surface with coerced initial content.
    ///
    /// The surface is instantiated exactly once for the lifetime of the
    /// adapter; later content swaps go through [`EditorAdapter::set_content`].
    pub fn new(
        mut surface: S,
        initial: &Value,
        on_save: impl FnMut(RichContent) + Send + 'static,
    ) -> Self {
        let initial = to_rich_content(initial);
        surface.set_content(&initial);
        let inner = Arc::new_cyclic(|weak| {
            Mutex::new(Inner {
                surface,
                uploads_in_flight: 0,
                uploading: false,
                pending_save: None,
                closed: false,
                self_weak: weak.clone(),
                on_save: Arc::new(Mutex::new(Box::new(on_save))),
                on_uploading: None,
            })
        });
        Self { inner }
    }

    /// Register a listener for the uploading flag. Reported on edges only.
    pub fn with_upload_listener(self, listener: impl FnMut(bool) + Send + 'static) -> Self {
        self.lock().on_uploading = Some(Arc::new(Mutex::new(Box::new(listener))));
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<S>> {
        self.inner.lock().expect("editor state lock poisoned")
    }

    /// A content-change event from the surface. Coalesces rapid keystrokes:
    /// each call cancels and reschedules the pending debounced save.
    pub fn notify_change(&self) {
        let mut inner = self.lock();
        schedule_save(&mut inner, DEBOUNCE);
    }

    /// Replace the editor content on an intentional transition, e.g. when an
    /// existing post finishes loading into a previously empty session.
    pub fn set_content(&self, raw: &Value) {
        let content = to_rich_content(raw);
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.surface.set_content(&content);
    }

    /// Upload one inserted image and place the resolved URL in the editor.
    ///
    /// While any upload is in flight, scheduled saves are suppressed so a
    /// transient document state is never persisted. Failures are logged and
    /// routed to the surface's failure channel; the session continues.
    pub async fn upload_image<T: ImageStore>(
        &self,
        store: &T,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) {
        self.begin_upload();
        let path = upload_path(file_name);
        match store.upload(&path, content_type, bytes).await {
            Ok(url) => {
                let mut inner = self.lock();
                if !inner.closed {
                    inner.surface.insert_image(&url, file_name);
                }
            }
            Err(err) => {
                error!(%err, path, "image upload failed");
                let mut inner = self.lock();
                if !inner.closed {
                    inner.surface.report_upload_failure(&err.to_string());
                }
            }
        }
        self.finish_upload();
    }

    /// Number of uploads currently in flight.
    pub fn uploads_in_flight(&self) -> usize {
        self.lock().uploads_in_flight
    }

    /// End the editing session: cancel the pending save, dispose the surface.
    ///
    /// An upload still in flight is allowed to finish or fail on its own; its
    /// result is discarded.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        if let Some(handle) = inner.pending_save.take() {
            handle.abort();
        }
        inner.surface.destroy();
    }

    fn begin_upload(&self) {
        let notify = {
            let mut inner = self.lock();
            inner.uploads_in_flight += 1;
            // Never persist a document that references an unresolved image.
            if let Some(handle) = inner.pending_save.take() {
                handle.abort();
            }
            set_uploading(&mut inner, true)
        };
        emit_uploading(notify, true);
    }

    fn finish_upload(&self) {
        let notify = {
            let mut inner = self.lock();
            inner.uploads_in_flight = inner.uploads_in_flight.saturating_sub(1);
            if inner.uploads_in_flight > 0 {
                None
            } else {
                // Capture the final state including the resolved URL.
                schedule_save(&mut inner, Duration::ZERO);
                set_uploading(&mut inner, false)
            }
        };
        emit_uploading(notify, false);
    }
}

impl<S> Drop for Inner<S> {
    fn drop(&mut self) {
        // Last clone gone: the timer task only holds a weak handle, so the
        // save it would run can no longer happen; stop it outright.
        if let Some(handle) = self.pending_save.take() {
            handle.abort();
        }
    }
}

/// Flip the uploading flag, returning the listener to notify on an edge.
fn set_uploading<S>(inner: &mut Inner<S>, uploading: bool) -> Option<Arc<Mutex<Box<UploadingFn>>>> {
    if inner.uploading == uploading || inner.closed {
        return None;
    }
    inner.uploading = uploading;
    inner.on_uploading.clone()
}

fn emit_uploading(listener: Option<Arc<Mutex<Box<UploadingFn>>>>, uploading: bool) {
    if let Some(listener) = listener {
        (listener.lock().expect("upload listener lock poisoned"))(uploading);
    }
}

fn schedule_save<S: EditorSurface>(inner: &mut Inner<S>, delay: Duration) {
    if inner.closed {
        return;
    }
    if let Some(handle) = inner.pending_save.take() {
        handle.abort();
    }
    let weak = inner.self_weak.clone();
    inner.pending_save = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Some(cell) = weak.upgrade() {
            run_save(&cell);
        }
    }));
}

fn run_save<S: EditorSurface>(cell: &Arc<Mutex<Inner<S>>>) {
    let saved = {
        let mut inner = cell.lock().expect("editor state lock poisoned");
        if inner.closed || inner.uploads_in_flight > 0 {
            return;
        }
        inner.pending_save = None;
        match inner.surface.save() {
            Ok(raw) => Some((inner.on_save.clone(), to_rich_content(&raw))),
            Err(err) => {
                // Rapid changes can make serialization fail transiently; the
                // next debounced attempt is expected to succeed.
                debug!(%err, "dropping transient editor save failure");
                None
            }
        }
    };
    if let Some((on_save, content)) = saved {
        (on_save.lock().expect("save callback lock poisoned"))(content);
    }
}

/// Destination path for an uploaded image: `editor/{millis}-{uuid}.{ext}`.
fn upload_path(file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "png".to_string());
    let millis = {
        use web_time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    };
    format!("editor/{millis}-{}.{ext}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use tokio::time::{Instant, advance, sleep};

    #[derive(Default)]
    struct MockState {
        saves: Vec<Result<Value, SurfaceErrorKind>>,
        images: Vec<String>,
        failures: Vec<String>,
        destroyed: bool,
    }

    #[derive(Clone, Copy)]
    enum SurfaceErrorKind {
        Busy,
    }

    struct MockSurface {
        state: Arc<StdMutex<MockState>>,
        save_results: VecDeque<Result<Value, SurfaceErrorKind>>,
    }

    impl MockSurface {
        fn new() -> (Self, Arc<StdMutex<MockState>>) {
            let state = Arc::new(StdMutex::new(MockState::default()));
            (
                Self {
                    state: state.clone(),
                    save_results: VecDeque::new(),
                },
                state,
            )
        }

        fn failing_once(mut self) -> Self {
            self.save_results.push_back(Err(SurfaceErrorKind::Busy));
            self
        }
    }

    fn sample_doc() -> Value {
        json!({ "type": "doc", "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": "draft" }] },
        ] })
    }

    impl crate::EditorSurface for MockSurface {
        fn save(&mut self) -> Result<Value, crate::SurfaceError> {
            let result = self.save_results.pop_front().unwrap_or(Ok(sample_doc()));
            self.state.lock().unwrap().saves.push(result.clone());
            result.map_err(|SurfaceErrorKind::Busy| {
                crate::SurfaceError::Busy("mid-mutation".into())
            })
        }

        fn set_content(&mut self, _content: &RichContent) {}

        fn insert_image(&mut self, url: &str, _alt: &str) {
            self.state.lock().unwrap().images.push(url.to_string());
        }

        fn report_upload_failure(&mut self, message: &str) {
            self.state.lock().unwrap().failures.push(message.to_string());
        }

        fn destroy(&mut self) {
            self.state.lock().unwrap().destroyed = true;
        }
    }

    struct SlowStore {
        delay: Duration,
        fail: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("storage rejected the upload")]
    struct SlowStoreError;

    impl crate::ImageStore for SlowStore {
        type Error = SlowStoreError;

        async fn upload(
            &self,
            path: &str,
            _content_type: &str,
            _bytes: Vec<u8>,
        ) -> Result<String, Self::Error> {
            sleep(self.delay).await;
            if self.fail {
                Err(SlowStoreError)
            } else {
                Ok(format!("https://cdn.test/{path}"))
            }
        }
    }

    fn collecting_adapter(
        surface: MockSurface,
    ) -> (EditorAdapter<MockSurface>, Arc<StdMutex<Vec<Instant>>>) {
        let times: Arc<StdMutex<Vec<Instant>>> = Arc::default();
        let recorded = times.clone();
        let adapter = EditorAdapter::new(surface, &Value::Null, move |_content| {
            recorded.lock().unwrap().push(Instant::now());
        });
        (adapter, times)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_coalesce_into_one_save() {
        let (surface, _state) = MockSurface::new();
        let (adapter, times) = collecting_adapter(surface);

        adapter.notify_change();
        sleep(Duration::from_millis(200)).await;
        adapter.notify_change();
        sleep(Duration::from_millis(340)).await;
        assert!(times.lock().unwrap().is_empty(), "save fired inside quiet period");

        sleep(Duration::from_millis(20)).await;
        assert_eq!(times.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_uploads_gate_saves_until_last_resolves() {
        let (surface, state) = MockSurface::new();
        let (adapter, times) = collecting_adapter(surface);
        let start = Instant::now();

        adapter.notify_change();

        let first = {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                let store = SlowStore { delay: Duration::from_millis(200), fail: false };
                adapter.upload_image(&store, "a.png", "image/png", vec![1]).await;
            })
        };
        sleep(Duration::from_millis(50)).await;
        let second = {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                let store = SlowStore { delay: Duration::from_millis(250), fail: false };
                adapter.upload_image(&store, "b.png", "image/png", vec![2]).await;
            })
        };

        first.await.unwrap();
        second.await.unwrap();
        // Let the zero-delay catch-up save run.
        advance(Duration::from_millis(1)).await;

        let times = times.lock().unwrap();
        assert_eq!(times.len(), 1, "exactly one catch-up save");
        // Second upload resolves at t = 50 + 250 = 300ms; nothing earlier.
        assert!(times[0] >= start + Duration::from_millis(300));
        assert_eq!(state.lock().unwrap().images.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn upload_failure_is_reported_and_session_continues() {
        let (surface, state) = MockSurface::new();
        let (adapter, times) = collecting_adapter(surface);

        let store = SlowStore { delay: Duration::from_millis(10), fail: true };
        adapter.upload_image(&store, "a.png", "image/png", vec![1]).await;
        advance(Duration::from_millis(1)).await;

        {
            let state = state.lock().unwrap();
            assert_eq!(state.images.len(), 0);
            assert_eq!(state.failures.len(), 1);
        }

        // The failed upload's catch-up save persisted the unchanged document;
        // further edits keep working.
        adapter.notify_change();
        sleep(DEBOUNCE + Duration::from_millis(1)).await;
        assert_eq!(times.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_save_errors_are_swallowed() {
        let (surface, _state) = MockSurface::new();
        let (adapter, times) = collecting_adapter(surface.failing_once());

        adapter.notify_change();
        sleep(DEBOUNCE + Duration::from_millis(1)).await;
        assert!(times.lock().unwrap().is_empty(), "busy save must be dropped");

        adapter.notify_change();
        sleep(DEBOUNCE + Duration::from_millis(1)).await;
        assert_eq!(times.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_save_and_disposes_surface() {
        let (surface, state) = MockSurface::new();
        let (adapter, times) = collecting_adapter(surface);

        adapter.notify_change();
        adapter.close();
        sleep(DEBOUNCE + Duration::from_millis(5)).await;

        assert!(times.lock().unwrap().is_empty());
        assert!(state.lock().unwrap().destroyed);
    }

    #[tokio::test(start_paused = true)]
    async fn uploading_flag_reports_edges_only() {
        let (surface, _state) = MockSurface::new();
        let edges: Arc<StdMutex<Vec<bool>>> = Arc::default();
        let recorded = edges.clone();
        let adapter = EditorAdapter::new(surface, &Value::Null, |_content| {})
            .with_upload_listener(move |uploading| {
                recorded.lock().unwrap().push(uploading);
            });

        let first = {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                let store = SlowStore { delay: Duration::from_millis(100), fail: false };
                adapter.upload_image(&store, "a.png", "image/png", vec![1]).await;
            })
        };
        sleep(Duration::from_millis(10)).await;
        let second = {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                let store = SlowStore { delay: Duration::from_millis(100), fail: false };
                adapter.upload_image(&store, "b.png", "image/png", vec![2]).await;
            })
        };
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(*edges.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn upload_path_shape() {
        let path = upload_path("Front Porch.JPEG");
        assert!(path.starts_with("editor/"));
        assert!(path.ends_with(".jpeg"));

        assert!(upload_path("noext").ends_with(".png"));
    }
}
