//! Bridge between a stateful third-party editing surface and debounced,
//! upload-aware persistence.
//!
//! The editing surface is an opaque resource: created once, driven through a
//! narrow command interface, disposed on close. This crate owns the policy
//! around it — coalescing change events into debounced saves, suppressing
//! saves while image uploads are in flight, and firing exactly one catch-up
//! save when the last upload resolves.

mod adapter;
mod surface;

pub use adapter::EditorAdapter;
pub use surface::{EditorSurface, ImageStore, SurfaceError};

use std::time::Duration;

/// Quiet period between the last change event and the save it triggers.
pub const DEBOUNCE: Duration = Duration::from_millis(350);
