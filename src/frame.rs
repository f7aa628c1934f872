//! Extracted still frames and their display handles.
//!
//! A [`Frame`] owns the encoded still image captured at one timestamp of a
//! run. Rendering goes through a [`DisplayHandle`], a process-local
//! reference to the frame's bytes issued by a [`DisplayHandles`] registry.
//!
//! Handles are not `Clone`: releasing one consumes it, so a handle can be
//! released at most once. A handle that has been released no longer
//! resolves.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use stillpick::DisplayHandles;
//!
//! let handles = DisplayHandles::new();
//! let handle = handles.issue(Arc::from(vec![0xFF, 0xD8, 0xFF]));
//! assert!(handles.resolve(&handle).is_some());
//! assert_eq!(handles.live_count(), 1);
//!
//! handles.release(handle).unwrap();
//! assert_eq!(handles.live_count(), 0);
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::StillpickError;

/// Identity of a frame within a run.
///
/// Derived from the frame's source timestamp in microseconds. Timestamps
/// strictly increase within a run, so ids never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl FrameId {
    /// Derive the id for a frame sampled at `timestamp`.
    pub fn from_timestamp(timestamp: Duration) -> Self {
        Self(timestamp.as_micros() as u64)
    }

    /// The source timestamp in microseconds.
    pub fn as_micros(self) -> u64 {
        self.0
    }
}

impl Display for FrameId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "frame-{}", self.0)
    }
}

/// A revocable reference used to render a frame's raster.
///
/// Issued by [`DisplayHandles::issue`] and released by
/// [`DisplayHandles::release`], which takes the handle by value.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DisplayHandle {
    registry: u64,
    key: u64,
}

impl DisplayHandle {
    /// A process-local URL naming this handle.
    pub fn url(&self) -> String {
        format!("stillpick://{}/frame/{}", self.registry, self.key)
    }
}

impl Display for DisplayHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.url())
    }
}

#[derive(Debug, Default)]
struct HandleTable {
    next_key: u64,
    live: HashMap<u64, Arc<[u8]>>,
    released: u64,
}

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// Registry of live display handles.
///
/// Cloning the registry shares the same table, so the sampler, the run and
/// the session can all see one set of handles. Every registry created with
/// [`new`](DisplayHandles::new) has a process-unique id, and only handles
/// carrying that id are honoured.
#[derive(Debug, Clone)]
pub struct DisplayHandles {
    id: u64,
    table: Arc<Mutex<HandleTable>>,
}

impl Default for DisplayHandles {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayHandles {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            table: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HandleTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a fresh handle referencing `raster`.
    ///
    /// The bytes are shared, not copied.
    pub fn issue(&self, raster: Arc<[u8]>) -> DisplayHandle {
        let mut table = self.lock();
        let key = table.next_key;
        table.next_key += 1;
        table.live.insert(key, raster);
        DisplayHandle {
            registry: self.id,
            key,
        }
    }

    /// Look up the bytes behind a live handle.
    ///
    /// Returns `None` once the handle has been released, or for a handle
    /// issued by another registry.
    pub fn resolve(&self, handle: &DisplayHandle) -> Option<Arc<[u8]>> {
        if handle.registry != self.id {
            return None;
        }
        self.lock().live.get(&handle.key).cloned()
    }

    /// Release a handle.
    ///
    /// # Errors
    ///
    /// Returns [`StillpickError::HandleNotLive`] if the handle was issued by
    /// a different registry. Handles of this registry are left untouched.
    pub fn release(&self, handle: DisplayHandle) -> Result<(), StillpickError> {
        if handle.registry != self.id {
            return Err(StillpickError::HandleNotLive(handle.url()));
        }
        let mut table = self.lock();
        if table.live.remove(&handle.key).is_none() {
            return Err(StillpickError::HandleNotLive(handle.url()));
        }
        table.released += 1;
        Ok(())
    }

    /// Number of handles currently live.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Number of handles released over the registry's lifetime.
    pub fn released_count(&self) -> u64 {
        self.lock().released
    }
}

/// One extracted still image plus its metadata and selection state.
#[derive(Debug)]
pub struct Frame {
    id: FrameId,
    timestamp: Duration,
    raster: Arc<[u8]>,
    display: DisplayHandle,
    pub(crate) selected: bool,
}

impl Frame {
    pub(crate) fn new(
        timestamp: Duration,
        raster: Arc<[u8]>,
        display: DisplayHandle,
        selected: bool,
    ) -> Self {
        Self {
            id: FrameId::from_timestamp(timestamp),
            timestamp,
            raster,
            display,
            selected,
        }
    }

    /// The frame's identity.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Offset into the video at which this frame was sampled.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// The encoded still image (JPEG).
    pub fn raster(&self) -> &[u8] {
        &self.raster
    }

    /// The handle used to render this frame.
    pub fn display_handle(&self) -> &DisplayHandle {
        &self.display
    }

    /// Whether the frame is part of the export selection.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Human-readable timestamp, e.g. `1:05.25`.
    pub fn label(&self) -> String {
        format_timestamp(self.timestamp)
    }

    /// Give up the frame, returning the handle that must be released.
    pub(crate) fn into_display_handle(self) -> DisplayHandle {
        self.display
    }
}

/// Format a timestamp as `m:ss.cc`.
pub fn format_timestamp(timestamp: Duration) -> String {
    let centis = timestamp.as_millis() / 10;
    let minutes = centis / 6000;
    let seconds = (centis / 100) % 60;
    let fraction = centis % 100;
    format!("{minutes}:{seconds:02}.{fraction:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_id_uses_microseconds() {
        let id = FrameId::from_timestamp(Duration::from_millis(1_500));
        assert_eq!(id.as_micros(), 1_500_000);
        assert_eq!(id.to_string(), "frame-1500000");
    }

    #[test]
    fn timestamp_labels() {
        assert_eq!(format_timestamp(Duration::ZERO), "0:00.00");
        assert_eq!(format_timestamp(Duration::from_millis(65_250)), "1:05.25");
        assert_eq!(format_timestamp(Duration::from_millis(100)), "0:00.10");
    }

    #[test]
    fn released_handle_no_longer_resolves() {
        let handles = DisplayHandles::new();
        let handle = handles.issue(Arc::from(vec![1, 2, 3]));
        let stale = DisplayHandle {
            registry: handle.registry,
            key: handle.key,
        };

        handles.release(handle).unwrap();
        assert!(handles.resolve(&stale).is_none());
        assert_eq!(handles.released_count(), 1);
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let ours = DisplayHandles::new();
        let theirs = DisplayHandles::new();
        let mine = ours.issue(Arc::from(vec![1]));
        let foreign = theirs.issue(Arc::from(vec![2]));
        assert_eq!(mine.key, foreign.key);

        assert!(ours.resolve(&foreign).is_none());
        assert!(matches!(
            ours.release(foreign),
            Err(StillpickError::HandleNotLive(_))
        ));

        assert_eq!(ours.resolve(&mine).as_deref(), Some(&[1][..]));
        assert_eq!(ours.live_count(), 1);
        assert_eq!(ours.released_count(), 0);
        assert_eq!(theirs.live_count(), 1);
    }

    #[test]
    fn clones_share_one_registry() {
        let handles = DisplayHandles::new();
        let shared = handles.clone();
        let handle = handles.issue(Arc::from(vec![7]));

        assert!(shared.resolve(&handle).is_some());
        shared.release(handle).unwrap();
        assert_eq!(handles.live_count(), 0);
    }
}
