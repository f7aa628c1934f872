//! The decode source abstraction.
//!
//! A [`DecodeSource`] is anything that can report video metadata, seek to a
//! timestamp and hand over the picture it landed on. The sampler drives it
//! one step at a time and never assumes the source behaves: every wait is
//! bounded by a timeout, and a source that reports a seek as complete before
//! its picture is readable is polled until [`has_current_data`] turns true.
//!
//! [`has_current_data`]: DecodeSource::has_current_data
//!
//! Sources are single-writer resources and are driven from a single task;
//! the futures they return need not be `Send`.

use std::future::Future;
use std::time::Duration;

use crate::error::StillpickError;
use crate::raster::RasterTarget;

/// Metadata reported by a decode source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceMetadata {
    /// Reported duration in seconds.
    ///
    /// May be absent, infinite (live-stream-like sources) or otherwise
    /// unreliable; see [`effective_duration`](crate::planner::effective_duration).
    pub duration_seconds: Option<f64>,
    /// Native picture width in pixels.
    pub width: u32,
    /// Native picture height in pixels.
    pub height: u32,
}

/// A seekable video decoder driven by the sampler.
pub trait DecodeSource {
    /// Load duration and native dimensions.
    ///
    /// The sampler bounds this with the metadata timeout.
    fn load_metadata(&mut self) -> impl Future<Output = Result<SourceMetadata, StillpickError>>;

    /// Seek to `timestamp`, resolving once the source reports the seek as
    /// complete (or failed).
    ///
    /// The sampler bounds this with the per-step timeout. Completion does
    /// not imply the picture is readable yet.
    fn seek(&mut self, timestamp: Duration) -> impl Future<Output = Result<(), StillpickError>>;

    /// Whether pixel data for the current position is available.
    fn has_current_data(&self) -> bool;

    /// Draw the current picture into `target`.
    ///
    /// `target` has the native dimensions reported by
    /// [`load_metadata`](DecodeSource::load_metadata).
    fn read_picture(&mut self, target: &mut RasterTarget) -> Result<(), StillpickError>;

    /// Release decoder resources once sampling has finished.
    fn close(&mut self) {}
}
