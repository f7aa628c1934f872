//! Error types for the `stillpick` crate.
//!
//! This module defines [`StillpickError`], the unified error type returned by
//! all fallible operations in the crate. Variants follow the failure classes
//! of a sampling run: run-fatal conditions (metadata, raster target),
//! per-step conditions that the sampler absorbs, and export conditions that
//! are surfaced to the caller.

use std::{io::Error as IoError, time::Duration};

use thiserror::Error;

/// The unified error type for all `stillpick` operations.
///
/// Every public method that can fail returns `Result<T, StillpickError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillpickError {
    /// The decode source reported an error while loading metadata.
    #[error("Failed to load video metadata: {reason}")]
    MetadataLoad {
        /// Underlying reason reported by the decode source.
        reason: String,
    },

    /// The decode source never reported metadata within the load timeout.
    #[error("Video metadata did not load within {0:?}")]
    MetadataTimeout(Duration),

    /// A raster target could not be created for the source dimensions.
    #[error("Failed to create a {width}x{height} raster target: {reason}")]
    RasterTargetInit {
        /// Requested raster width in pixels.
        width: u32,
        /// Requested raster height in pixels.
        height: u32,
        /// Why the target was rejected.
        reason: String,
    },

    /// A seek did not reach a readable frame within the per-step timeout.
    #[error("Seek did not produce a frame within {0:?}")]
    SeekTimeout(Duration),

    /// The decode source rejected a seek.
    #[error("Seek failed: {0}")]
    SeekFailed(String),

    /// The current picture could not be decoded or read.
    #[error("Failed to decode video frame: {0}")]
    DecodeError(String),

    /// A raster could not be encoded to a still image.
    #[error("Failed to encode still image: {0}")]
    EncodeError(String),

    /// Export was requested while no frame is selected.
    #[error("No frames are selected for export")]
    NothingSelected,

    /// The archive writer failed; no partial archive is produced.
    #[error("Failed to build archive: {0}")]
    ArchiveBuild(String),

    /// Every frame of the run has been deleted.
    #[error("No frames remain in this run")]
    RunExhausted,

    /// The sampler was handed a run that has already been used.
    #[error("Sampling run is not fresh (status: {0})")]
    RunNotFresh(String),

    /// A display handle was released that the registry does not know.
    #[error("Display handle {0} is not live")]
    HandleNotLive(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl StillpickError {
    /// Returns `true` for conditions that end a sampling run before or
    /// instead of producing frames.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            StillpickError::MetadataLoad { .. }
                | StillpickError::MetadataTimeout(_)
                | StillpickError::RasterTargetInit { .. }
                | StillpickError::RunNotFresh(_)
        )
    }
}

impl From<zip::result::ZipError> for StillpickError {
    fn from(error: zip::result::ZipError) -> Self {
        StillpickError::ArchiveBuild(error.to_string())
    }
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for StillpickError {
    fn from(error: ffmpeg_next::Error) -> Self {
        StillpickError::FfmpegError(error.to_string())
    }
}
