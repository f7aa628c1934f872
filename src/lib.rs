//! # stillpick
//!
//! Pick still frames out of a video: sample it at evenly spaced timestamps,
//! let a user keep or drop individual stills, and package the keepers into
//! a zip archive.
//!
//! The sampler drives an abstract [`DecodeSource`] through a bounded number
//! of seek-and-capture steps. Decoders that stall, report bad durations or
//! signal readiness too early cannot hang a run: every wait has a timeout,
//! and the step count has a hard ceiling.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stillpick::{DecodeSource, SamplingOptions, Session, StillpickError};
//!
//! # async fn example(source: impl DecodeSource) -> Result<(), StillpickError> {
//! let mut session = Session::new(SamplingOptions::new().with_target_count(24));
//! let run = session.load(source).await?;
//! println!("{} frames, interval {:?}", run.len(), run.interval());
//!
//! // Drop the first frame, deselect the second, export the rest.
//! let ids: Vec<_> = session.run().frames().iter().map(|frame| frame.id()).collect();
//! session.remove(ids[0]);
//! session.run_mut().toggle(ids[1]);
//! std::fs::write("frames.zip", session.export()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! - [`planner`]: interval and start offset from duration, rate and budgets
//! - [`sampler`]: the time-budgeted sampling engine
//! - [`frame`]: frames and their revocable display handles
//! - [`selection`]: toggle, select-all, delete-with-successor, discard
//! - [`export`]: zip packaging with zero-padded, sortable entry names
//! - [`session`]: one run at a time, discard before reload
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | [`FfmpegSource`], a decode source for media files via FFmpeg |

pub mod configuration;
pub mod error;
pub mod export;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod frame;
pub mod planner;
pub mod progress;
pub mod raster;
pub mod run;
pub mod sampler;
pub mod selection;
pub mod session;
pub mod source;

pub use configuration::SamplingOptions;
pub use error::StillpickError;
pub use export::{ExportOptions, export, export_to_file};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegLogLevel, FfmpegSource, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{DisplayHandle, DisplayHandles, Frame, FrameId};
pub use planner::{Planner, SamplingPlan, plan};
pub use progress::{ProgressCallback, ProgressInfo};
pub use raster::RasterTarget;
pub use run::{RunPhase, RunStatus, SamplingRun};
pub use sampler::Sampler;
pub use selection::Removal;
pub use session::Session;
pub use source::{DecodeSource, SourceMetadata};
