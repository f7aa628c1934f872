//! Sampling configuration.
//!
//! [`SamplingOptions`] is a builder that threads the sampling rate, frame
//! budgets, timeouts and the progress callback through the sampler without
//! polluting every function signature.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use stillpick::SamplingOptions;
//!
//! let options = SamplingOptions::new()
//!     .with_desired_rate(2.0)
//!     .with_hard_ceiling(120)
//!     .with_step_timeout(Duration::from_secs(1))
//!     .with_default_selected(false);
//! assert_eq!(options.hard_ceiling(), 120);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::planner::{DEFAULT_LEAD_IN, DEFAULT_MIN_SPACING, Planner};
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default number of frames aimed for when no rate is requested.
pub const DEFAULT_TARGET_COUNT: u32 = 30;

/// Default hard limit on frames (and sampling steps) per run.
pub const DEFAULT_HARD_CEILING: u32 = 600;

/// Default bound on waiting for source metadata.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on one seek-and-wait.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(2);

/// Default backoff between checks for readable pixel data.
pub const DEFAULT_DATA_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default number of paint cycles to wait before reading a picture.
pub const DEFAULT_SETTLE_CYCLES: u32 = 2;

/// Default length of one paint cycle.
pub const DEFAULT_SETTLE_CYCLE: Duration = Duration::from_millis(16);

/// Default JPEG quality for stored stills.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Configuration for sampling runs.
///
/// All fields have defaults; a default-constructed value samples roughly
/// 30 frames per video and keeps every new frame selected.
#[derive(Clone)]
#[must_use]
pub struct SamplingOptions {
    pub(crate) desired_rate: Option<f64>,
    pub(crate) target_count: u32,
    pub(crate) hard_ceiling: u32,
    pub(crate) step_ceiling: Option<u32>,
    pub(crate) planner: Planner,
    pub(crate) metadata_timeout: Duration,
    pub(crate) step_timeout: Duration,
    pub(crate) data_poll_interval: Duration,
    pub(crate) settle_cycles: u32,
    pub(crate) settle_cycle: Duration,
    pub(crate) jpeg_quality: u8,
    pub(crate) default_selected: bool,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for SamplingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplingOptions")
            .field("desired_rate", &self.desired_rate)
            .field("target_count", &self.target_count)
            .field("hard_ceiling", &self.hard_ceiling)
            .field("step_ceiling", &self.step_ceiling)
            .field("metadata_timeout", &self.metadata_timeout)
            .field("step_timeout", &self.step_timeout)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("default_selected", &self.default_selected)
            .finish_non_exhaustive()
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplingOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            desired_rate: None,
            target_count: DEFAULT_TARGET_COUNT,
            hard_ceiling: DEFAULT_HARD_CEILING,
            step_ceiling: None,
            planner: Planner {
                min_spacing: DEFAULT_MIN_SPACING,
                lead_in: DEFAULT_LEAD_IN,
            },
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            data_poll_interval: DEFAULT_DATA_POLL_INTERVAL,
            settle_cycles: DEFAULT_SETTLE_CYCLES,
            settle_cycle: DEFAULT_SETTLE_CYCLE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            default_selected: true,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Request a sampling rate in frames per second.
    ///
    /// Non-finite or non-positive rates fall back to target-count planning.
    pub fn with_desired_rate(mut self, frames_per_second: f64) -> Self {
        self.desired_rate = Some(frames_per_second);
        self
    }

    /// Clear any requested rate and plan by target count.
    pub fn without_desired_rate(mut self) -> Self {
        self.desired_rate = None;
        self
    }

    /// Frames to aim for when no rate is requested. Clamped to at least 1.
    pub fn with_target_count(mut self, count: u32) -> Self {
        self.target_count = count.max(1);
        self
    }

    /// Hard limit on frames and sampling steps per run. Clamped to at least 1.
    pub fn with_hard_ceiling(mut self, ceiling: u32) -> Self {
        self.hard_ceiling = ceiling.max(1);
        self
    }

    /// Stop after this many sampling steps even if the video has not been
    /// covered. Clamped to at least 1; the hard ceiling still applies.
    pub fn with_step_ceiling(mut self, steps: u32) -> Self {
        self.step_ceiling = Some(steps.max(1));
        self
    }

    /// Smallest spacing used by target-count planning.
    pub fn with_min_spacing(mut self, spacing: Duration) -> Self {
        self.planner.min_spacing = spacing;
        self
    }

    /// Upper bound for the first target timestamp.
    pub fn with_lead_in(mut self, lead_in: Duration) -> Self {
        self.planner.lead_in = lead_in;
        self
    }

    /// Bound on waiting for source metadata.
    pub fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// Bound on one seek plus the wait for readable pixel data.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Backoff between checks for readable pixel data.
    pub fn with_data_poll_interval(mut self, interval: Duration) -> Self {
        self.data_poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Paint cycles to wait, and the length of one cycle, before a picture
    /// is read.
    pub fn with_settle(mut self, cycles: u32, cycle: Duration) -> Self {
        self.settle_cycles = cycles;
        self.settle_cycle = cycle;
        self
    }

    /// JPEG quality for stored stills, clamped to `1..=100`.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Selection state given to newly sampled frames.
    pub fn with_default_selected(mut self, selected: bool) -> Self {
        self.default_selected = selected;
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Requested sampling rate, if any.
    pub fn desired_rate(&self) -> Option<f64> {
        self.desired_rate
    }

    /// Frames aimed for without a rate.
    pub fn target_count(&self) -> u32 {
        self.target_count
    }

    /// Hard frame and step limit.
    pub fn hard_ceiling(&self) -> u32 {
        self.hard_ceiling
    }

    /// Selection state given to new frames.
    pub fn default_selected(&self) -> bool {
        self.default_selected
    }

    /// Upper bound on sampling steps per run.
    ///
    /// Defaults to the hard ceiling and never exceeds it.
    pub fn step_ceiling(&self) -> u32 {
        self.step_ceiling
            .map_or(self.hard_ceiling, |steps| steps.min(self.hard_ceiling))
    }
}
