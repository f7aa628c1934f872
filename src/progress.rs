//! Progress reporting for sampling runs.
//!
//! This module provides [`ProgressCallback`] for observing a run and
//! [`ProgressInfo`], the snapshot delivered after every sampling step.
//!
//! Reported percentages never decrease and stay at or below 99 until the
//! run has been finalized; only the final report carries 100.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillpick::{ProgressCallback, ProgressInfo, SamplingOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {}% ({} frames)", info.phase, info.percent, info.frames_captured);
//!     }
//! }
//!
//! let options = SamplingOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::run::RunPhase;

/// Percentage reported until the run is finalized.
pub const MAX_IN_FLIGHT_PERCENT: u8 = 99;

/// A snapshot of sampling progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Phase of the run when the snapshot was taken.
    pub phase: RunPhase,
    /// Completion percentage in `0..=100`. Never decreases within a run.
    pub percent: u8,
    /// Sampling steps attempted so far.
    pub steps_taken: u32,
    /// Upper bound on sampling steps for this run.
    pub step_ceiling: u32,
    /// Frames captured so far (not yet committed to the run).
    pub frames_captured: usize,
    /// Target timestamp of the step that just finished.
    pub current_timestamp: Option<Duration>,
    /// Wall-clock time elapsed since sampling started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during a run.
///
/// Callbacks observe the run but cannot halt it.
pub trait ProgressCallback: Send + Sync {
    /// Called on every phase change and after every sampling step.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Combine time-based and step-based progress into one percentage.
///
/// Taking the larger of the two keeps progress moving even when the
/// reported duration is wrong. The result is capped at
/// [`MAX_IN_FLIGHT_PERCENT`].
pub fn sampling_percent(
    current_time: Duration,
    duration: Duration,
    steps_taken: u32,
    step_ceiling: u32,
) -> u8 {
    let time_progress = if duration.is_zero() {
        0.0
    } else {
        current_time.as_secs_f64() / duration.as_secs_f64() * 100.0
    };
    let step_progress = f64::from(steps_taken) / f64::from(step_ceiling.max(1)) * 100.0;

    let percent = time_progress.max(step_progress);
    if percent.is_nan() {
        return 0;
    }
    percent.clamp(0.0, f64::from(MAX_IN_FLIGHT_PERCENT)) as u8
}

/// Internal helper that keeps the reported percentage monotonic and emits
/// callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    step_ceiling: u32,
    start_time: Instant,
    percent: u8,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, step_ceiling: u32) -> Self {
        Self {
            callback,
            step_ceiling,
            start_time: Instant::now(),
            percent: 0,
        }
    }

    /// Record a finished step and report. Returns the reported percentage.
    pub(crate) fn advance(
        &mut self,
        current_time: Duration,
        duration: Duration,
        steps_taken: u32,
        frames_captured: usize,
        timestamp: Duration,
    ) -> u8 {
        let percent = sampling_percent(current_time, duration, steps_taken, self.step_ceiling);
        self.percent = self.percent.max(percent);
        self.report(RunPhase::Sampling, steps_taken, frames_captured, Some(timestamp));
        self.percent
    }

    /// Report a phase change outside the sampling loop.
    pub(crate) fn phase(&mut self, phase: RunPhase) {
        self.report(phase, 0, 0, None);
    }

    /// Report the finalizing phase without changing the percentage.
    pub(crate) fn finalizing(&mut self, steps_taken: u32, frames_captured: usize) {
        self.report(RunPhase::Finalizing, steps_taken, frames_captured, None);
    }

    /// Report completion at 100%.
    pub(crate) fn finish(&mut self, steps_taken: u32, frames_captured: usize) -> u8 {
        self.percent = 100;
        self.report(RunPhase::Done, steps_taken, frames_captured, None);
        self.percent
    }

    fn report(
        &self,
        phase: RunPhase,
        steps_taken: u32,
        frames_captured: usize,
        current_timestamp: Option<Duration>,
    ) {
        let info = ProgressInfo {
            phase,
            percent: self.percent,
            steps_taken,
            step_ceiling: self.step_ceiling,
            frames_captured,
            current_timestamp,
            elapsed: self.start_time.elapsed(),
        };

        self.callback.on_progress(&info);
    }
}
