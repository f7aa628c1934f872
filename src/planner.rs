//! Sampling interval planning.
//!
//! Maps a video duration, an optional sampling rate and two frame budgets
//! onto the spacing between target timestamps and the offset of the first
//! one.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use stillpick::planner;
//!
//! // 10 s video, no explicit rate, aim for 30 frames, never more than 600.
//! let plan = planner::plan(Duration::from_secs(10), None, 30, 600);
//! assert_eq!(plan.start_offset, Duration::from_millis(100));
//! assert!(plan.implied_frame_count(Duration::from_secs(10)) <= 600);
//! ```

use std::time::Duration;

/// Duration assumed when a source reports a missing, non-finite or
/// non-positive duration.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);

/// Smallest spacing used when no explicit rate is requested.
pub const DEFAULT_MIN_SPACING: Duration = Duration::from_millis(50);

/// Largest offset of the first target timestamp.
///
/// Decoders often paint black or garbage for the very first instant.
pub const DEFAULT_LEAD_IN: Duration = Duration::from_millis(100);

/// Absolute floor for any interval, whatever the inputs.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Spacing and starting point of a sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    /// Time between consecutive target timestamps. Always positive.
    pub interval: Duration,
    /// First target timestamp.
    pub start_offset: Duration,
}

impl SamplingPlan {
    /// Number of target timestamps `start_offset + k * interval` that fall
    /// strictly before `duration`.
    pub fn implied_frame_count(&self, duration: Duration) -> u64 {
        if self.start_offset >= duration {
            return 0;
        }
        let span = (duration - self.start_offset).as_micros();
        let step = self.interval.as_micros().max(1);
        span.div_ceil(step) as u64
    }
}

/// Interval planner with tunable spacing floor and lead-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Planner {
    /// Floor used by the target-count fallback.
    pub min_spacing: Duration,
    /// Upper bound for the start offset.
    pub lead_in: Duration,
}

impl Default for Planner {
    fn default() -> Self {
        Self {
            min_spacing: DEFAULT_MIN_SPACING,
            lead_in: DEFAULT_LEAD_IN,
        }
    }
}

impl Planner {
    /// Compute the sampling plan.
    ///
    /// With a positive finite `desired_rate` the interval is
    /// `max(1 / rate, duration / hard_ceiling)`. Otherwise it falls back to
    /// `max(min_spacing, duration / target_count)`. `target_count` is capped
    /// by `hard_ceiling`, and both are treated as at least 1.
    ///
    /// The start offset is `min(lead_in, duration / 10)`.
    ///
    /// `duration` must already be sanitised (see [`effective_duration`]).
    pub fn plan(
        &self,
        duration: Duration,
        desired_rate: Option<f64>,
        target_count: u32,
        hard_ceiling: u32,
    ) -> SamplingPlan {
        let seconds = duration.as_secs_f64();
        let hard_ceiling = hard_ceiling.max(1);
        let target_count = target_count.clamp(1, hard_ceiling);

        let interval_seconds = match desired_rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => {
                (1.0 / rate).max(seconds / f64::from(hard_ceiling))
            }
            _ => self
                .min_spacing
                .as_secs_f64()
                .max(seconds / f64::from(target_count)),
        };

        // Round up to whole microseconds so frame ids stay distinct and the
        // ceiling term is never undershot by truncation.
        let interval = micros_ceil(interval_seconds).max(MIN_INTERVAL);
        let start_offset = self.lead_in.min(duration / 10);

        SamplingPlan {
            interval,
            start_offset: Duration::from_micros(start_offset.as_micros() as u64),
        }
    }
}

/// Plan with the default spacing floor and lead-in.
///
/// See [`Planner::plan`].
pub fn plan(
    duration: Duration,
    desired_rate: Option<f64>,
    target_count: u32,
    hard_ceiling: u32,
) -> SamplingPlan {
    Planner::default().plan(duration, desired_rate, target_count, hard_ceiling)
}

/// Turn a reported duration in seconds into a usable [`Duration`].
///
/// Missing, non-finite, non-positive or unrepresentable values become
/// [`DEFAULT_DURATION`].
pub fn effective_duration(reported_seconds: Option<f64>) -> Duration {
    match reported_seconds {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => {
            Duration::try_from_secs_f64(seconds)
                .ok()
                .filter(|duration| !duration.is_zero())
                .unwrap_or(DEFAULT_DURATION)
        }
        _ => DEFAULT_DURATION,
    }
}

/// Round to the nearest nanosecond first, then up to whole microseconds.
fn micros_ceil(seconds: f64) -> Duration {
    let nanos = (seconds * 1_000_000_000.0).round();
    if nanos.is_finite() && nanos > 0.0 {
        let nanos = nanos.min(u64::MAX as f64) as u64;
        Duration::from_micros(nanos.div_ceil(1_000))
    } else {
        Duration::ZERO
    }
}
