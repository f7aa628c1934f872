//! The frame-sampling engine.
//!
//! [`Sampler`] walks a [`DecodeSource`] through evenly spaced target
//! timestamps and stores a JPEG still for every timestamp it manages to
//! reach. The run moves through
//! `Loading -> (LoadFailed | Ready) -> Sampling -> Finalizing -> Done`.
//!
//! Every wait is bounded. Metadata loading has its own timeout; each
//! sampling step bounds the seek plus the wait for readable pixel data by
//! the step timeout. A step that times out, fails to seek, fails to decode
//! or encodes to nothing is logged and skipped. The loop stops when the
//! target time passes the duration or when the step ceiling is reached,
//! whichever comes first, so a run takes at most
//! `step_ceiling x (step_timeout + settle)` even when the decoder never
//! answers.
//!
//! Frames are committed to the run, and their display handles issued, only
//! once sampling finishes. Dropping the sampling future part-way leaves the
//! run without frames and issues no handles.
//!
//! # Example
//!
//! ```no_run
//! use stillpick::{DecodeSource, DisplayHandles, Sampler, SamplingOptions, SamplingRun, StillpickError};
//!
//! # async fn example(mut source: impl DecodeSource) -> Result<(), StillpickError> {
//! let sampler = Sampler::new(SamplingOptions::new().with_desired_rate(1.0));
//! let mut run = SamplingRun::new(DisplayHandles::new());
//! sampler.sample(&mut source, &mut run).await?;
//! println!("{} frames, every {:?}", run.len(), run.interval());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::configuration::SamplingOptions;
use crate::error::StillpickError;
use crate::planner::effective_duration;
use crate::progress::ProgressTracker;
use crate::raster::RasterTarget;
use crate::run::{Capture, RunPhase, RunStatus, SamplingRun};
use crate::source::{DecodeSource, SourceMetadata};

/// Drives decode sources through sampling runs.
///
/// Holds only configuration; all per-run state lives in the
/// [`SamplingRun`] passed to [`sample`](Sampler::sample).
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    options: SamplingOptions,
}

impl Sampler {
    /// Create a sampler with the given options.
    pub fn new(options: SamplingOptions) -> Self {
        Self { options }
    }

    /// The options this sampler runs with.
    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    /// Sample `source` into `run`.
    ///
    /// `run` must be pending and empty. On success it is `Complete`, holds
    /// every captured frame in timestamp order and reports progress 100.
    /// Individual steps that fail are skipped, so a complete run may hold
    /// fewer frames than planned, or none.
    ///
    /// # Errors
    ///
    /// - [`StillpickError::RunNotFresh`] if `run` was already used.
    /// - [`StillpickError::MetadataLoad`] or [`StillpickError::MetadataTimeout`]
    ///   if metadata never arrives.
    /// - [`StillpickError::RasterTargetInit`] if the source dimensions
    ///   cannot be rasterized.
    ///
    /// On these errors `run` is left `Failed` with no frames.
    pub async fn sample<S: DecodeSource>(
        &self,
        source: &mut S,
        run: &mut SamplingRun,
    ) -> Result<(), StillpickError> {
        if run.status != RunStatus::Pending || !run.is_empty() {
            return Err(StillpickError::RunNotFresh(run.status.to_string()));
        }
        run.status = RunStatus::Running;
        run.progress = 0;

        let options = &self.options;
        let step_ceiling = options.step_ceiling();
        let mut tracker = ProgressTracker::new(options.progress.clone(), step_ceiling);
        tracker.phase(RunPhase::Loading);

        let prepared = match self.load(source).await {
            Ok(metadata) => self.prepare(metadata),
            Err(error) => Err(error),
        };
        let (metadata, mut raster) = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                log::warn!("Sampling run failed before the first step: {error}");
                tracker.phase(RunPhase::LoadFailed);
                source.close();
                run.status = RunStatus::Failed;
                run.failure = Some(error.to_string());
                return Err(error);
            }
        };

        let duration = effective_duration(metadata.duration_seconds);
        let plan = options.planner.plan(
            duration,
            options.desired_rate,
            options.target_count,
            options.hard_ceiling,
        );
        run.plan = Some(plan);
        run.duration = Some(duration);
        run.dimensions = Some((metadata.width, metadata.height));
        tracker.phase(RunPhase::Ready);

        log::info!(
            "Sampling {}x{} video of {:.3}s every {:.3}s from {:.3}s",
            metadata.width,
            metadata.height,
            duration.as_secs_f64(),
            plan.interval.as_secs_f64(),
            plan.start_offset.as_secs_f64(),
        );

        let mut captures: Vec<Capture> = Vec::new();
        let mut current_time = plan.start_offset;
        let mut steps_taken = 0_u32;

        while current_time < duration && steps_taken < step_ceiling {
            steps_taken += 1;
            let timestamp = current_time;

            match self.step(source, &mut raster, timestamp).await {
                Ok(Some(still)) => captures.push(Capture {
                    timestamp,
                    raster: still,
                }),
                Ok(None) => {
                    log::debug!(
                        "No still produced at {:.3}s, skipping",
                        timestamp.as_secs_f64()
                    );
                }
                Err(error) => {
                    log::warn!("Skipping {:.3}s: {error}", timestamp.as_secs_f64());
                }
            }

            current_time = current_time.saturating_add(plan.interval);
            run.progress = tracker.advance(
                current_time,
                duration,
                steps_taken,
                captures.len(),
                timestamp,
            );
        }

        if steps_taken >= step_ceiling && current_time < duration {
            log::warn!("Step ceiling of {step_ceiling} reached before the end of the video");
        }

        tracker.finalizing(steps_taken, captures.len());
        source.close();
        drop(raster);

        let frame_count = captures.len();
        run.commit(captures, options.default_selected);
        run.status = RunStatus::Complete;
        run.progress = tracker.finish(steps_taken, frame_count);

        log::info!("Sampling finished: {frame_count} frame(s) from {steps_taken} step(s)");
        Ok(())
    }

    async fn load<S: DecodeSource>(&self, source: &mut S) -> Result<SourceMetadata, StillpickError> {
        let limit = self.options.metadata_timeout;
        match timeout(limit, source.load_metadata()).await {
            Ok(Ok(metadata)) => Ok(metadata),
            Ok(Err(error @ StillpickError::MetadataLoad { .. })) => Err(error),
            Ok(Err(error)) => Err(StillpickError::MetadataLoad {
                reason: error.to_string(),
            }),
            Err(_) => Err(StillpickError::MetadataTimeout(limit)),
        }
    }

    fn prepare(
        &self,
        metadata: SourceMetadata,
    ) -> Result<(SourceMetadata, RasterTarget), StillpickError> {
        let raster = RasterTarget::new(metadata.width, metadata.height)?;
        Ok((metadata, raster))
    }

    /// One sampling step: seek, wait for data, settle, read, encode.
    ///
    /// `Ok(None)` means the encoder produced no payload. Encoder failures
    /// surface as [`StillpickError::EncodeError`] and skip the step like
    /// any other step error.
    async fn step<S: DecodeSource>(
        &self,
        source: &mut S,
        raster: &mut RasterTarget,
        timestamp: Duration,
    ) -> Result<Option<Vec<u8>>, StillpickError> {
        let limit = self.options.step_timeout;
        let poll_interval = self.options.data_poll_interval;

        let reached = timeout(limit, async {
            source.seek(timestamp).await?;
            while !source.has_current_data() {
                sleep(poll_interval).await;
            }
            Ok::<(), StillpickError>(())
        })
        .await;

        match reached {
            Ok(result) => result?,
            Err(_) => return Err(StillpickError::SeekTimeout(limit)),
        }

        // Some decoders signal readiness slightly before the picture can be
        // read safely.
        for _ in 0..self.options.settle_cycles {
            sleep(self.options.settle_cycle).await;
        }

        source.read_picture(raster)?;

        let still = raster.encode_jpeg(self.options.jpeg_quality)?;
        Ok((!still.is_empty()).then_some(still))
    }
}
