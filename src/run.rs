//! The sampling run value object.
//!
//! A [`SamplingRun`] holds everything one uploaded video produced: the
//! ordered frames, the plan that spaced them, the last reported progress and
//! a terminal status. The sampler fills it; the operations in
//! [`selection`](crate::selection) mutate it afterwards.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::frame::{DisplayHandles, Frame, FrameId};
use crate::planner::SamplingPlan;

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Not started, or discarded back to the pre-upload state.
    #[default]
    Pending,
    /// The sampler is working on it.
    Running,
    /// Sampling finished and frames were committed.
    Complete,
    /// A run-fatal error stopped sampling; the run holds no frames.
    Failed,
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Complete => "complete",
            RunStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Phases of the sampler's state machine.
///
/// `Loading -> (LoadFailed | Ready) -> Sampling -> Finalizing -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Waiting for source metadata.
    Loading,
    /// Metadata never arrived or the source reported an error.
    LoadFailed,
    /// Metadata known, plan computed.
    Ready,
    /// Walking target timestamps.
    Sampling,
    /// Releasing decode resources and committing frames.
    Finalizing,
    /// Frames committed, progress at 100.
    Done,
}

/// A still captured by the sampler but not yet committed to a run.
#[derive(Debug)]
pub(crate) struct Capture {
    pub(crate) timestamp: Duration,
    pub(crate) raster: Vec<u8>,
}

/// One end-to-end sampling session for a single video.
#[derive(Debug)]
pub struct SamplingRun {
    pub(crate) frames: Vec<Frame>,
    pub(crate) handles: DisplayHandles,
    pub(crate) status: RunStatus,
    pub(crate) progress: u8,
    pub(crate) plan: Option<SamplingPlan>,
    pub(crate) duration: Option<Duration>,
    pub(crate) dimensions: Option<(u32, u32)>,
    pub(crate) failure: Option<String>,
    pub(crate) exhausted: bool,
}

impl SamplingRun {
    /// Create an empty, pending run whose display handles are issued by
    /// `handles`.
    pub fn new(handles: DisplayHandles) -> Self {
        Self {
            frames: Vec::new(),
            handles,
            status: RunStatus::Pending,
            progress: 0,
            plan: None,
            duration: None,
            dimensions: None,
            failure: None,
            exhausted: false,
        }
    }

    /// Frames in display order (strictly increasing timestamps).
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Selected frames in display order.
    pub fn selected(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(|frame| frame.selected)
    }

    /// Number of selected frames.
    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// Look up a frame by id.
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.iter().find(|frame| frame.id() == id)
    }

    /// Position of a frame in display order.
    pub fn position(&self, id: FrameId) -> Option<usize> {
        self.frames.iter().position(|frame| frame.id() == id)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the run holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Last reported progress, `0..=100`.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Sampling interval, once planned.
    pub fn interval(&self) -> Option<Duration> {
        self.plan.map(|plan| plan.interval)
    }

    /// The full sampling plan, once computed.
    pub fn plan(&self) -> Option<SamplingPlan> {
        self.plan
    }

    /// Effective video duration used for planning.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Native `(width, height)` of the source.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Why the run failed, if it did.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Whether deletions removed every frame of a completed run.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The registry that issued this run's display handles.
    pub fn handles(&self) -> &DisplayHandles {
        &self.handles
    }

    /// Turn captures into frames, issuing one display handle each.
    pub(crate) fn commit(&mut self, captures: Vec<Capture>, selected: bool) {
        self.frames.reserve(captures.len());
        for capture in captures {
            let raster: Arc<[u8]> = Arc::from(capture.raster);
            let handle = self.handles.issue(Arc::clone(&raster));
            self.frames
                .push(Frame::new(capture.timestamp, raster, handle, selected));
        }
    }
}

impl Drop for SamplingRun {
    fn drop(&mut self) {
        if !self.frames.is_empty() {
            log::debug!(
                "Dropping run with {} live frame(s); releasing their handles",
                self.frames.len()
            );
            self.discard();
        }
    }
}
