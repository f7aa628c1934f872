//! Shared helpers for integration tests.
//!
//! [`ScriptedSource`] is an in-memory decode source whose behaviour per
//! step is configured up front: stalls, rejected seeks, late data and
//! unreadable pictures.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stillpick::{
    DecodeSource, ProgressCallback, ProgressInfo, RasterTarget, SamplingOptions, SourceMetadata,
    StillpickError,
};

/// How the source answers a metadata request.
#[derive(Debug, Clone)]
pub enum MetadataScript {
    Ready(SourceMetadata),
    Fail(String),
    Never,
}

/// A decode source driven by a script instead of a real decoder.
#[derive(Debug)]
pub struct ScriptedSource {
    metadata: MetadataScript,
    stalled_steps: HashSet<usize>,
    failing_steps: HashSet<usize>,
    unreadable_steps: HashSet<usize>,
    polls_before_data: u32,
    pending_polls: Cell<u32>,
    ready: bool,
    seeks: Vec<Duration>,
    reads: usize,
    closed: bool,
}

impl ScriptedSource {
    /// A well-behaved 4x4 source of `seconds` length.
    pub fn new(seconds: f64) -> Self {
        Self::with_metadata(MetadataScript::Ready(SourceMetadata {
            duration_seconds: Some(seconds),
            width: 4,
            height: 4,
        }))
    }

    pub fn with_metadata(metadata: MetadataScript) -> Self {
        Self {
            metadata,
            stalled_steps: HashSet::new(),
            failing_steps: HashSet::new(),
            unreadable_steps: HashSet::new(),
            polls_before_data: 0,
            pending_polls: Cell::new(0),
            ready: false,
            seeks: Vec::new(),
            reads: 0,
            closed: false,
        }
    }

    /// A source reporting `duration_seconds` verbatim, including `None` and
    /// non-finite values.
    pub fn with_reported_duration(duration_seconds: Option<f64>) -> Self {
        Self::with_metadata(MetadataScript::Ready(SourceMetadata {
            duration_seconds,
            width: 4,
            height: 4,
        }))
    }

    /// Seeks at these 1-based steps never complete.
    pub fn stall_at(mut self, steps: &[usize]) -> Self {
        self.stalled_steps.extend(steps);
        self
    }

    /// Seeks at these 1-based steps are rejected.
    pub fn fail_seek_at(mut self, steps: &[usize]) -> Self {
        self.failing_steps.extend(steps);
        self
    }

    /// Pictures at these 1-based steps cannot be read.
    pub fn unreadable_at(mut self, steps: &[usize]) -> Self {
        self.unreadable_steps.extend(steps);
        self
    }

    /// Report the seek as done `polls` data checks before data is readable.
    pub fn data_late_by(mut self, polls: u32) -> Self {
        self.polls_before_data = polls;
        self
    }

    /// Every seek target requested so far.
    pub fn seeks(&self) -> &[Duration] {
        &self.seeks
    }

    /// Pictures successfully read.
    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn was_closed(&self) -> bool {
        self.closed
    }

    fn step(&self) -> usize {
        self.seeks.len()
    }
}

impl DecodeSource for ScriptedSource {
    async fn load_metadata(&mut self) -> Result<SourceMetadata, StillpickError> {
        match self.metadata.clone() {
            MetadataScript::Ready(metadata) => Ok(metadata),
            MetadataScript::Fail(reason) => Err(StillpickError::DecodeError(reason)),
            MetadataScript::Never => std::future::pending().await,
        }
    }

    async fn seek(&mut self, timestamp: Duration) -> Result<(), StillpickError> {
        self.ready = false;
        self.seeks.push(timestamp);
        let step = self.step();

        if self.stalled_steps.contains(&step) {
            std::future::pending::<()>().await;
        }
        if self.failing_steps.contains(&step) {
            return Err(StillpickError::SeekFailed(format!("scripted failure at step {step}")));
        }

        self.pending_polls.set(self.polls_before_data);
        self.ready = true;
        Ok(())
    }

    fn has_current_data(&self) -> bool {
        if !self.ready {
            return false;
        }
        let remaining = self.pending_polls.get();
        if remaining > 0 {
            self.pending_polls.set(remaining - 1);
            return false;
        }
        true
    }

    fn read_picture(&mut self, target: &mut RasterTarget) -> Result<(), StillpickError> {
        let step = self.step();
        if self.unreadable_steps.contains(&step) {
            return Err(StillpickError::DecodeError(format!("scripted unreadable picture at step {step}")));
        }
        target.pixels_mut().fill((step % 256) as u8);
        self.reads += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Records every progress report.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    pub fn percents(&self) -> Vec<u8> {
        self.infos().iter().map(|info| info.percent).collect()
    }

    pub fn infos(&self) -> Vec<ProgressInfo> {
        self.infos.lock().unwrap().clone()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

/// Options with the default budgets and a recording progress callback.
pub fn recorded_options() -> (SamplingOptions, Arc<RecordingProgress>) {
    let progress = Arc::new(RecordingProgress::default());
    let options = SamplingOptions::new().with_progress(progress.clone());
    (options, progress)
}
