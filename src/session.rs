//! One-run-at-a-time orchestration.
//!
//! A [`Session`] owns the current [`SamplingRun`], the display-handle
//! registry and the export settings. Loading a new video always discards
//! the previous run first, and because every mutating method takes
//! `&mut self`, a discard can never overlap a sampling step.
//!
//! # Example
//!
//! ```no_run
//! use stillpick::{DecodeSource, Session, SamplingOptions, StillpickError};
//!
//! # async fn example(source: impl DecodeSource) -> Result<(), StillpickError> {
//! let mut session = Session::new(SamplingOptions::new());
//! session.load(source).await?;
//!
//! if let Some(first) = session.run().frames().first().map(|frame| frame.id()) {
//!     session.run_mut().toggle(first);
//! }
//! let archive = session.export()?;
//! std::fs::write("frames.zip", archive)?;
//! # Ok(())
//! # }
//! ```

use crate::configuration::SamplingOptions;
use crate::error::StillpickError;
use crate::export::{self, ExportOptions};
use crate::frame::{DisplayHandles, FrameId};
use crate::run::SamplingRun;
use crate::sampler::Sampler;
use crate::selection::Removal;
use crate::source::DecodeSource;

/// Holds the active run and everything needed to replace or export it.
#[derive(Debug)]
pub struct Session {
    sampler: Sampler,
    export_options: ExportOptions,
    handles: DisplayHandles,
    run: SamplingRun,
    focused: Option<FrameId>,
}

impl Session {
    /// Create a session with no video loaded.
    pub fn new(options: SamplingOptions) -> Self {
        let handles = DisplayHandles::new();
        Self {
            sampler: Sampler::new(options),
            export_options: ExportOptions::new(),
            run: SamplingRun::new(handles.clone()),
            handles,
            focused: None,
        }
    }

    /// Use custom archive naming.
    #[must_use]
    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    /// Discard the current run, then sample `source` into a fresh one.
    ///
    /// # Errors
    ///
    /// Run-fatal errors from [`Sampler::sample`]. The session then holds a
    /// failed, empty run.
    pub async fn load<S: DecodeSource>(&mut self, mut source: S) -> Result<&SamplingRun, StillpickError> {
        self.start_over();
        self.sampler.sample(&mut source, &mut self.run).await?;
        self.focused = self.run.frames().first().map(|frame| frame.id());
        Ok(&self.run)
    }

    /// The current run.
    pub fn run(&self) -> &SamplingRun {
        &self.run
    }

    /// Mutable access for selection operations.
    pub fn run_mut(&mut self) -> &mut SamplingRun {
        &mut self.run
    }

    /// The display-handle registry shared by all runs of this session.
    pub fn handles(&self) -> &DisplayHandles {
        &self.handles
    }

    /// The frame currently in focus.
    pub fn focused(&self) -> Option<FrameId> {
        self.focused
    }

    /// Focus a frame. Returns `false` for an unknown id.
    pub fn focus(&mut self, id: FrameId) -> bool {
        if self.run.get(id).is_some() {
            self.focused = Some(id);
            true
        } else {
            false
        }
    }

    /// Remove a frame, moving focus to its successor when it was focused.
    pub fn remove(&mut self, id: FrameId) -> Option<Removal> {
        let removal = self.run.remove(id)?;
        if self.focused == Some(id) {
            self.focused = removal.successor;
        }
        Some(removal)
    }

    /// Package the selected frames of the current run.
    ///
    /// # Errors
    ///
    /// - [`StillpickError::RunExhausted`] if deletions emptied the run.
    /// - [`StillpickError::NothingSelected`] if no frame is selected.
    /// - [`StillpickError::ArchiveBuild`] if writing the archive fails.
    pub fn export(&self) -> Result<Vec<u8>, StillpickError> {
        if self.run.is_exhausted() {
            return Err(StillpickError::RunExhausted);
        }
        export::export(self.run.frames(), &self.export_options)
    }

    /// Full teardown: release every handle and reset to the pre-upload
    /// state. Returns the number of handles released.
    pub fn start_over(&mut self) -> usize {
        self.focused = None;
        self.run.discard()
    }
}
