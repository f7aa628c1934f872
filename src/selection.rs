//! Selection and lifecycle operations on a [`SamplingRun`].
//!
//! These are the only operations that change a run's selection flags or
//! its membership after sampling. Order is never changed. A frame's display
//! handle is released exactly once, either by [`SamplingRun::remove`] when
//! that frame is deleted, or by [`SamplingRun::discard`] for every frame
//! still present when the run is thrown away.

use crate::frame::{Frame, FrameId};
use crate::run::{RunStatus, SamplingRun};

/// Outcome of [`SamplingRun::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// The frame that was removed.
    pub removed: FrameId,
    /// Frame to focus next: the following frame if any, else the previous
    /// one, else `None`.
    pub successor: Option<FrameId>,
    /// `true` when the removal left the run without frames.
    pub exhausted: bool,
}

impl SamplingRun {
    /// Flip the selection of one frame.
    ///
    /// Returns the new state, or `None` (and changes nothing) for an unknown
    /// id.
    pub fn toggle(&mut self, id: FrameId) -> Option<bool> {
        let frame = self.frames.iter_mut().find(|frame| frame.id() == id)?;
        frame.selected = !frame.selected;
        Some(frame.selected)
    }

    /// Set the selection of every frame.
    pub fn set_all(&mut self, selected: bool) {
        for frame in &mut self.frames {
            frame.selected = selected;
        }
    }

    /// Remove one frame and release its display handle.
    ///
    /// Returns `None` (and changes nothing) for an unknown id. When the last
    /// frame goes, the run is marked exhausted; the caller should offer a
    /// full [`discard`](SamplingRun::discard).
    pub fn remove(&mut self, id: FrameId) -> Option<Removal> {
        let index = self.position(id)?;
        let frame = self.frames.remove(index);
        self.release(frame);

        let successor = self
            .frames
            .get(index)
            .or_else(|| index.checked_sub(1).and_then(|previous| self.frames.get(previous)))
            .map(Frame::id);

        let exhausted = self.frames.is_empty();
        if exhausted {
            log::info!("Last frame removed; run exhausted");
            self.exhausted = true;
        }

        Some(Removal {
            removed: id,
            successor,
            exhausted,
        })
    }

    /// Release every remaining display handle and reset the run to its
    /// pre-upload state.
    ///
    /// Safe on an empty run. Returns the number of handles released.
    pub fn discard(&mut self) -> usize {
        let frames = std::mem::take(&mut self.frames);
        let mut released = 0;
        for frame in frames {
            if self.release(frame) {
                released += 1;
            }
        }

        self.status = RunStatus::Pending;
        self.progress = 0;
        self.plan = None;
        self.duration = None;
        self.dimensions = None;
        self.failure = None;
        self.exhausted = false;

        if released > 0 {
            log::debug!("Discarded run, released {released} display handle(s)");
        }
        released
    }

    fn release(&self, frame: Frame) -> bool {
        let id = frame.id();
        match self.handles.release(frame.into_display_handle()) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("Could not release handle of {id}: {error}");
                false
            }
        }
    }
}
