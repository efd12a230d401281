//! Cooperative single-threaded frame loop.
//!
//! One thread polls input, advances the viewer and presents the frame, at
//! most `target_fps` times per second. The loop exits after the frame in
//! which a close was requested.

use crate::core::viewer::{Frame, Viewer};
use crate::input::events::InputEvent;
use crate::layers::marker::AnnotationStore;
use crate::Result;
use instant::Instant;
use std::time::Duration;

/// Caps the loop rate by sleeping out the rest of each frame budget
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_budget: Option<Duration>,
    frame_start: Instant,
    frame_count: u64,
}

impl FrameClock {
    pub fn new(frame_budget: Option<Duration>) -> Self {
        Self {
            frame_budget,
            frame_start: Instant::now(),
            frame_count: 0,
        }
    }

    /// A clock that never sleeps
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn frame_budget(&self) -> Option<Duration> {
        self.frame_budget
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Time left in the current frame's budget
    pub fn remaining(&self) -> Duration {
        match self.frame_budget {
            Some(budget) => budget.saturating_sub(self.frame_start.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleeps out the current frame and starts the next one. Returns the time
    /// spent sleeping.
    pub fn wait_for_next_frame(&mut self) -> Duration {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.frame_start = Instant::now();
        self.frame_count += 1;
        remaining
    }
}

/// Supplies the events that arrived since the previous frame
pub trait InputSource {
    fn poll(&mut self) -> Vec<InputEvent>;
}

impl<F> InputSource for F
where
    F: FnMut() -> Vec<InputEvent>,
{
    fn poll(&mut self) -> Vec<InputEvent> {
        self()
    }
}

/// Receives each composed frame
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame) -> Result<()>,
{
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self(frame)
    }
}

/// Drives a [`Viewer`] until it is asked to close
pub struct FrameLoop {
    viewer: Viewer,
    clock: FrameClock,
    max_frames: Option<u64>,
}

impl FrameLoop {
    pub fn new(viewer: Viewer) -> Self {
        let clock = FrameClock::new(viewer.config().frame.target_frame_duration());
        Self {
            viewer,
            clock,
            max_frames: None,
        }
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    /// Stops after `frames` frames even without a close request
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Runs the loop and returns the session's annotations.
    ///
    /// A presentation error stops the loop and is returned; the viewer is
    /// still torn down first.
    pub fn run(mut self, input: &mut impl InputSource, sink: &mut impl FrameSink) -> Result<AnnotationStore> {
        let mut outcome = Ok(());
        loop {
            for event in input.poll() {
                self.viewer.handle_event(&event);
            }
            self.viewer.tick();
            let frame = self.viewer.render();
            if let Err(e) = sink.present(&frame) {
                log::error!("presenting frame {} failed: {}", self.viewer.frame_count(), e);
                outcome = Err(e);
                break;
            }

            if self.viewer.should_close() {
                log::debug!("close requested after {} frames", self.viewer.frame_count());
                break;
            }
            if self
                .max_frames
                .is_some_and(|max| self.viewer.frame_count() >= max)
            {
                break;
            }
            self.clock.wait_for_next_frame();
        }
        let annotations = self.viewer.destroy();
        outcome.map(|_| annotations)
    }
}
