//! Renderer boundary
//!
//! The particle renderer lives outside this crate. It receives the state to
//! draw through a [`RenderSink`], once per frame.

use crate::physics::PhysicalState;
use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, trace};

/// Receives the state to draw each frame
pub trait RenderSink: Send {
    fn render(&mut self, state: &PhysicalState);
}

/// Forwards frames to another thread; drops frames when the queue is full
impl RenderSink for Sender<PhysicalState> {
    fn render(&mut self, state: &PhysicalState) {
        match self.try_send(*state) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!("Render queue full, frame dropped"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Logs a summary line every `every` frames
pub struct LoggingSink {
    every: u64,
    frames: u64,
}

impl LoggingSink {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new(60)
    }
}

impl RenderSink for LoggingSink {
    fn render(&mut self, state: &PhysicalState) {
        if self.frames % self.every == 0 {
            debug!(
                "frame {}: expansion={:.2} focus={:.2} warp={:.2} camera={:.1} hue={:.2}{}",
                self.frames,
                state.expansion,
                state.focus,
                state.warp_speed,
                state.camera_depth,
                state.hue,
                if state.is_stopped { " [stopped]" } else { "" }
            );
        }
        self.frames += 1;
    }
}
