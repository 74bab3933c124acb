//! Gated camera capture
//!
//! The capture gate is opened and closed from the joystick thread and read
//! from the frame callback. While open, every frame is written to disk by
//! the persister; while closed, frames are dropped without any I/O.

mod frame;
mod persister;

pub use frame::*;
pub use persister::*;

use chrono::Utc;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::control::CommandState;

/// Capture error types
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Pixel layout not handled
    #[error("unsupported image encoding: {0}")]
    UnsupportedEncoding(String),
    /// Frame has no pixels
    #[error("frame has zero width or height")]
    EmptyFrame,
    /// Buffer shorter than the header claims
    #[error("image buffer too small: expected {expected} bytes, got {actual}")]
    BufferSize {
        /// Bytes required by width, height and step
        expected: usize,
        /// Bytes received
        actual: usize,
    },
    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    Encode(String),
    /// File could not be written
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Two-state switch deciding whether frames are persisted. Starts closed.
#[derive(Debug, Default)]
pub struct CaptureGate {
    open: AtomicBool,
}

impl CaptureGate {
    /// Closed gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Start capturing
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Stop capturing
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Whether frames are currently persisted
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// What happened to an incoming frame
#[derive(Debug)]
pub enum FrameOutcome {
    /// Gate closed, frame dropped
    Discarded,
    /// Frame written to this path
    Saved(PathBuf),
    /// Conversion or write failed, frame dropped
    Failed(CaptureError),
}

/// Per-frame callback joining the gate, the steering angle and the persister
pub struct FrameRecorder {
    gate: Arc<CaptureGate>,
    state: Arc<CommandState>,
    persister: FramePersister,
}

impl FrameRecorder {
    /// Create a recorder
    pub fn new(gate: Arc<CaptureGate>, state: Arc<CommandState>, persister: FramePersister) -> Self {
        FrameRecorder { gate, state, persister }
    }

    /// Handle one frame delivered by the camera topic
    pub fn on_frame(&self, frame: &ColorFrame) -> FrameOutcome {
        if !self.gate.is_open() {
            return FrameOutcome::Discarded;
        }

        let angle = self.state.angle();
        match self.persister.persist(frame, Utc::now(), angle) {
            Ok(path) => {
                info!("Saved RGB image to {}", path.display());
                FrameOutcome::Saved(path)
            }
            Err(e) => {
                error!("Error converting RGB image: {}", e);
                FrameOutcome::Failed(e)
            }
        }
    }
}
