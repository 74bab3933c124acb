//! Camera side of the capture path
//!
//! A camera produces color frames; the publisher grabs one per timer tick
//! and hands it to whatever transport republishes it for downstream nodes.

#[cfg(feature = "v4l")]
mod v4l2;

#[cfg(feature = "v4l")]
pub use v4l2::V4lCamera;

use log::error;
use std::time::Duration;

use crate::capture::ColorFrame;

/// Camera error types
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// Device could not be opened or configured
    #[error("camera device error: {0}")]
    Device(String),
    /// Frame was read but could not be decoded
    #[error("camera frame decode error: {0}")]
    Decode(String),
}

/// A source of color frames
pub trait ColorCamera {
    /// Grab the latest color frame
    fn get_color(&mut self) -> Result<ColorFrame, CameraError>;
}

/// Grabs frames at a fixed cadence and forwards them to a sink
pub struct CameraPublisher<C: ColorCamera> {
    camera: C,
    period: Duration,
    published: u64,
    skipped: u64,
}

impl<C: ColorCamera> CameraPublisher<C> {
    /// Publisher ticking at `frame_rate` Hz
    pub fn new(camera: C, frame_rate: f64) -> Self {
        CameraPublisher {
            camera,
            period: Duration::from_secs_f64(1.0 / frame_rate),
            published: 0,
            skipped: 0,
        }
    }

    /// Timer period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Frames forwarded so far
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Frames dropped because of an error
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// One timer tick: grab a frame and pass it to `publish`.
    /// Errors from either step are logged and the frame is skipped.
    pub fn tick<F, E>(&mut self, publish: F) -> bool
    where
        F: FnOnce(ColorFrame) -> Result<(), E>,
        E: std::fmt::Display,
    {
        let result = self
            .camera
            .get_color()
            .map_err(|e| e.to_string())
            .and_then(|frame| publish(frame).map_err(|e| e.to_string()));

        match result {
            Ok(()) => {
                self.published += 1;
                true
            }
            Err(e) => {
                error!("Error publishing frames: {}", e);
                self.skipped += 1;
                false
            }
        }
    }
}
