// src/capture/persister.rs
// Writes accepted frames as JPEG files named by capture time and steering angle.

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CaptureError, ColorFrame};

/// Writes frames under a fixed directory
pub struct FramePersister {
    target_dir: PathBuf,
    quality: u8,
}

impl FramePersister {
    /// Persister writing into `target_dir` (assumed to exist)
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self::with_quality(target_dir, 90)
    }

    /// Persister with an explicit JPEG quality
    pub fn with_quality(target_dir: impl Into<PathBuf>, quality: u8) -> Self {
        FramePersister {
            target_dir: target_dir.into(),
            quality: quality.clamp(1, 100),
        }
    }

    /// Directory receiving the images
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// `rgb_<epoch_ms>_<angle>.jpg`
    pub fn file_name(captured_at: DateTime<Utc>, angle: i32) -> String {
        format!("rgb_{}_{}.jpg", captured_at.timestamp_millis(), angle)
    }

    /// Convert and write one frame. Nothing is left on disk when this fails.
    pub fn persist(&self, frame: &ColorFrame, captured_at: DateTime<Utc>, angle: i32) -> Result<PathBuf, CaptureError> {
        let image = frame.to_rgb()?;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .encode_image(&image)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;

        let path = self.target_dir.join(Self::file_name(captured_at, angle));
        let partial = path.with_extension("jpg.tmp");
        if let Err(e) = fs::write(&partial, &jpeg).and_then(|_| fs::rename(&partial, &path)) {
            let _ = fs::remove_file(&partial);
            return Err(CaptureError::Io(e));
        }

        Ok(path)
    }
}
