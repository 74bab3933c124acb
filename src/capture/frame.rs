// src/capture/frame.rs
// Middleware-neutral color frame and its conversion to an RGB buffer.

use image::RgbImage;

use super::CaptureError;

/// One camera frame as delivered on the image topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout name (`rgb8`, `bgr8`, `rgba8`, `bgra8`, `mono8`)
    pub encoding: String,
    /// Bytes per row, including padding
    pub step: u32,
    /// Raw pixel bytes, `step * height` long
    pub data: Vec<u8>,
}

impl ColorFrame {
    /// Tightly packed `rgb8` frame
    pub fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        ColorFrame {
            width,
            height,
            encoding: "rgb8".to_string(),
            step: width * 3,
            data: image.into_raw(),
        }
    }

    fn channels(&self) -> Result<usize, CaptureError> {
        match self.encoding.as_str() {
            "rgb8" | "bgr8" => Ok(3),
            "rgba8" | "bgra8" => Ok(4),
            "mono8" => Ok(1),
            other => Err(CaptureError::UnsupportedEncoding(other.to_string())),
        }
    }

    /// Convert to packed RGB, dropping row padding and alpha
    pub fn to_rgb(&self) -> Result<RgbImage, CaptureError> {
        let channels = self.channels()?;
        let width = self.width as usize;
        let height = self.height as usize;
        let step = self.step as usize;

        if width == 0 || height == 0 {
            return Err(CaptureError::EmptyFrame);
        }

        let row_bytes = width * channels;
        if step < row_bytes || self.data.len() < step * height {
            return Err(CaptureError::BufferSize {
                expected: step.max(row_bytes) * height,
                actual: self.data.len(),
            });
        }

        let mut rgb = Vec::with_capacity(width * height * 3);
        for row in self.data.chunks_exact(step).take(height) {
            for px in row[..row_bytes].chunks_exact(channels) {
                match self.encoding.as_str() {
                    "rgb8" | "rgba8" => rgb.extend_from_slice(&px[..3]),
                    "bgr8" | "bgra8" => rgb.extend_from_slice(&[px[2], px[1], px[0]]),
                    _ => rgb.extend_from_slice(&[px[0], px[0], px[0]]),
                }
            }
        }

        RgbImage::from_raw(self.width, self.height, rgb).ok_or(CaptureError::BufferSize {
            expected: width * height * 3,
            actual: self.data.len(),
        })
    }
}
