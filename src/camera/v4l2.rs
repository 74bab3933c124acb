// src/camera/v4l2.rs
// V4L2 color camera. Prefers MJPG and falls back to whatever packed format
// the driver negotiates (YUYV or RGB3).

use image::{ImageFormat, RgbImage};
use log::info;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::{CameraError, ColorCamera};
use crate::capture::ColorFrame;
use crate::CameraConfig;

/// Color camera on `/dev/video<N>`
pub struct V4lCamera {
    stream: Stream<'static>,
    width: u32,
    height: u32,
    fourcc: FourCC,
    _device: Device,
}

impl V4lCamera {
    /// Open and configure the device named in `config`
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let device = Device::new(config.device_index).map_err(|e| CameraError::Device(e.to_string()))?;

        let mut format = device.format().map_err(|e| CameraError::Device(e.to_string()))?;
        format.width = config.width;
        format.height = config.height;
        format.fourcc = FourCC::new(b"MJPG");
        let format = device.set_format(&format).map_err(|e| CameraError::Device(e.to_string()))?;

        let stream = Stream::with_buffers(&device, Type::VideoCapture, 4)
            .map_err(|e| CameraError::Device(e.to_string()))?;

        info!(
            "Camera /dev/video{} streaming {}x{} {}",
            config.device_index, format.width, format.height, format.fourcc
        );

        Ok(V4lCamera {
            stream,
            width: format.width,
            height: format.height,
            fourcc: format.fourcc,
            _device: device,
        })
    }

    fn decode(&self, buf: &[u8]) -> Result<RgbImage, CameraError> {
        match &self.fourcc.repr {
            b"MJPG" => image::load_from_memory_with_format(buf, ImageFormat::Jpeg)
                .map(|img| img.to_rgb8())
                .map_err(|e| CameraError::Decode(e.to_string())),
            b"RGB3" => RgbImage::from_raw(self.width, self.height, buf.to_vec())
                .ok_or_else(|| CameraError::Decode(format!("short RGB3 buffer ({} bytes)", buf.len()))),
            b"YUYV" => yuyv_to_rgb(buf, self.width, self.height),
            _ => Err(CameraError::Decode(format!("unsupported pixel format {}", self.fourcc))),
        }
    }
}

impl ColorCamera for V4lCamera {
    fn get_color(&mut self) -> Result<ColorFrame, CameraError> {
        let (buf, meta) = CaptureStream::next(&mut self.stream).map_err(|e| CameraError::Device(e.to_string()))?;
        let used = (meta.bytesused as usize).min(buf.len());
        let buf = buf[..used].to_vec();
        self.decode(&buf).map(ColorFrame::from_rgb)
    }
}

fn yuyv_to_rgb(buf: &[u8], width: u32, height: u32) -> Result<RgbImage, CameraError> {
    let pixels = (width * height) as usize;
    if buf.len() < pixels * 2 {
        return Err(CameraError::Decode(format!("short YUYV buffer ({} bytes)", buf.len())));
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in buf[..pixels * 2].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0] as f32, chunk[1] as f32 - 128.0, chunk[2] as f32, chunk[3] as f32 - 128.0);
        for y in [y0, y1] {
            let r = y + 1.402 * v;
            let g = y - 0.344 * u - 0.714 * v;
            let b = y + 1.772 * u;
            rgb.extend_from_slice(&[r.clamp(0.0, 255.0) as u8, g.clamp(0.0, 255.0) as u8, b.clamp(0.0, 255.0) as u8]);
        }
    }

    RgbImage::from_raw(width, height, rgb).ok_or_else(|| CameraError::Decode("YUYV size mismatch".to_string()))
}
