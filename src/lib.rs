//! Bramy - remote control for a small CAN-driven robotic car
//!
//! This library provides the pieces of the car's driving stack:
//! joystick input dispatch, the bounded speed/steering command state,
//! the CAN frame encoding, and the gated camera capture path.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod camera;
pub mod capture;
pub mod control;
pub mod input;
#[cfg(feature = "ros")]
pub mod ros_interface;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Re-export commonly used items for easier access
pub use camera::{CameraError, CameraPublisher, ColorCamera};
pub use capture::{CaptureError, CaptureGate, ColorFrame, FramePersister, FrameRecorder};
pub use control::{CanBus, CanEncoder, CanError, Command, CommandFrame, CommandState};
pub use input::{Button, ButtonEvent, ButtonSource, InputDispatcher, InputError, InputThread, Phase};

/// Main configuration structure for the car
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CarConfig {
    /// ROS 2 configuration
    pub ros: RosConfig,
    /// CAN bus configuration
    pub can: CanConfig,
    /// Joystick control parameters
    pub control: ControlConfig,
    /// Frame capture settings
    pub capture: CaptureConfig,
    /// Camera publisher settings
    pub camera: CameraConfig,
}

/// ROS 2 specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosConfig {
    /// Node name of the driving node
    pub node_name: String,
    /// Topic carrying color frames
    pub image_topic: String,
    /// QoS history depth
    pub qos_depth: usize,
}

/// CAN bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanConfig {
    /// SocketCAN interface name
    pub channel: String,
    /// Standard (11-bit) arbitration id of the command frame
    pub arbitration_id: u16,
}

/// Joystick control parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Speed at startup
    pub initial_speed: i32,
    /// Steering angle at startup
    pub initial_angle: i32,
    /// Magnitude of the speed command issued by A / Y
    pub speed_step: i32,
    /// Steering change issued by X / B
    pub angle_step: i32,
    /// Idle sleep between joystick polls
    pub poll_interval_ms: u64,
}

/// Frame capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory receiving captured images, `~/Downloads/Target` when unset
    pub target_dir: Option<PathBuf>,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

/// Camera publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Node name of the publishing node
    pub node_name: String,
    /// Index of the V4L2 device (`/dev/videoN`)
    pub device_index: usize,
    /// Requested frame width
    pub width: u32,
    /// Requested frame height
    pub height: u32,
    /// Publish rate in Hz
    pub frame_rate: f64,
}

impl Default for RosConfig {
    fn default() -> Self {
        RosConfig {
            node_name: "get_control".to_string(),
            image_topic: "color_image".to_string(),
            qos_depth: 1,
        }
    }
}

impl Default for CanConfig {
    fn default() -> Self {
        CanConfig {
            channel: "can0".to_string(),
            arbitration_id: control::COMMAND_FRAME_ID,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        ControlConfig {
            initial_speed: 0,
            initial_angle: 90,
            speed_step: 25,
            angle_step: 10,
            poll_interval_ms: 10,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            target_dir: None,
            jpeg_quality: 90,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            node_name: "camera_publisher".to_string(),
            device_index: 0,
            width: 640,
            height: 480,
            frame_rate: 30.0,
        }
    }
}

impl CarConfig {
    /// Load a configuration from a YAML file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CarError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| CarError::Config(format!("{}: {}", path.display(), e)))?;
        let config: CarConfig = serde_yaml::from_reader(file)
            .map_err(|e| CarError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CarError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<(), CarError> {
        if self.can.arbitration_id > control::MAX_STANDARD_ID {
            return Err(CanError::InvalidId(self.can.arbitration_id).into());
        }
        if !(self.camera.frame_rate > 0.0) {
            return Err(CarError::Config(format!(
                "camera.frame_rate must be positive, got {}",
                self.camera.frame_rate
            )));
        }
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(CarError::Config(format!(
                "capture.jpeg_quality must be in 1..=100, got {}",
                self.capture.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Directory receiving captured frames
    pub fn target_dir(&self) -> PathBuf {
        self.capture.target_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_default()
                .join("Downloads")
                .join("Target")
        })
    }
}

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum CarError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// CAN bus error
    #[error("CAN error: {0}")]
    Can(#[from] CanError),
    /// Joystick error
    #[error("Input error: {0}")]
    Input(#[from] InputError),
    /// Camera error
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// ROS 2 middleware error
    #[error("ROS error: {0}")]
    Ros(String),
}

#[cfg(feature = "ros")]
impl From<r2r::Error> for CarError {
    fn from(e: r2r::Error) -> Self {
        CarError::Ros(e.to_string())
    }
}
