//! ROS 2 interface for the car
//!
//! This module handles the image topic shared by the two nodes:
//! - Publishing camera frames as `sensor_msgs/Image`
//! - Subscribing to frames and feeding the capture recorder
//! - Spinning the node until shutdown

mod publisher;
mod subscriber;

use chrono::{DateTime, Utc};
use r2r::QosProfile;
use r2r::builtin_interfaces::msg::Time;
use r2r::sensor_msgs::msg::Image;
use r2r::std_msgs::msg::Header;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub use publisher::*;
pub use subscriber::*;

use crate::capture::ColorFrame;

/// History depth `depth`, everything else default
pub fn qos(depth: usize) -> QosProfile {
    QosProfile::default().keep_last(depth)
}

/// ROS time stamp for a wall-clock instant
pub fn stamp(at: DateTime<Utc>) -> Time {
    Time {
        sec: at.timestamp() as i32,
        nanosec: at.timestamp_subsec_nanos(),
    }
}

impl From<Image> for ColorFrame {
    fn from(msg: Image) -> Self {
        ColorFrame {
            width: msg.width,
            height: msg.height,
            encoding: msg.encoding,
            step: msg.step,
            data: msg.data,
        }
    }
}

/// Build an image message carrying `frame`
pub fn to_image_msg(frame: ColorFrame, at: DateTime<Utc>, frame_id: &str) -> Image {
    Image {
        header: Header {
            stamp: stamp(at),
            frame_id: frame_id.to_string(),
        },
        height: frame.height,
        width: frame.width,
        encoding: frame.encoding,
        is_bigendian: 0,
        step: frame.step,
        data: frame.data,
    }
}

/// Process callbacks until `shutdown` is raised
pub async fn spin_until(node: &mut r2r::Node, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        node.spin_once(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
