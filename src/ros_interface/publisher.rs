use chrono::Utc;
use r2r::QosProfile;
use r2r::sensor_msgs::msg::Image;

use super::to_image_msg;
use crate::capture::ColorFrame;

// Image topic publisher
pub struct ImagePublisher {
    inner: r2r::Publisher<Image>,
    frame_id: String,
}

impl ImagePublisher {
    // Create a new publisher on the given topic with specified QoS
    pub fn new(node: &mut r2r::Node, topic: &str, qos: QosProfile) -> Result<Self, r2r::Error> {
        let publisher = node.create_publisher::<Image>(topic, qos)?;
        Ok(ImagePublisher {
            inner: publisher,
            frame_id: "camera_color_frame".to_string(),
        })
    }

    // Publish a frame stamped with the current time
    pub fn publish(&self, frame: ColorFrame) -> Result<(), r2r::Error> {
        self.inner.publish(&to_image_msg(frame, Utc::now(), &self.frame_id))
    }
}
