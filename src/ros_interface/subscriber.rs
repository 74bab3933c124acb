// src/ros_interface/subscriber.rs
// Subscribes to the color image topic and hands each frame to the capture recorder.

use futures::{Stream, StreamExt};
use r2r::{Node, QosProfile};
use r2r::sensor_msgs::msg::Image;
use std::pin::Pin;

use crate::capture::{ColorFrame, FrameRecorder};

/// Stream of frames from the image topic
pub struct FrameSubscriber {
    stream: Pin<Box<dyn Stream<Item = Image> + Send>>,
    topic: String,
}

impl FrameSubscriber {
    /// Subscribe to `topic`
    pub fn new(node: &mut Node, topic: &str, qos: QosProfile) -> Result<Self, r2r::Error> {
        let stream = node.subscribe::<Image>(topic, qos)?;
        Ok(FrameSubscriber {
            stream: Box::pin(stream),
            topic: topic.to_string(),
        })
    }

    /// Topic name
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Feed every arriving frame to `recorder` until the topic closes
    pub async fn run(mut self, recorder: FrameRecorder) {
        while let Some(msg) = self.stream.next().await {
            recorder.on_frame(&ColorFrame::from(msg));
        }
    }
}
