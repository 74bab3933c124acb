// src/control/can.rs
// Packs a (speed, angle) command into the car's single CAN frame and owns the transmit call.

use log::{debug, error};
use socketcan::{CanDataFrame, CanSocket, EmbeddedFrame, Socket, StandardId};

use super::Command;

/// Arbitration id of the drive command frame
pub const COMMAND_FRAME_ID: u16 = 0x21;

/// Largest 11-bit arbitration id
pub const MAX_STANDARD_ID: u16 = 0x7FF;

/// Offset added to the angle so the transmitted field stays non-negative
pub const ANGLE_OFFSET: i32 = 90;

/// CAN error types
#[derive(Debug, thiserror::Error)]
pub enum CanError {
    /// Socket could not be opened on the interface
    #[error("cannot open CAN interface {channel}: {source}")]
    Open {
        /// Interface name
        channel: String,
        /// Underlying socket error
        source: std::io::Error,
    },
    /// Frame was not written to the bus
    #[error("Message NOT sent: {0}")]
    Transmit(String),
    /// Id does not fit a standard frame
    #[error("arbitration id {0:#x} is not a standard 11-bit id")]
    InvalidId(u16),
}

/// The 4-byte drive command: `int16be(speed) ++ int16be(90 + angle)`, standard id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    /// Arbitration id
    pub id: u16,
    /// Payload bytes
    pub data: [u8; 4],
}

impl CommandFrame {
    /// Encode a command with the given arbitration id. Out-of-range
    /// fields are clamped first so they never wrap in the 16-bit fields.
    pub fn encode(id: u16, command: Command) -> Self {
        let command = command.clamped();
        let speed = command.speed as i16;
        let angle = (ANGLE_OFFSET + command.angle) as i16;
        let [s0, s1] = speed.to_be_bytes();
        let [a0, a1] = angle.to_be_bytes();
        CommandFrame {
            id,
            data: [s0, s1, a0, a1],
        }
    }

    /// Decode the payload back into a command
    pub fn decode(&self) -> Command {
        let speed = i16::from_be_bytes([self.data[0], self.data[1]]) as i32;
        let angle = i16::from_be_bytes([self.data[2], self.data[3]]) as i32 - ANGLE_OFFSET;
        Command { speed, angle }
    }

    /// Extended frames are never used
    pub fn is_extended(&self) -> bool {
        false
    }
}

/// Anything that can put a command frame on the wire
pub trait CanBus {
    /// Transmit one frame, fire-and-forget
    fn transmit(&mut self, frame: &CommandFrame) -> Result<(), CanError>;
}

/// Builds frames for a fixed id and hands them to the bus
pub struct CanEncoder {
    id: u16,
    bus: Box<dyn CanBus + Send>,
}

impl CanEncoder {
    /// Create an encoder for the default drive frame id
    pub fn new(bus: Box<dyn CanBus + Send>) -> Self {
        Self::with_id(COMMAND_FRAME_ID, bus)
    }

    /// Create an encoder for a custom arbitration id
    pub fn with_id(id: u16, bus: Box<dyn CanBus + Send>) -> Self {
        CanEncoder { id, bus }
    }

    /// Encode and transmit. Failures are logged and reported, never retried.
    pub fn send(&mut self, command: Command) -> Result<CommandFrame, CanError> {
        let frame = CommandFrame::encode(self.id, command);
        match self.bus.transmit(&frame) {
            Ok(()) => {
                debug!("Sent CAN frame {:#05x} {:02X?}", frame.id, frame.data);
                Ok(frame)
            }
            Err(e) => {
                error!("{}", e);
                Err(e)
            }
        }
    }
}

/// SocketCAN-backed bus
pub struct SocketCanBus {
    socket: CanSocket,
    channel: String,
}

impl SocketCanBus {
    /// Open a raw CAN socket on `channel` (e.g. `can0`)
    pub fn open(channel: &str) -> Result<Self, CanError> {
        let socket = CanSocket::open(channel).map_err(|source| CanError::Open {
            channel: channel.to_string(),
            source,
        })?;
        Ok(SocketCanBus {
            socket,
            channel: channel.to_string(),
        })
    }

    /// Interface this bus writes to
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl CanBus for SocketCanBus {
    fn transmit(&mut self, frame: &CommandFrame) -> Result<(), CanError> {
        let id = StandardId::new(frame.id).ok_or(CanError::InvalidId(frame.id))?;
        let can_frame = CanDataFrame::new(id, &frame.data)
            .ok_or_else(|| CanError::Transmit("payload does not fit a CAN frame".to_string()))?;
        self.socket
            .write_frame(&can_frame)
            .map_err(|e| CanError::Transmit(e.to_string()))
    }
}
