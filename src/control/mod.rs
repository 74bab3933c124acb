//! Command state for the car
//!
//! Holds the current (speed, angle) pair, applies the clamping policy and
//! forwards every accepted change to the CAN encoder.

mod can;

pub use can::*;

use log::info;
use std::sync::{Mutex, MutexGuard};

/// Speed bounds (inclusive)
pub const SPEED_LIMIT: i32 = 100;
/// Steering angle bounds (inclusive)
pub const ANGLE_LIMIT: i32 = 90;

/// A speed/steering pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Speed in [-100, 100]
    pub speed: i32,
    /// Steering angle in [-90, 90]
    pub angle: i32,
}

impl Command {
    /// Build a command without clamping
    pub fn new(speed: i32, angle: i32) -> Self {
        Command { speed, angle }
    }

    /// Same command with both fields forced into their bounds
    pub fn clamped(self) -> Self {
        Command {
            speed: self.speed.clamp(-SPEED_LIMIT, SPEED_LIMIT),
            angle: self.angle.clamp(-ANGLE_LIMIT, ANGLE_LIMIT),
        }
    }
}

/// Result of a `control` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Requested pair equals the current one; nothing was sent
    Unchanged,
    /// State updated and the frame went out
    Sent(Command),
    /// State updated but the transmit failed
    SendFailed(Command),
}

struct Inner {
    current: Command,
    encoder: CanEncoder,
}

/// Current drive command, shared between the input thread and the frame callback
pub struct CommandState {
    inner: Mutex<Inner>,
}

impl CommandState {
    /// Create the state at `initial` (clamped). Nothing is transmitted yet.
    pub fn new(initial: Command, encoder: CanEncoder) -> Self {
        CommandState {
            inner: Mutex::new(Inner {
                current: initial.clamped(),
                encoder,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the scalars out of bounds.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Consistent snapshot of (speed, angle)
    pub fn current(&self) -> Command {
        self.lock().current
    }

    /// Current speed
    pub fn speed(&self) -> i32 {
        self.current().speed
    }

    /// Current steering angle
    pub fn angle(&self) -> i32 {
        self.current().angle
    }

    /// Transmit the current state once, used when the node comes up
    pub fn announce(&self) -> ControlOutcome {
        let mut inner = self.lock();
        let current = inner.current;
        match inner.encoder.send(current) {
            Ok(_) => ControlOutcome::Sent(current),
            Err(_) => ControlOutcome::SendFailed(current),
        }
    }

    /// Request a new (speed, angle).
    ///
    /// The unclamped request is compared with the current state first; an
    /// identical request is a silent no-op. Otherwise the request is clamped,
    /// stored, and sent, even when clamping lands back on the previous value.
    pub fn control(&self, speed: i32, angle: i32) -> ControlOutcome {
        let mut inner = self.lock();
        let requested = Command::new(speed, angle);
        if requested == inner.current {
            return ControlOutcome::Unchanged;
        }
        info!("{}, {}", speed, angle);

        let accepted = requested.clamped();
        inner.current = accepted;
        match inner.encoder.send(accepted) {
            Ok(_) => ControlOutcome::Sent(accepted),
            Err(_) => ControlOutcome::SendFailed(accepted),
        }
    }
}
