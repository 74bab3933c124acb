//! Joystick input for the car
//!
//! Maps raw button events to drive commands and capture toggles:
//! - A / Y set reverse / forward speed
//! - X / B steer by one step
//! - Right stick opens the capture gate, left stick closes it

#[cfg(feature = "gamepad")]
mod gamepad;

#[cfg(feature = "gamepad")]
pub use gamepad::GilrsJoystick;

use log::{error, info};
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::capture::CaptureGate;
use crate::control::{CommandState, ControlOutcome};
use crate::ControlConfig;

/// Input error types
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// No gamepad is plugged in
    #[error("No joystick detected!")]
    NoJoystick,
    /// Gamepad backend failed to start
    #[error("joystick backend error: {0}")]
    Backend(String),
    /// Polling thread exited before reporting
    #[error("input thread stopped during startup")]
    ThreadStopped,
}

/// Press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Button pressed
    Down,
    /// Button released
    Up,
}

/// A raw button notification from the joystick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Device button index
    pub button_id: u32,
    /// Press or release
    pub phase: Phase,
}

impl ButtonEvent {
    /// Button pressed
    pub fn down(button_id: u32) -> Self {
        ButtonEvent { button_id, phase: Phase::Down }
    }

    /// Button released
    pub fn up(button_id: u32) -> Self {
        ButtonEvent { button_id, phase: Phase::Up }
    }
}

/// The buttons the car reacts to (Xbox 360 style layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Reverse
    A,
    /// Steer right
    B,
    /// Steer left
    X,
    /// Forward
    Y,
    /// Stop capturing
    LeftStick,
    /// Start capturing
    RightStick,
}

impl Button {
    /// Look up a device button index
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Button::A),
            1 => Some(Button::B),
            3 => Some(Button::X),
            4 => Some(Button::Y),
            10 => Some(Button::LeftStick),
            11 => Some(Button::RightStick),
            _ => None,
        }
    }

    /// Device button index
    pub fn id(self) -> u32 {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::X => 3,
            Button::Y => 4,
            Button::LeftStick => 10,
            Button::RightStick => 11,
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::LeftStick => "Left Stick",
            Button::RightStick => "Right Stick",
        }
    }
}

/// Display name for any button index, `Unknown <id>` for unmapped ones
pub fn button_label(id: u32) -> Cow<'static, str> {
    match Button::from_id(id) {
        Some(button) => Cow::Borrowed(button.name()),
        None => Cow::Owned(format!("Unknown {}", id)),
    }
}

/// Source of joystick button events
pub trait ButtonSource {
    /// Next pending event, `None` when the queue is drained
    fn poll_event(&mut self) -> Option<ButtonEvent>;
}

/// What a handled event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A drive command was requested
    Control(ControlOutcome),
    /// The capture gate was opened
    CaptureStarted,
    /// The capture gate was closed
    CaptureStopped,
}

/// Turns button events into commands and gate toggles
pub struct InputDispatcher {
    state: Arc<CommandState>,
    gate: Arc<CaptureGate>,
    speed_step: i32,
    angle_step: i32,
    poll_interval: Duration,
}

impl InputDispatcher {
    /// Dispatcher with the default steps (speed 25, angle 10)
    pub fn new(state: Arc<CommandState>, gate: Arc<CaptureGate>) -> Self {
        Self::with_config(state, gate, &ControlConfig::default())
    }

    /// Dispatcher with configured steps
    pub fn with_config(state: Arc<CommandState>, gate: Arc<CaptureGate>, config: &ControlConfig) -> Self {
        InputDispatcher {
            state,
            gate,
            speed_step: config.speed_step,
            angle_step: config.angle_step,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Apply one event. Returns `None` for events with no effect.
    pub fn handle(&self, event: ButtonEvent) -> Option<Action> {
        let button = Button::from_id(event.button_id);
        match event.phase {
            Phase::Down => {
                let action = button.map(|button| self.press(button));
                info!("Button Pressed: {}", button_label(event.button_id));
                action
            }
            Phase::Up => match button {
                // Releasing forward issues the same command as pressing reverse
                Some(Button::Y) => {
                    let outcome = self.state.control(-self.speed_step, self.state.angle());
                    info!("Stop");
                    Some(Action::Control(outcome))
                }
                _ => None,
            },
        }
    }

    fn press(&self, button: Button) -> Action {
        let current = self.state.current();
        match button {
            Button::A => Action::Control(self.state.control(-self.speed_step, current.angle)),
            Button::Y => Action::Control(self.state.control(self.speed_step, current.angle)),
            Button::X => Action::Control(self.state.control(current.speed, current.angle - self.angle_step)),
            Button::B => Action::Control(self.state.control(current.speed, current.angle + self.angle_step)),
            Button::RightStick => {
                info!("Start camera");
                self.gate.open();
                Action::CaptureStarted
            }
            Button::LeftStick => {
                self.gate.close();
                info!("Stop camera");
                Action::CaptureStopped
            }
        }
    }

    /// Drain `source` until `shutdown` is raised, sleeping between empty polls.
    /// The source is dropped (and the device released) on return.
    pub fn run<S: ButtonSource>(&self, mut source: S, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::SeqCst) {
            match source.poll_event() {
                Some(event) => {
                    self.handle(event);
                }
                None => thread::sleep(self.poll_interval),
            }
        }
        info!("Exiting...");
    }

    /// Run on a dedicated thread. `open` creates the source on that thread;
    /// its result is returned here before any event is processed, so a
    /// missing joystick still fails startup.
    pub fn spawn<S, F>(self, open: F, shutdown: Arc<AtomicBool>) -> Result<JoinHandle<()>, InputError>
    where
        S: ButtonSource,
        F: FnOnce() -> Result<S, InputError> + Send + 'static,
    {
        Ok(InputThread::start(open, shutdown)?.attach(self))
    }
}

/// Joystick polling thread whose device is opened before any dispatcher exists.
///
/// `start` opens the source and reports the result; the thread then waits
/// for `attach` to hand it the dispatcher. Dropping the `InputThread`
/// without attaching stops the thread and releases the device.
pub struct InputThread {
    handle: JoinHandle<()>,
    dispatcher_tx: mpsc::Sender<InputDispatcher>,
}

impl InputThread {
    /// Spawn the thread and open the source on it
    pub fn start<S, F>(open: F, shutdown: Arc<AtomicBool>) -> Result<Self, InputError>
    where
        S: ButtonSource,
        F: FnOnce() -> Result<S, InputError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (dispatcher_tx, dispatcher_rx) = mpsc::channel::<InputDispatcher>();
        let handle = thread::Builder::new()
            .name("joystick".to_string())
            .spawn(move || {
                let source = match open() {
                    Ok(source) => {
                        let _ = ready_tx.send(Ok(()));
                        source
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Ok(dispatcher) = dispatcher_rx.recv() {
                    dispatcher.run(source, &shutdown);
                }
            })
            .map_err(|e| InputError::Backend(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(InputThread { handle, dispatcher_tx }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                error!("Joystick thread exited during startup");
                Err(InputError::ThreadStopped)
            }
        }
    }

    /// Start dispatching events
    pub fn attach(self, dispatcher: InputDispatcher) -> JoinHandle<()> {
        let _ = self.dispatcher_tx.send(dispatcher);
        self.handle
    }
}
