// src/input/gamepad.rs
// Reads button events from the first connected gamepad through gilrs.

use gilrs::{Button as PadButton, EventType, Gilrs};
use log::info;

use super::{ButtonEvent, ButtonSource, InputError};

/// Gamepad source backed by gilrs
pub struct GilrsJoystick {
    gilrs: Gilrs,
}

impl GilrsJoystick {
    /// Start gilrs and require at least one connected gamepad
    pub fn open() -> Result<Self, InputError> {
        let gilrs = Gilrs::new().map_err(|e| InputError::Backend(e.to_string()))?;

        let name = match gilrs.gamepads().next() {
            Some((_, gamepad)) => gamepad.name().to_string(),
            None => return Err(InputError::NoJoystick),
        };
        info!("Joystick connected: {}", name);

        Ok(GilrsJoystick { gilrs })
    }
}

impl ButtonSource for GilrsJoystick {
    fn poll_event(&mut self) -> Option<ButtonEvent> {
        while let Some(event) = self.gilrs.next_event() {
            match event.event {
                EventType::ButtonPressed(button, _) => return Some(ButtonEvent::down(button_to_id(button))),
                EventType::ButtonReleased(button, _) => return Some(ButtonEvent::up(button_to_id(button))),
                EventType::Connected => info!("Gamepad {} connected", usize::from(event.id)),
                EventType::Disconnected => info!("Gamepad {} disconnected", usize::from(event.id)),
                // Axes, repeats and analog button changes are not used
                _ => {}
            }
        }
        None
    }
}

/// Button index in the layout the dispatcher table expects
fn button_to_id(button: PadButton) -> u32 {
    match button {
        PadButton::South => 0,
        PadButton::East => 1,
        PadButton::C => 2,
        PadButton::West => 3,
        PadButton::North => 4,
        PadButton::Z => 5,
        PadButton::LeftTrigger => 6,
        PadButton::RightTrigger => 7,
        PadButton::LeftTrigger2 => 8,
        PadButton::RightTrigger2 => 9,
        PadButton::LeftThumb => 10,
        PadButton::RightThumb => 11,
        PadButton::Select => 12,
        PadButton::Start => 13,
        PadButton::Mode => 14,
        PadButton::DPadUp => 15,
        PadButton::DPadDown => 16,
        PadButton::DPadLeft => 17,
        PadButton::DPadRight => 18,
        _ => 255,
    }
}
