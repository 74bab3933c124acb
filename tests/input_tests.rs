use bramy::control::ControlOutcome;
use bramy::input::{button_label, Action};
use bramy::{
    Button, ButtonEvent, ButtonSource, CanBus, CanEncoder, CanError, CaptureGate, Command, CommandFrame,
    CommandState, ControlConfig, InputDispatcher, InputError, InputThread,
};
use rstest::rstest;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct RecordingBus {
    frames: Arc<Mutex<Vec<CommandFrame>>>,
}

impl CanBus for RecordingBus {
    fn transmit(&mut self, frame: &CommandFrame) -> Result<(), CanError> {
        self.frames.lock().unwrap().push(*frame);
        Ok(())
    }
}

// Replays a fixed list of events, then raises shutdown
struct ScriptedSource {
    events: VecDeque<ButtonEvent>,
    shutdown: Arc<AtomicBool>,
}

impl ButtonSource for ScriptedSource {
    fn poll_event(&mut self) -> Option<ButtonEvent> {
        let event = self.events.pop_front();
        if event.is_none() {
            self.shutdown.store(true, Ordering::SeqCst);
        }
        event
    }
}

// Never yields events; records when the device handle is dropped
struct ReleasingSource {
    released: Arc<AtomicBool>,
}

impl ButtonSource for ReleasingSource {
    fn poll_event(&mut self) -> Option<ButtonEvent> {
        None
    }
}

impl Drop for ReleasingSource {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

struct Rig {
    state: Arc<CommandState>,
    gate: Arc<CaptureGate>,
    frames: Arc<Mutex<Vec<CommandFrame>>>,
    dispatcher: InputDispatcher,
}

fn rig(speed: i32, angle: i32) -> Rig {
    let bus = RecordingBus::default();
    let frames = bus.frames.clone();
    let state = Arc::new(CommandState::new(Command::new(speed, angle), CanEncoder::new(Box::new(bus))));
    let gate = Arc::new(CaptureGate::new());
    let dispatcher = InputDispatcher::new(state.clone(), gate.clone());
    Rig { state, gate, frames, dispatcher }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest]
    #[case(0, Some(Button::A), "A")]
    #[case(1, Some(Button::B), "B")]
    #[case(3, Some(Button::X), "X")]
    #[case(4, Some(Button::Y), "Y")]
    #[case(10, Some(Button::LeftStick), "Left Stick")]
    #[case(11, Some(Button::RightStick), "Right Stick")]
    #[case(2, None, "Unknown 2")]
    #[case(7, None, "Unknown 7")]
    fn test_button_table(#[case] id: u32, #[case] button: Option<Button>, #[case] label: &str) {
        assert_eq!(Button::from_id(id), button);
        assert_eq!(button_label(id), label);
        if let Some(button) = button {
            assert_eq!(button.id(), id);
        }
    }

    #[test]
    fn test_press_a_from_initial_state() {
        let rig = rig(0, 90);
        rig.dispatcher.handle(ButtonEvent::down(0));
        assert_eq!(rig.state.current(), Command::new(-25, 90));

        let frames = rig.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, [0xFF, 0xE7, 0x00, 0xB4]);
    }

    #[test]
    fn test_speed_and_steering_buttons() {
        let rig = rig(0, 0);
        rig.dispatcher.handle(ButtonEvent::down(4));
        assert_eq!(rig.state.current(), Command::new(25, 0));
        rig.dispatcher.handle(ButtonEvent::down(3));
        assert_eq!(rig.state.current(), Command::new(25, -10));
        rig.dispatcher.handle(ButtonEvent::down(1));
        rig.dispatcher.handle(ButtonEvent::down(1));
        assert_eq!(rig.state.current(), Command::new(25, 10));
    }

    #[test]
    fn test_steering_saturates() {
        let rig = rig(0, 80);
        for _ in 0..5 {
            rig.dispatcher.handle(ButtonEvent::down(1));
        }
        assert_eq!(rig.state.angle(), 90);
    }

    #[rstest]
    #[case(25)]
    #[case(0)]
    #[case(-100)]
    fn test_release_y_always_commands_reverse(#[case] speed: i32) {
        let rig = rig(speed, 30);
        rig.dispatcher.handle(ButtonEvent::up(4));
        assert_eq!(rig.state.current(), Command::new(-25, 30));
    }

    #[test]
    fn test_other_releases_are_ignored() {
        let rig = rig(0, 0);
        for id in [0, 1, 3, 10, 11, 7] {
            assert_eq!(rig.dispatcher.handle(ButtonEvent::up(id)), None);
        }
        assert!(rig.frames.lock().unwrap().is_empty());
        assert!(!rig.gate.is_open());
    }

    #[test]
    fn test_unknown_press_is_inert() {
        let rig = rig(0, 0);
        assert_eq!(rig.dispatcher.handle(ButtonEvent::down(2)), None);
        assert_eq!(rig.dispatcher.handle(ButtonEvent::down(99)), None);
        assert_eq!(rig.state.current(), Command::new(0, 0));
        assert!(rig.frames.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stick_buttons_toggle_gate() {
        let rig = rig(0, 0);
        assert_eq!(rig.dispatcher.handle(ButtonEvent::down(11)), Some(Action::CaptureStarted));
        assert!(rig.gate.is_open());
        assert_eq!(rig.dispatcher.handle(ButtonEvent::down(11)), Some(Action::CaptureStarted));
        assert!(rig.gate.is_open());
        assert_eq!(rig.dispatcher.handle(ButtonEvent::down(10)), Some(Action::CaptureStopped));
        assert!(!rig.gate.is_open());
    }

    #[test]
    fn test_repeated_press_is_unchanged() {
        let rig = rig(0, 0);
        rig.dispatcher.handle(ButtonEvent::down(0));
        assert_eq!(
            rig.dispatcher.handle(ButtonEvent::down(0)),
            Some(Action::Control(ControlOutcome::Unchanged))
        );
        assert_eq!(rig.frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_configured_steps() {
        let bus = RecordingBus::default();
        let state = Arc::new(CommandState::new(Command::new(0, 0), CanEncoder::new(Box::new(bus))));
        let config = ControlConfig {
            speed_step: 50,
            angle_step: 30,
            ..ControlConfig::default()
        };
        let dispatcher = InputDispatcher::with_config(state.clone(), Arc::new(CaptureGate::new()), &config);
        dispatcher.handle(ButtonEvent::down(4));
        dispatcher.handle(ButtonEvent::down(3));
        assert_eq!(state.current(), Command::new(50, -30));
    }

    #[test]
    fn test_run_drains_source_until_shutdown() {
        let rig = rig(0, 0);
        let shutdown = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource {
            events: VecDeque::from(vec![ButtonEvent::down(4), ButtonEvent::up(4), ButtonEvent::down(11)]),
            shutdown: shutdown.clone(),
        };
        rig.dispatcher.run(source, &shutdown);

        assert_eq!(rig.state.current(), Command::new(-25, 0));
        assert_eq!(rig.frames.lock().unwrap().len(), 2);
        assert!(rig.gate.is_open());
    }

    #[test]
    fn test_spawn_runs_on_thread() {
        let rig = rig(0, 0);
        let state = rig.state.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let source_shutdown = shutdown.clone();
        let handle = rig
            .dispatcher
            .spawn(
                move || {
                    Ok(ScriptedSource {
                        events: VecDeque::from(vec![ButtonEvent::down(3)]),
                        shutdown: source_shutdown,
                    })
                },
                shutdown,
            )
            .unwrap();
        handle.join().unwrap();
        assert_eq!(state.angle(), -10);
    }

    #[test]
    fn test_spawn_reports_missing_joystick() {
        let rig = rig(0, 0);
        let result = rig
            .dispatcher
            .spawn(|| Err::<ScriptedSource, _>(InputError::NoJoystick), Arc::new(AtomicBool::new(false)));
        assert!(matches!(result, Err(InputError::NoJoystick)));
    }

    #[test]
    fn test_input_thread_opens_device_before_dispatcher_exists() {
        let opened = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (flag, source_shutdown) = (opened.clone(), shutdown.clone());
        let input = InputThread::start(
            move || {
                flag.store(true, Ordering::SeqCst);
                Ok(ScriptedSource {
                    events: VecDeque::from(vec![ButtonEvent::down(0)]),
                    shutdown: source_shutdown,
                })
            },
            shutdown,
        )
        .unwrap();
        assert!(opened.load(Ordering::SeqCst));

        // State and bus are only built after the device is known to exist
        let rig = rig(0, 90);
        input.attach(rig.dispatcher).join().unwrap();
        assert_eq!(rig.state.current(), Command::new(-25, 90));
        assert_eq!(rig.frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_input_thread_missing_joystick_fails_start() {
        let result = InputThread::start(
            || Err::<ScriptedSource, _>(InputError::NoJoystick),
            Arc::new(AtomicBool::new(false)),
        );
        assert!(matches!(result, Err(InputError::NoJoystick)));
    }

    #[test]
    fn test_input_thread_dropped_without_dispatcher_releases_device() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let input = InputThread::start(
            move || Ok(ReleasingSource { released: flag }),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        drop(input);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !released.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(released.load(Ordering::SeqCst));
    }
}
