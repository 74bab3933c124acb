// src/main.rs
// Entry point for the driving node: joystick -> CAN, plus gated frame capture.

use bramy::control::SocketCanBus;
use bramy::input::GilrsJoystick;
use bramy::ros_interface::{FrameSubscriber, qos, spin_until};
use bramy::{
    CanEncoder, CaptureGate, CarConfig, CarError, Command, CommandState, FramePersister, FrameRecorder,
    InputDispatcher, InputThread,
};
use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Drive the car from a joystick and record camera frames on demand
#[derive(Parser)]
#[command(name = "get_control", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = CarConfig::load_or_default(args.config.as_deref())?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))?;
    }

    // Joystick first: a missing device aborts before the bus is touched
    let input = InputThread::start(GilrsJoystick::open, shutdown.clone())?;

    // CAN bus and initial command
    let bus = SocketCanBus::open(&config.can.channel)?;
    info!("CAN bus open on {}", bus.channel());
    let encoder = CanEncoder::with_id(config.can.arbitration_id, Box::new(bus));
    let initial = Command::new(config.control.initial_speed, config.control.initial_angle);
    let state = Arc::new(CommandState::new(initial, encoder));
    state.announce();

    let gate = Arc::new(CaptureGate::new());
    let dispatcher = InputDispatcher::with_config(state.clone(), gate.clone(), &config.control);
    let input = input.attach(dispatcher);

    let persister = FramePersister::with_quality(config.target_dir(), config.capture.jpeg_quality);
    info!("Captured frames go to {}", persister.target_dir().display());
    let recorder = FrameRecorder::new(gate, state, persister);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async {
        let ctx = r2r::Context::create()?;
        let mut node = r2r::Node::create(ctx, &config.ros.node_name, "")?;
        let subscriber = FrameSubscriber::new(&mut node, &config.ros.image_topic, qos(config.ros.qos_depth))?;
        info!("Subscribed to {}", subscriber.topic());

        tokio::task::spawn_local(subscriber.run(recorder));
        spin_until(&mut node, &shutdown).await;
        Ok::<(), CarError>(())
    })?;

    let _ = input.join();
    info!("get_control stopped");
    Ok(())
}
