// src/bin/camera_publisher.rs
// Republishes camera frames on the image topic at a fixed rate.

use bramy::camera::V4lCamera;
use bramy::ros_interface::{ImagePublisher, qos, spin_until};
use bramy::{CameraPublisher, CarConfig, CarError};
use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Publish color frames from the car's camera
#[derive(Parser)]
#[command(name = "camera_publisher", version, about)]
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

    let camera = V4lCamera::open(&config.camera)?;
    let mut publisher = CameraPublisher::new(camera, config.camera.frame_rate);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async {
        let ctx = r2r::Context::create()?;
        let mut node = r2r::Node::create(ctx, &config.camera.node_name, "")?;
        let images = ImagePublisher::new(&mut node, &config.ros.image_topic, qos(config.ros.qos_depth))?;
        let mut timer = node.create_wall_timer(publisher.period())?;
        info!("Publishing {} every {:?}", config.ros.image_topic, publisher.period());

        // Per-frame failures are logged inside tick; the timer keeps running
        tokio::task::spawn_local(async move {
            while timer.tick().await.is_ok() {
                publisher.tick(|frame| images.publish(frame));
            }
        });

        spin_until(&mut node, &shutdown).await;
        Ok::<(), CarError>(())
    })?;

    info!("camera_publisher stopped");
    Ok(())
}
