//! Bouncing box demo
//!
//! Runs a headless arena with a velocity system, an edge-bounce system and a
//! box whose body is spawned by a mount effect and destroyed on shutdown.
//! Pass a `.toml` or `.ron` config path as the first argument; otherwise
//! `bounce_demo.toml` is used if present.

mod arena;
mod config;
mod systems;

use frame_scheduler::prelude::*;

use crate::arena::{Arena, Display};
use crate::config::DemoConfig;
use crate::systems::{screen_bounce, spawn_point, velocity, BouncingBox, ScreenBounceConfig};

const DEFAULT_CONFIG_PATH: &str = "bounce_demo.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = DemoConfig::load_or_default(&path)?;
    log::info!("Starting bounce demo with {:?}", config);

    let arena = Arena::new(Display {
        width: config.display.width,
        height: config.display.height,
    });
    let mut scheduler = Scheduler::with_config(arena, config.scheduler.clone());
    scheduler.world_mut().provide_class::<ScreenBounceConfig>();

    let spawn = scheduler.add_named_system("spawn_point", spawn_point)?;
    scheduler.add_named_system("velocity", velocity)?;
    scheduler.add_named_system("screen_bounce", screen_bounce)?;
    let bouncing = BouncingBox::new(config.simulation.speed);
    scheduler.add_named_system("bouncing_box", bouncing.into_system(spawn))?;

    let frames = config.simulation.frames;
    let failures = scheduler.run(|world, report| {
        for failure in &report.failures {
            log::error!("Effect failure in frame {}: {}", report.frame, failure.error);
        }
        if report.frame % 60 == 0 {
            let bodies = world.state.bodies.borrow();
            log::info!(
                "Frame {}: {} bodies, dt {:.2} ms",
                report.frame,
                bodies.len(),
                world.frame.delta_time
            );
            for (id, body) in bodies.iter() {
                log::info!("  {:?} at ({:.1}, {:.1})", id, body.x, body.y);
            }
        }
        frames == 0 || report.frame < frames
    })?;

    for failure in failures {
        log::error!("Effect failure during shutdown: {}", failure.error);
    }
    log::info!("Bounce demo finished after {} frames", scheduler.frame_count());
    Ok(())
}
