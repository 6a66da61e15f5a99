//! Headless arena game running on top of the Bloodshed ECS

use std::error::Error;

use arena::Arena;
use config::{Config, ENGINE_VERSION};

mod arena;
mod config;
mod logger;

/// Entry point of the `bloodshed` arena
fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let (config, rejected) = Config::from_env();
    let _handle = logger::init(config.log_level())?;
    log::info!("logger initialized successfully");
    for var in rejected {
        log::warn!("{}", var);
    }

    log::info!(
        "{} v{} (engine v{}): {} frames of {:.4}s",
        config.name(),
        config.version(),
        *ENGINE_VERSION,
        config.frames(),
        config.frame_time(),
    );

    let mut arena = Arena::new();
    for _ in 0..config.frames() {
        arena.step(config.frame_time());
    }
    arena.report();

    let roster = arena.roster();
    log::info!(
        "finished with {} kills, {} players and {} enemies left",
        arena.kills(),
        roster.players,
        roster.enemies,
    );
    Ok(())
}
