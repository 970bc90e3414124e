//! # Headless World Walkthrough
//!
//! A small driver that exercises the world core without any renderer: it
//! builds a world (from a JSON configuration file if one is passed on the
//! command line, otherwise the defaults), walks a simulated player in a
//! straight line, and logs the attach/detach traffic a real frontend would
//! consume.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- [config.json]
//! ```

use cgmath::Point3;
use log::{error, info};
use std::time::Duration;

use voxel_world::{ChunkManager, RenderCommand, WorldConfig};

const WALK_STEPS: u32 = 400;
const STEP_LENGTH: f32 = 0.5;
const STEP_INTERVAL: Duration = Duration::from_millis(10);

fn load_config() -> Result<WorldConfig, String> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|err| format!("cannot read {path}: {err}"))?;
            WorldConfig::from_json(&json).map_err(|err| format!("bad config {path}: {err}"))
        }
        None => Ok(WorldConfig::default()),
    }
}

fn main() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(message) => {
            error!("{message}");
            std::process::exit(1);
        }
    };

    let mut world = match ChunkManager::new(config) {
        Ok(world) => world,
        Err(err) => {
            error!("world startup failed: {err}");
            std::process::exit(1);
        }
    };

    let mut position = Point3::new(0.0, 24.0, 0.0);
    let mut attached = 0u32;
    let mut detached = 0u32;
    let mut vertices = 0u64;

    for step in 0..WALK_STEPS {
        // Head east with a little sideways wander.
        position.x += STEP_LENGTH;
        position.z += (fastrand::f32() - 0.5) * STEP_LENGTH;
        world.tick(position);

        for command in world.drain_render_commands() {
            match command {
                RenderCommand::Attach { chunk_name, buffers } => {
                    attached += 1;
                    vertices += buffers.vertex_count() as u64;
                    info!(
                        "attach {chunk_name}: {} vertices, {} indices",
                        buffers.vertex_count(),
                        buffers.indices.len()
                    );
                }
                RenderCommand::Detach { chunk_name } => {
                    detached += 1;
                    info!("detach {chunk_name}");
                }
            }
        }

        if step % 100 == 0 {
            info!(
                "step {step}: {} chunks loaded, {} ready",
                world.loaded_chunk_count(),
                world.ready_chunk_count()
            );
        }
        std::thread::sleep(STEP_INTERVAL);
    }

    info!(
        "walk finished: {attached} meshes attached ({vertices} vertices total), {detached} detached, {} chunks resident",
        world.loaded_chunk_count()
    );
}
