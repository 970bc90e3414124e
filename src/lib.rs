#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A headless, chunk-based voxel world core: deterministic terrain
//! generation, background meshing with per-vertex baked lighting, and
//! radius-based streaming of chunks around a moving player.
//!
//! The crate deliberately owns no window, GPU device or network socket.
//! It produces plain `f32`/`u32` geometry buffers and a stream of
//! attach/detach commands; rendering, persistence and input are external
//! collaborators talking to the [`world::ChunkManager`].
//!
//! ## Key Modules
//!
//! * `coords` - Mappings between world, voxel, chunk and chunk-local space
//! * `block` - The block registry: ids, face visibility, atlas layout
//! * `chunk` - Chunk lifecycle metadata plus the padded voxel/light grids
//! * `terrain` - Seeded, pure terrain functions and the generation strategies
//! * `lighting` - Sunlight/torchlight flood fill and smooth vertex sampling
//! * `mesher` - Face-culling geometry construction from grid snapshots
//! * `worker` - The job enums and the fixed thread pool executing them
//! * `world` - The chunk manager, configuration and persistence payloads
//!
//! ## Architecture
//!
//! A single control thread owns all chunk state. Expensive work (terrain
//! generation, meshing) runs on worker pools fed by value-passing jobs:
//! each job carries a snapshot of exactly the data it needs, each result
//! travels back by value and is applied on the control thread. Versioned
//! chunks make out-of-order and stale completions safe to discard, so the
//! whole pipeline needs no locks around world data.
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::Point3;
//! use voxel_world::{ChunkManager, WorldConfig};
//!
//! let mut world = ChunkManager::new(WorldConfig::default()).unwrap();
//!
//! // Call once per frame / simulation step with the player position.
//! world.tick(Point3::new(0.0, 24.0, 0.0));
//!
//! // Forward the produced geometry to whatever renders it.
//! for command in world.drain_render_commands() {
//!     match command {
//!         voxel_world::RenderCommand::Attach { chunk_name, buffers } => {
//!             let _ = (chunk_name, buffers.vertex_count());
//!         }
//!         voxel_world::RenderCommand::Detach { chunk_name } => {
//!             let _ = chunk_name;
//!         }
//!     }
//! }
//! ```

pub mod block;
pub mod chunk;
pub mod coords;
pub mod error;
pub mod lighting;
pub mod mesher;
pub mod terrain;
pub mod worker;
pub mod world;

pub use block::block_type::BlockType;
pub use error::WorldError;
pub use mesher::MeshBuffers;
pub use terrain::GenerationStrategy;
pub use world::{
    BlockRegistryEntry, ChunkManager, ChunkPayload, RenderCommand, WorldConfig, WorldPayload,
};
