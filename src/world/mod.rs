//! # World Module
//!
//! The [`ChunkManager`] is the stateful controller over the whole grid of
//! chunks: it owns the chunk map, decides which coordinates must be loaded
//! or unloaded as the player moves, dispatches generation and meshing jobs
//! to its worker pools, and applies the results back onto chunks.
//!
//! ## Threading model
//!
//! Everything in this module runs on the control thread. Workers only see
//! moved/cloned job payloads, and their outputs are applied here, one at a
//! time, so the chunk map needs no locks. The control thread never blocks
//! on a worker: [`ChunkManager::tick`] drains whatever has completed and
//! returns.
//!
//! ## Out-of-order completion
//!
//! Jobs for different chunks complete in any order; that is the normal
//! case, not an error. Every job carries the chunk version it was
//! dispatched for, and a result whose chunk has been unloaded (absent from
//! the map) or reloaded (version mismatch) is silently discarded on
//! arrival. There is no active cancellation.

pub mod config;
pub mod payload;

use cgmath::{Point3, Vector3};
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::block::block_side::BlockSide;
use crate::block::block_type::BlockType;
use crate::block::BlockId;
use crate::chunk::{CHUNK_MARGIN, Chunk, ChunkState};
use crate::coords;
use crate::error::WorldError;
use crate::lighting::{self, LightingConfig};
use crate::mesher::MeshBuffers;
use crate::terrain::TerrainGenerator;
use crate::worker::{Job, JobKind, JobOutput, WorkerContext, WorkerPool, default_worker_count};

pub use config::WorldConfig;
pub use payload::{BlockRegistryEntry, ChunkPayload, WorldPayload};

/// Signals emitted toward the rendering collaborator, keyed by the
/// canonical chunk name.
#[derive(Debug)]
pub enum RenderCommand {
    /// Attach (or replace) the geometry for a chunk.
    Attach {
        /// Canonical chunk name from [`coords::chunk_name`].
        chunk_name: String,
        /// The produced geometry buffers, transferred by value.
        buffers: MeshBuffers,
    },
    /// Drop the geometry for a chunk that left the load radius.
    Detach {
        /// Canonical chunk name of the chunk being unloaded.
        chunk_name: String,
    },
}

/// The stateful controller owning the loaded chunk set.
pub struct ChunkManager {
    config: WorldConfig,
    lighting: LightingConfig,
    chunks: HashMap<Point3<i32>, Chunk>,
    /// Player-edit overlay per chunk, kept across unloads so edits
    /// survive regeneration. Keys of the inner map are absolute voxels.
    changed_blocks: HashMap<Point3<i32>, HashMap<Point3<i32>, BlockId>>,
    /// Payloads handed in by the persistence collaborator, consumed when
    /// their coordinate enters the load radius.
    persisted: HashMap<Point3<i32>, ChunkPayload>,
    generation_pool: WorkerPool,
    /// Present only when the worker ceiling allows a second thread; with a
    /// ceiling of one the single generation worker serves mesh jobs too.
    meshing_pool: Option<WorkerPool>,
    render_commands: Vec<RenderCommand>,
    next_version: u64,
    last_position_check: Option<Instant>,
}

impl ChunkManager {
    /// Builds a world from a validated configuration, spawning both worker
    /// pools. This is the fail-fast point: a bad configuration or strategy
    /// errors here and no partial world is created.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let terrain = TerrainGenerator::new(config.seed, config.generation_strategy.clone())?;
        let lighting = config.lighting();

        let context = Arc::new(WorkerContext {
            terrain,
            chunk_size: config.chunk_size,
            block_dimension: config.block_dimension,
            lighting,
        });

        // Meshing dominates the steady-state workload, so it gets the
        // larger share; generation keeps at least one dedicated worker so
        // a meshing burst cannot starve chunk loading. The two pools
        // together never exceed the configured ceiling: with a ceiling of
        // one the single worker is shared between both job kinds.
        let total_workers = default_worker_count(config.max_worker_count);
        let (generation_pool, meshing_pool) = if total_workers < 2 {
            info!("starting world (seed {}): 1 shared worker", config.seed);
            (WorkerPool::new(1, context), None)
        } else {
            let generation_workers = (total_workers / 3).max(1);
            let meshing_workers = total_workers - generation_workers;
            info!(
                "starting world (seed {}): {generation_workers} generation + {meshing_workers} meshing workers",
                config.seed
            );
            (
                WorkerPool::new(generation_workers, context.clone()),
                Some(WorkerPool::new(meshing_workers, context)),
            )
        };

        Ok(ChunkManager {
            lighting,
            chunks: HashMap::new(),
            changed_blocks: HashMap::new(),
            persisted: HashMap::new(),
            generation_pool,
            meshing_pool,
            render_commands: Vec::new(),
            next_version: 0,
            last_position_check: None,
            config,
        })
    }

    /// The pool mesh jobs are dispatched to: the dedicated meshing pool
    /// when one exists, otherwise the shared generation pool.
    fn mesh_pool(&mut self) -> &mut WorkerPool {
        match self.meshing_pool.as_mut() {
            Some(pool) => pool,
            None => &mut self.generation_pool,
        }
    }

    /// One control-loop iteration.
    ///
    /// Always applies completed job results (and re-dispatches queued jobs
    /// onto freed workers); additionally runs the throttled position check
    /// that diffs the loaded chunk set against the player's load radius.
    pub fn tick(&mut self, player_position: Point3<f32>) {
        self.apply_completed();

        let due = match self.last_position_check {
            None => true,
            Some(at) => at.elapsed().as_millis() as u64 >= self.config.tick_interval_ms,
        };
        if due {
            self.last_position_check = Some(Instant::now());
            self.refresh_loaded_set(player_position);
        }
    }

    /// Takes the pending attach/detach signals for the rendering
    /// collaborator.
    pub fn drain_render_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.render_commands)
    }

    /// Hands the manager a persisted chunk payload. When the coordinate
    /// enters the load radius the payload is deserialized directly into
    /// the `Generated` state, skipping terrain generation.
    pub fn insert_payload(&mut self, payload: ChunkPayload) {
        self.persisted.insert(payload.position, payload);
    }

    /// Snapshots a loaded chunk for the persistence collaborator.
    ///
    /// # Returns
    /// `None` while the chunk is absent or still generating.
    pub fn chunk_payload(&self, position: Point3<i32>) -> Option<ChunkPayload> {
        let chunk = self.chunks.get(&position)?;
        let grid = chunk.grid.as_ref()?;
        let overlay = self
            .changed_blocks
            .get(&position)
            .map(|edits| edits.iter().map(|(voxel, id)| (*voxel, *id)).collect())
            .unwrap_or_default();
        Some(ChunkPayload::from_grid(position, grid, overlay))
    }

    /// The world-level parameters (seed, dimensions, block registry) a
    /// client needs to interpret chunk payloads.
    pub fn world_payload(&self) -> WorldPayload {
        WorldPayload::new(
            self.config.seed,
            self.config.chunk_size,
            self.config.block_dimension,
        )
    }

    /// The block type at an absolute voxel coordinate.
    ///
    /// # Returns
    /// `None` when the owning chunk is not loaded (or not yet generated),
    /// the sentinel "unknown". Callers pick their own conservative
    /// default; see [`ChunkManager::is_solid_at`].
    pub fn block_type_at(&self, voxel: Point3<i32>) -> Option<BlockType> {
        let position = coords::voxel_to_chunk(voxel, self.config.chunk_size);
        let chunk = self.chunks.get(&position)?;
        let grid = chunk.grid.as_ref()?;
        let local = coords::voxel_to_local(voxel, self.config.chunk_size);
        BlockType::from_id(grid.get(local))
    }

    /// Collision-oriented solidity query. Unknown voxels (unloaded chunks)
    /// count as solid so physics callers cannot fall through unloaded
    /// terrain.
    pub fn is_solid_at(&self, voxel: Point3<i32>) -> bool {
        self.block_type_at(voxel)
            .map(BlockType::is_solid)
            .unwrap_or(true)
    }

    /// Applies a block edit from the player/input collaborator.
    ///
    /// The target must lie in a loaded, `Ready` chunk. The voxel is
    /// mutated in place, mirrored into the margins of face-sharing
    /// neighbors, recorded in the persistent edit overlay, and every
    /// affected chunk is re-meshed with priority (the light re-flood runs
    /// as part of snapshotting each mesh job).
    ///
    /// # Returns
    /// `false` when the edit was rejected (chunk missing or not ready).
    pub fn set_block(&mut self, voxel: Point3<i32>, id: BlockId) -> bool {
        let size = self.config.chunk_size;
        let position = coords::voxel_to_chunk(voxel, size);
        let local = coords::voxel_to_local(voxel, size);

        let Some(chunk) = self.chunks.get_mut(&position) else {
            return false;
        };
        if chunk.state != ChunkState::Ready {
            return false;
        }
        let Some(grid) = chunk.grid.as_mut() else {
            return false;
        };

        grid.set(local, id);
        chunk.dirty = true;
        self.changed_blocks
            .entry(position)
            .or_default()
            .insert(voxel, id);

        let mut affected = vec![position];
        for side in BlockSide::all() {
            let offset = side.offset();
            let on_boundary = (offset.x == -1 && local.x == 0)
                || (offset.x == 1 && local.x == size - 1)
                || (offset.y == -1 && local.y == 0)
                || (offset.y == 1 && local.y == size - 1)
                || (offset.z == -1 && local.z == 0)
                || (offset.z == 1 && local.z == size - 1);
            if !on_boundary {
                continue;
            }
            let neighbor_position = position + offset;
            if let Some(neighbor) = self.chunks.get_mut(&neighbor_position) {
                if let Some(neighbor_grid) = neighbor.grid.as_mut() {
                    let neighbor_origin = coords::chunk_to_voxel(neighbor_position, size);
                    let neighbor_local = Point3::new(
                        voxel.x - neighbor_origin.x,
                        voxel.y - neighbor_origin.y,
                        voxel.z - neighbor_origin.z,
                    );
                    neighbor_grid.set(neighbor_local, id);
                    neighbor.dirty = true;
                    affected.push(neighbor_position);
                }
            }
        }

        for affected_position in affected {
            let state = self.chunks[&affected_position].state;
            if matches!(state, ChunkState::Ready | ChunkState::Generated) {
                self.enqueue_mesh(affected_position, true);
            }
            // A chunk currently meshing keeps its dirty flag; the stale
            // mesh result triggers the refresh when it arrives.
        }
        true
    }

    /// Number of chunks currently loaded (any state).
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of chunks in the `Ready` state.
    pub fn ready_chunk_count(&self) -> usize {
        self.chunks
            .values()
            .filter(|c| c.state == ChunkState::Ready)
            .count()
    }

    /// The lifecycle state of a chunk coordinate, `None` when unloaded.
    pub fn chunk_state(&self, position: Point3<i32>) -> Option<ChunkState> {
        self.chunks.get(&position).map(|c| c.state)
    }

    /// Whether no job is in flight or queued in either pool.
    pub fn is_idle(&self) -> bool {
        self.generation_pool.is_idle()
            && self
                .meshing_pool
                .as_ref()
                .map_or(true, WorkerPool::is_idle)
    }

    /// Total number of worker threads across both pools. Never exceeds the
    /// configured `max_worker_count`.
    pub fn worker_count(&self) -> usize {
        self.generation_pool.worker_count()
            + self
                .meshing_pool
                .as_ref()
                .map_or(0, WorkerPool::worker_count)
    }

    /// Diffs the loaded set against the player's load radius: loads every
    /// newly-in-range coordinate and unloads every now-out-of-range chunk.
    fn refresh_loaded_set(&mut self, player_position: Point3<f32>) {
        let player_voxel = coords::world_to_voxel(player_position, self.config.block_dimension);
        let player_chunk = coords::voxel_to_chunk(player_voxel, self.config.chunk_size);
        let horizontal = self.config.load_radius;
        let vertical = self.config.vertical_load_radius;

        let mut wanted = HashSet::new();
        for dy in -vertical..=vertical {
            for dz in -horizontal..=horizontal {
                for dx in -horizontal..=horizontal {
                    let position = player_chunk + Vector3::new(dx, dy, dz);
                    wanted.insert(position);
                    if !self.chunks.contains_key(&position) {
                        // The player's immediate vicinity preempts
                        // speculative background loading.
                        let prioritized = dx.abs() <= 1 && dy.abs() <= 1 && dz.abs() <= 1;
                        self.load_chunk(position, prioritized);
                    }
                }
            }
        }

        let out_of_range: Vec<Point3<i32>> = self
            .chunks
            .keys()
            .filter(|position| !wanted.contains(*position))
            .copied()
            .collect();
        for position in out_of_range {
            self.unload_chunk(position);
        }
    }

    /// Brings one coordinate into the loaded set, either by restoring a
    /// persisted payload (straight to `Generated` + mesh job) or by
    /// dispatching a generation job.
    fn load_chunk(&mut self, position: Point3<i32>, prioritized: bool) {
        self.next_version += 1;
        let version = self.next_version;

        if let Some(payload) = self.persisted.remove(&position) {
            let overlay_entries = payload.changed_blocks.clone();
            match payload.into_grid(self.config.chunk_size) {
                Ok(grid) => {
                    let edits = self.changed_blocks.entry(position).or_default();
                    for (voxel, id) in overlay_entries {
                        edits.insert(voxel, id);
                    }
                    let mut chunk = Chunk::new(position, version);
                    chunk.grid = Some(grid);
                    chunk.state = ChunkState::Generated;
                    self.chunks.insert(position, chunk);
                    debug!("restored chunk {} from payload", coords::chunk_name(position));
                    self.enqueue_mesh(position, prioritized);
                    return;
                }
                Err(err) => {
                    warn!(
                        "discarding corrupt payload for chunk {}: {err}",
                        coords::chunk_name(position)
                    );
                }
            }
        }

        self.chunks.insert(position, Chunk::new(position, version));
        let changed_blocks = self.overlay_for_padded_region(position);
        self.generation_pool.submit(
            Job::Generate {
                position,
                version,
                changed_blocks,
            },
            prioritized,
        );
    }

    /// Removes a chunk that left the load radius, releasing its grid and
    /// signaling the renderer to drop its geometry. Jobs still in flight
    /// for it will miss the map lookup on arrival and be discarded.
    fn unload_chunk(&mut self, position: Point3<i32>) {
        if let Some(chunk) = self.chunks.remove(&position) {
            if chunk.mesh_attached {
                self.render_commands.push(RenderCommand::Detach {
                    chunk_name: chunk.name(),
                });
            }
        }
    }

    /// Collects overlay entries (own chunk and all 26 neighbors) that fall
    /// inside the padded region of `position`, so generation reproduces
    /// edits in the margin cells too.
    fn overlay_for_padded_region(&self, position: Point3<i32>) -> HashMap<Point3<i32>, BlockId> {
        let size = self.config.chunk_size;
        let origin = coords::chunk_to_voxel(position, size);
        let lo = origin - Vector3::new(CHUNK_MARGIN, CHUNK_MARGIN, CHUNK_MARGIN);
        let hi = origin + Vector3::new(size + CHUNK_MARGIN, size + CHUNK_MARGIN, size + CHUNK_MARGIN);

        let mut overlay = HashMap::new();
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let neighbor = position + Vector3::new(dx, dy, dz);
                    let Some(edits) = self.changed_blocks.get(&neighbor) else {
                        continue;
                    };
                    for (voxel, id) in edits {
                        if voxel.x >= lo.x
                            && voxel.x < hi.x
                            && voxel.y >= lo.y
                            && voxel.y < hi.y
                            && voxel.z >= lo.z
                            && voxel.z < hi.z
                        {
                            overlay.insert(*voxel, *id);
                        }
                    }
                }
            }
        }
        overlay
    }

    /// Snapshots a chunk's grid, runs the bounded light re-flood for it,
    /// and dispatches the mesh job. No-op while the chunk has no grid.
    fn enqueue_mesh(&mut self, position: Point3<i32>, prioritized: bool) {
        let Some(chunk) = self.chunks.get_mut(&position) else {
            return;
        };
        let Some(grid) = chunk.grid.clone() else {
            return;
        };
        chunk.state = ChunkState::Meshing;
        chunk.dirty = false;
        let version = chunk.version;

        let light = lighting::compute_chunk_light(&grid, &self.lighting);
        self.mesh_pool().submit(
            Job::Mesh {
                position,
                version,
                grid,
                light,
            },
            prioritized,
        );
    }

    /// Drains both pools and applies every completed job result to the
    /// chunk map.
    fn apply_completed(&mut self) {
        let mut outputs = self.generation_pool.drain_completed();
        if let Some(pool) = self.meshing_pool.as_mut() {
            outputs.extend(pool.drain_completed());
        }
        for output in outputs {
            self.apply_output(output);
        }
    }

    fn apply_output(&mut self, output: JobOutput) {
        match output {
            JobOutput::Generated {
                position,
                version,
                grid,
            } => {
                let Some(chunk) = self.chunks.get_mut(&position) else {
                    debug!(
                        "discarding generation result for unloaded chunk {}",
                        coords::chunk_name(position)
                    );
                    return;
                };
                if chunk.version != version {
                    debug!(
                        "discarding superseded generation result for chunk {}",
                        coords::chunk_name(position)
                    );
                    return;
                }
                chunk.grid = Some(grid);
                chunk.state = ChunkState::Generated;
                chunk.retries = 0;
                self.enqueue_mesh(position, false);

                // A freshly generated chunk can change what its already
                // visible neighbors should cull at the shared boundary.
                for side in BlockSide::all() {
                    let neighbor_position = position + side.offset();
                    if self.chunk_state(neighbor_position) == Some(ChunkState::Ready) {
                        self.enqueue_mesh(neighbor_position, false);
                    }
                }
            }

            JobOutput::Meshed {
                position,
                version,
                buffers,
            } => {
                let Some(chunk) = self.chunks.get_mut(&position) else {
                    debug!(
                        "discarding mesh result for unloaded chunk {}",
                        coords::chunk_name(position)
                    );
                    return;
                };
                if chunk.version != version {
                    debug!(
                        "discarding superseded mesh result for chunk {}",
                        coords::chunk_name(position)
                    );
                    return;
                }
                chunk.state = ChunkState::Ready;
                chunk.mesh_attached = true;
                // A successful result restores the single-retry budget for
                // any later, unrelated failure.
                chunk.retries = 0;
                let chunk_name = chunk.name();
                let was_dirtied = chunk.dirty;
                self.render_commands.push(RenderCommand::Attach {
                    chunk_name,
                    buffers,
                });
                if was_dirtied {
                    // Edited while this mesh was in flight; refresh it.
                    self.enqueue_mesh(position, true);
                }
            }

            JobOutput::Failed {
                position,
                version,
                kind,
                message,
            } => {
                let Some(chunk) = self.chunks.get_mut(&position) else {
                    return;
                };
                if chunk.version != version {
                    return;
                }
                if chunk.retries == 0 {
                    chunk.retries = 1;
                    warn!(
                        "{kind:?} job for chunk {} failed ({message}), retrying once",
                        coords::chunk_name(position)
                    );
                    match kind {
                        JobKind::Generate => {
                            chunk.state = ChunkState::Generating;
                            chunk.grid = None;
                            let changed_blocks = self.overlay_for_padded_region(position);
                            self.generation_pool.submit(
                                Job::Generate {
                                    position,
                                    version,
                                    changed_blocks,
                                },
                                true,
                            );
                        }
                        JobKind::Mesh => self.enqueue_mesh(position, true),
                    }
                } else {
                    // Deterministically failing input: park the chunk so a
                    // retry storm cannot form. It renders as empty.
                    chunk.state = ChunkState::Failed;
                    error!(
                        "{kind:?} job for chunk {} failed twice ({message}); chunk marked failed",
                        coords::chunk_name(position)
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GenerationStrategy;
    use std::time::Duration;

    fn flat_config(load_radius: i32) -> WorldConfig {
        WorldConfig {
            seed: 42,
            chunk_size: 8,
            load_radius,
            vertical_load_radius: 0,
            max_worker_count: 2,
            generation_strategy: GenerationStrategy::Flat { max_height: 6 },
            tick_interval_ms: 0,
            ..WorldConfig::default()
        }
    }

    /// Ticks until both pools are idle and the loaded set is stable.
    fn settle(manager: &mut ChunkManager, player: Point3<f32>) {
        let deadline = Instant::now() + Duration::from_secs(20);
        loop {
            manager.tick(player);
            if manager.is_idle() {
                // One more tick so results applied last round dispatched
                // any follow-up work.
                manager.tick(player);
                if manager.is_idle() {
                    return;
                }
            }
            assert!(Instant::now() < deadline, "world never settled");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn chunks_within_the_radius_become_ready() {
        let mut manager = ChunkManager::new(flat_config(1)).unwrap();
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));

        // 3x3 horizontal neighborhood, single vertical layer.
        assert_eq!(manager.loaded_chunk_count(), 9);
        assert_eq!(manager.ready_chunk_count(), 9);

        let commands = manager.drain_render_commands();
        let attaches = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Attach { .. }))
            .count();
        assert!(attaches >= 9);
    }

    #[test]
    fn moving_away_unloads_and_detaches() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(manager.chunk_state(Point3::new(0, 0, 0)), Some(ChunkState::Ready));
        manager.drain_render_commands();

        // 10 chunks east.
        settle(&mut manager, Point3::new(80.0, 0.0, 0.0));
        assert_eq!(manager.chunk_state(Point3::new(0, 0, 0)), None);
        let commands = manager.drain_render_commands();
        assert!(commands.iter().any(|c| matches!(
            c,
            RenderCommand::Detach { chunk_name } if chunk_name == "0:0:0"
        )));
    }

    #[test]
    fn stale_results_for_unloaded_chunks_are_discarded() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();
        // Dispatch generation for the origin chunk, then immediately move
        // far away so the chunk unloads while its job is in flight.
        manager.tick(Point3::new(0.0, 0.0, 0.0));
        manager.tick(Point3::new(800.0, 0.0, 0.0));
        settle(&mut manager, Point3::new(800.0, 0.0, 0.0));

        // The origin chunk must not have been resurrected by its late
        // generation result, and no geometry may have leaked for it.
        assert_eq!(manager.chunk_state(Point3::new(0, 0, 0)), None);
        let commands = manager.drain_render_commands();
        assert!(!commands.iter().any(|c| matches!(
            c,
            RenderCommand::Attach { chunk_name, .. } if chunk_name == "0:0:0"
        )));
    }

    #[test]
    fn block_queries_return_unknown_outside_loaded_chunks() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));

        assert_eq!(
            manager.block_type_at(Point3::new(0, 6, 0)),
            Some(BlockType::GRASS)
        );
        assert_eq!(manager.block_type_at(Point3::new(500, 6, 0)), None);
        // Unknown is conservatively solid for collision callers.
        assert!(manager.is_solid_at(Point3::new(500, 6, 0)));
        assert!(!manager.is_solid_at(Point3::new(0, 7, 0)));
    }

    #[test]
    fn edits_persist_across_unload_and_reload() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));

        let target = Point3::new(2, 6, 2);
        assert!(manager.set_block(target, BlockType::LAMP.id()));
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(manager.block_type_at(target), Some(BlockType::LAMP));

        // Walk away (chunk unloads) and back (chunk regenerates).
        settle(&mut manager, Point3::new(800.0, 0.0, 0.0));
        assert_eq!(manager.block_type_at(target), None);
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(manager.block_type_at(target), Some(BlockType::LAMP));
    }

    #[test]
    fn edits_to_unready_chunks_are_rejected() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();
        // Nothing loaded yet.
        assert!(!manager.set_block(Point3::new(0, 0, 0), BlockType::STONE.id()));
    }

    #[test]
    fn boundary_edits_dirty_the_face_sharing_neighbor() {
        let mut manager = ChunkManager::new(flat_config(1)).unwrap();
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));
        manager.drain_render_commands();

        // Local x == 0 in chunk (0,0,0): shares a face with chunk (-1,0,0).
        assert!(manager.set_block(Point3::new(0, 6, 3), BlockType::AIR.id()));
        assert_eq!(
            manager.chunk_state(Point3::new(-1, 0, 0)),
            Some(ChunkState::Meshing)
        );
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));

        let commands = manager.drain_render_commands();
        let remeshed: HashSet<&str> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Attach { chunk_name, .. } => Some(chunk_name.as_str()),
                RenderCommand::Detach { .. } => None,
            })
            .collect();
        assert!(remeshed.contains("0:0:0"));
        assert!(remeshed.contains("-1:0:0"));
    }

    #[test]
    fn persisted_payloads_skip_generation() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();

        // Hand in a payload that is all lamps, which flat generation
        // would never produce.
        let mut grid = crate::chunk::VoxelGrid::new(8);
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..8 {
                    grid.set(Point3::new(x, y, z), BlockType::LAMP.id());
                }
            }
        }
        manager.insert_payload(ChunkPayload::from_grid(
            Point3::new(0, 0, 0),
            &grid,
            Vec::new(),
        ));

        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(
            manager.block_type_at(Point3::new(4, 4, 4)),
            Some(BlockType::LAMP)
        );
    }

    /// Inserts a ready chunk with an all-air grid directly into the map,
    /// bypassing the job pipeline, so failure handling can be driven
    /// deterministically.
    fn insert_ready_chunk(manager: &mut ChunkManager, position: Point3<i32>) -> u64 {
        let version = 1;
        let mut chunk = Chunk::new(position, version);
        chunk.grid = Some(crate::chunk::VoxelGrid::new(8));
        chunk.state = ChunkState::Ready;
        manager.chunks.insert(position, chunk);
        version
    }

    fn failed_mesh(position: Point3<i32>, version: u64) -> JobOutput {
        JobOutput::Failed {
            position,
            version,
            kind: JobKind::Mesh,
            message: "mesh worker panicked".to_string(),
        }
    }

    #[test]
    fn worker_threads_never_exceed_the_configured_ceiling() {
        let mut config = flat_config(0);
        config.max_worker_count = 1;
        let mut manager = ChunkManager::new(config).unwrap();
        assert_eq!(manager.worker_count(), 1);

        // The single shared worker still runs both job kinds end to end.
        settle(&mut manager, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(manager.ready_chunk_count(), 1);

        let mut config = flat_config(0);
        config.max_worker_count = 3;
        let manager = ChunkManager::new(config).unwrap();
        assert!(manager.worker_count() <= 3);
    }

    #[test]
    fn failed_jobs_retry_once_then_park_the_chunk() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();
        let position = Point3::new(5, 5, 5);
        let version = insert_ready_chunk(&mut manager, position);

        // First failure: the mesh job is re-queued.
        manager.apply_output(failed_mesh(position, version));
        assert_eq!(manager.chunk_state(position), Some(ChunkState::Meshing));
        assert!(!manager.is_idle());

        // Second failure parks the chunk; it stays loaded but quiescent.
        manager.apply_output(failed_mesh(position, version));
        assert_eq!(manager.chunk_state(position), Some(ChunkState::Failed));
    }

    #[test]
    fn a_successful_result_restores_the_retry_budget() {
        let mut manager = ChunkManager::new(flat_config(0)).unwrap();
        let position = Point3::new(5, 5, 5);
        let version = insert_ready_chunk(&mut manager, position);

        manager.apply_output(failed_mesh(position, version));
        assert_eq!(manager.chunk_state(position), Some(ChunkState::Meshing));

        // The retry succeeds; a later, unrelated failure must get its own
        // retry instead of parking the chunk immediately.
        manager.apply_output(JobOutput::Meshed {
            position,
            version,
            buffers: MeshBuffers::default(),
        });
        assert_eq!(manager.chunk_state(position), Some(ChunkState::Ready));

        manager.apply_output(failed_mesh(position, version));
        assert_eq!(manager.chunk_state(position), Some(ChunkState::Meshing));
    }

    #[test]
    fn invalid_configuration_fails_world_construction() {
        let mut config = flat_config(1);
        config.generation_strategy = GenerationStrategy::SinCos {
            base_height: 4,
            amplitude: -1.0,
            period: 8.0,
        };
        assert!(ChunkManager::new(config).is_err());
    }
}
