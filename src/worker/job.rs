//! # Job Types
//!
//! The closed set of work units exchanged between the chunk manager and
//! the worker pool. Jobs are tagged enum variants matched exhaustively by
//! the worker dispatch loop; there is no "unknown command" failure mode.
//!
//! ## Ownership
//!
//! A job owns its entire payload: the dispatching side moves the job into
//! the pool, the executing worker owns it for the duration of the run, and
//! the result travels back by value. Nothing in a job aliases the chunk
//! map, so workers and the control thread never share mutable memory.

use cgmath::Point3;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::block::BlockId;
use crate::chunk::{LightGrid, VoxelGrid};
use crate::lighting::LightingConfig;
use crate::mesher::{self, MeshBuffers};
use crate::terrain::TerrainGenerator;

/// Which kind of work a job (or a failure report) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Terrain generation for a chunk.
    Generate,
    /// Mesh construction from grid and light snapshots.
    Mesh,
}

/// A unit of work dispatched to a worker.
#[derive(Debug)]
pub enum Job {
    /// Fill a padded voxel grid for the chunk at `position`.
    Generate {
        /// Chunk coordinate to generate.
        position: Point3<i32>,
        /// Chunk version the result must match to be applied.
        version: u64,
        /// Player-edit overlay covering the chunk's padded region,
        /// absolute voxel coordinate → block id.
        changed_blocks: HashMap<Point3<i32>, BlockId>,
    },

    /// Build geometry buffers from a chunk's grid and light snapshots.
    Mesh {
        /// Chunk coordinate being meshed.
        position: Point3<i32>,
        /// Chunk version the result must match to be applied.
        version: u64,
        /// Snapshot of the chunk's padded voxel grid.
        grid: VoxelGrid,
        /// Light grid computed for the same snapshot.
        light: LightGrid,
    },
}

impl Job {
    /// The chunk coordinate this job works on.
    pub fn position(&self) -> Point3<i32> {
        match self {
            Job::Generate { position, .. } | Job::Mesh { position, .. } => *position,
        }
    }

    /// The chunk version this job was dispatched for.
    pub fn version(&self) -> u64 {
        match self {
            Job::Generate { version, .. } | Job::Mesh { version, .. } => *version,
        }
    }

    /// This job's kind tag.
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Generate { .. } => JobKind::Generate,
            Job::Mesh { .. } => JobKind::Mesh,
        }
    }
}

/// The result of one completed (or failed) job, sent back to the control
/// thread by value.
#[derive(Debug)]
pub enum JobOutput {
    /// A generation job finished; the grid is fully populated.
    Generated {
        /// Chunk coordinate the grid belongs to.
        position: Point3<i32>,
        /// Version copied from the originating job.
        version: u64,
        /// The freshly generated padded voxel grid.
        grid: VoxelGrid,
    },

    /// A meshing job finished.
    Meshed {
        /// Chunk coordinate the buffers belong to.
        position: Point3<i32>,
        /// Version copied from the originating job.
        version: u64,
        /// The produced geometry buffers.
        buffers: MeshBuffers,
    },

    /// The job panicked on the worker. The chunk manager retries once,
    /// then parks the chunk as failed-quiescent.
    Failed {
        /// Chunk coordinate of the failing job.
        position: Point3<i32>,
        /// Version copied from the originating job.
        version: u64,
        /// Which kind of job failed (decides what gets re-queued).
        kind: JobKind,
        /// Diagnostic description of the failure.
        message: String,
    },
}

impl JobOutput {
    /// The chunk coordinate this output refers to.
    pub fn position(&self) -> Point3<i32> {
        match self {
            JobOutput::Generated { position, .. }
            | JobOutput::Meshed { position, .. }
            | JobOutput::Failed { position, .. } => *position,
        }
    }
}

/// Static configuration each worker is booted with once, instead of
/// re-sending it on every job: the terrain function (which embeds the seed
/// and the block registry semantics) and the world's fixed dimensions.
#[derive(Debug)]
pub struct WorkerContext {
    /// The world's deterministic terrain function.
    pub terrain: TerrainGenerator,
    /// Logical chunk edge length in voxels.
    pub chunk_size: i32,
    /// Edge length of one block in world units.
    pub block_dimension: f32,
    /// Lighting parameters used for per-vertex light baking.
    pub lighting: LightingConfig,
}

/// Runs a job to completion on a worker thread.
///
/// A panic inside the job body is caught and reported as
/// [`JobOutput::Failed`] so one poisoned input cannot take the worker
/// down with it.
pub fn execute_job(job: Job, context: &Arc<WorkerContext>) -> JobOutput {
    let position = job.position();
    let version = job.version();
    let kind = job.kind();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_job(job, context)));
    match outcome {
        Ok(output) => output,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker job panicked".to_string());
            JobOutput::Failed {
                position,
                version,
                kind,
                message,
            }
        }
    }
}

fn run_job(job: Job, context: &Arc<WorkerContext>) -> JobOutput {
    match job {
        Job::Generate {
            position,
            version,
            changed_blocks,
        } => {
            let grid = context
                .terrain
                .generate(position, context.chunk_size, &changed_blocks);
            JobOutput::Generated {
                position,
                version,
                grid,
            }
        }
        Job::Mesh {
            position,
            version,
            grid,
            light,
        } => {
            let buffers = mesher::mesh_chunk(
                position,
                &grid,
                &light,
                context.block_dimension,
                &context.lighting,
            );
            JobOutput::Meshed {
                position,
                version,
                buffers,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GenerationStrategy;

    fn context() -> Arc<WorkerContext> {
        Arc::new(WorkerContext {
            terrain: TerrainGenerator::new(42, GenerationStrategy::Flat { max_height: 6 })
                .unwrap(),
            chunk_size: 8,
            block_dimension: 1.0,
            lighting: LightingConfig::default(),
        })
    }

    #[test]
    fn generate_then_mesh_produces_geometry() {
        let ctx = context();
        let generated = execute_job(
            Job::Generate {
                position: Point3::new(0, 0, 0),
                version: 1,
                changed_blocks: HashMap::new(),
            },
            &ctx,
        );
        let JobOutput::Generated { grid, version, .. } = generated else {
            panic!("expected a generated grid");
        };
        assert_eq!(version, 1);

        let light = crate::lighting::compute_chunk_light(&grid, &ctx.lighting);
        let meshed = execute_job(
            Job::Mesh {
                position: Point3::new(0, 0, 0),
                version: 1,
                grid,
                light,
            },
            &ctx,
        );
        let JobOutput::Meshed { buffers, .. } = meshed else {
            panic!("expected mesh buffers");
        };
        assert!(!buffers.is_empty());
    }
}
