//! # Chunk Module
//!
//! A chunk is the unit of loading, generation, meshing and unloading: a
//! fixed-size cuboid of voxels identified by integer chunk coordinates.
//! The control thread owns every `Chunk`; workers only ever see cloned
//! [`VoxelGrid`] / [`LightGrid`] snapshots, so chunk metadata needs no
//! locking.
//!
//! ## Lifecycle
//!
//! Per coordinate the manager drives the state machine
//! `Generating → Generated → Meshing → Ready → (dirty → Meshing → Ready)*`
//! and finally unloads the chunk by dropping it from the map. A stale job
//! result for a dropped or reloaded coordinate is detected through the
//! [`Chunk::version`] counter and discarded on arrival.

pub mod grid;

use cgmath::Point3;

pub use grid::{CHUNK_MARGIN, LightGrid, VoxelGrid};

use crate::coords;

/// Lifecycle states of a loaded chunk.
///
/// `Unloaded` and `Unloading` from the conceptual state machine have no
/// variant here: an unloaded coordinate is simply absent from the chunk
/// map, and unloading is the synchronous removal itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// A generation job is outstanding; the voxel grid does not exist yet.
    /// The chunk must not be meshed in this state.
    Generating,

    /// The voxel grid is populated and valid at every index; no mesh yet.
    Generated,

    /// A meshing job is outstanding for the current grid contents.
    Meshing,

    /// Geometry has been produced and attached; the chunk is stable until
    /// an edit marks it dirty.
    Ready,

    /// A job for this chunk failed twice. The chunk stays loaded but
    /// quiescent (rendered as empty) and is never retried automatically.
    Failed,
}

/// A loaded chunk: identity, lifecycle metadata and (once generated) the
/// dense voxel grid.
#[derive(Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not voxel coordinates).
    pub position: Point3<i32>,

    /// Monotonic load-generation counter. Job payloads carry the version
    /// they were dispatched for; a mismatch at apply time means the result
    /// is stale and must be discarded.
    pub version: u64,

    /// Current lifecycle state, driven only by the control thread.
    pub state: ChunkState,

    /// Set when a voxel changed after the last mesh was produced; cleared
    /// when the replacement mesh job is dispatched.
    pub dirty: bool,

    /// The padded voxel grid. `None` exactly while `state == Generating`.
    pub grid: Option<VoxelGrid>,

    /// Whether geometry for this chunk is currently attached at the
    /// rendering collaborator, i.e. whether unloading must emit a detach.
    pub mesh_attached: bool,

    /// Failed-job retries consumed since the last successfully applied
    /// result. At most one retry per failure streak; a second consecutive
    /// failure parks the chunk as failed.
    pub retries: u8,
}

impl Chunk {
    /// Creates a chunk entering the load radius, with its generation job
    /// about to be dispatched.
    pub fn new(position: Point3<i32>, version: u64) -> Self {
        Chunk {
            position,
            version,
            state: ChunkState::Generating,
            dirty: false,
            grid: None,
            mesh_attached: false,
            retries: 0,
        }
    }

    /// The canonical name keying this chunk's render attach/detach signals.
    pub fn name(&self) -> String {
        coords::chunk_name(self.position)
    }

    /// Whether the chunk has a fully populated grid, i.e. left the
    /// `Generating` state. A chunk may only be meshed once this holds.
    pub fn is_loaded(&self) -> bool {
        self.grid.is_some()
    }
}
