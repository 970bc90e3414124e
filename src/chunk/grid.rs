//! # Voxel and Light Grids
//!
//! Dense per-chunk storage. Both grids share the same padded layout: a
//! chunk of logical edge length `size` allocates `(size + 2 * margin)^3`
//! cells, where the margin holds read-only copies of the neighboring
//! chunks' boundary voxels. The mesher and lighting propagator therefore
//! never dereference another chunk's memory; redundant computation at the
//! borders is the accepted price for race-free, snapshot-based jobs.
//!
//! ## Layout invariant
//!
//! `index = (x + margin) + padded * (y + margin) + padded^2 * (z + margin)`
//!
//! Every producer and consumer addresses cells through the accessors below
//! using *logical* local coordinates, where the margin cells appear at
//! `-margin` and `size + margin - 1`.

use cgmath::Point3;

use crate::block::{AIR_ID, BlockId};

/// Width of the neighbor border kept around every chunk's logical volume.
pub const CHUNK_MARGIN: i32 = 1;

/// A dense 3D array of block ids with a neighbor margin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    size: i32,
    padded: i32,
    blocks: Vec<BlockId>,
}

impl VoxelGrid {
    /// Creates an all-air grid for a chunk of the given logical edge length.
    ///
    /// # Panics
    /// Panics if `size` is not positive; the configuration layer validates
    /// chunk size before any grid is built.
    pub fn new(size: i32) -> Self {
        assert!(size > 0, "chunk size must be positive");
        let padded = size + 2 * CHUNK_MARGIN;
        VoxelGrid {
            size,
            padded,
            blocks: vec![AIR_ID; (padded * padded * padded) as usize],
        }
    }

    /// Rebuilds a grid from a serialized block array (persisted payload).
    ///
    /// # Returns
    /// `None` when the array length does not match the padded volume for
    /// `size`; the caller maps that to a payload error.
    pub fn from_blocks(size: i32, blocks: Vec<BlockId>) -> Option<Self> {
        let padded = size + 2 * CHUNK_MARGIN;
        if blocks.len() != (padded * padded * padded) as usize {
            return None;
        }
        Some(VoxelGrid {
            size,
            padded,
            blocks,
        })
    }

    /// The logical edge length of the chunk this grid belongs to.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// The padded edge length, `size + 2 * CHUNK_MARGIN`.
    pub fn padded(&self) -> i32 {
        self.padded
    }

    /// Whether a local coordinate addresses a cell inside the padded volume
    /// (logical bounds plus margin).
    pub fn in_padded_bounds(&self, local: Point3<i32>) -> bool {
        let lo = -CHUNK_MARGIN;
        let hi = self.size + CHUNK_MARGIN;
        (lo..hi).contains(&local.x) && (lo..hi).contains(&local.y) && (lo..hi).contains(&local.z)
    }

    fn index(&self, local: Point3<i32>) -> usize {
        debug_assert!(self.in_padded_bounds(local), "coordinate {local:?} outside padded grid");
        let m = CHUNK_MARGIN;
        ((local.x + m) + self.padded * (local.y + m) + self.padded * self.padded * (local.z + m))
            as usize
    }

    /// Reads the block id at a local coordinate. Margin cells are addressed
    /// with components `-CHUNK_MARGIN` or `size..size + CHUNK_MARGIN`.
    pub fn get(&self, local: Point3<i32>) -> BlockId {
        self.blocks[self.index(local)]
    }

    /// Writes the block id at a local coordinate, margin cells included:
    /// chunk edits mirror boundary voxels into the neighbors' margins.
    pub fn set(&mut self, local: Point3<i32>, id: BlockId) {
        let index = self.index(local);
        self.blocks[index] = id;
    }

    /// The raw padded block array, in layout order. This is what persisted
    /// chunk payloads serialize and what determinism tests compare.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }
}

/// Per-voxel light values for one chunk: an independent sunlight channel
/// and torchlight channel, both over the padded volume so smooth lighting
/// can sample across chunk borders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightGrid {
    size: i32,
    padded: i32,
    sun: Vec<u8>,
    torch: Vec<u8>,
}

impl LightGrid {
    /// Creates an all-dark light grid matching a chunk of edge length `size`.
    pub fn new(size: i32) -> Self {
        let padded = size + 2 * CHUNK_MARGIN;
        let cells = (padded * padded * padded) as usize;
        LightGrid {
            size,
            padded,
            sun: vec![0; cells],
            torch: vec![0; cells],
        }
    }

    fn index(&self, local: Point3<i32>) -> usize {
        let m = CHUNK_MARGIN;
        ((local.x + m) + self.padded * (local.y + m) + self.padded * self.padded * (local.z + m))
            as usize
    }

    /// Whether a local coordinate lies inside the padded volume.
    pub fn in_padded_bounds(&self, local: Point3<i32>) -> bool {
        let lo = -CHUNK_MARGIN;
        let hi = self.size + CHUNK_MARGIN;
        (lo..hi).contains(&local.x) && (lo..hi).contains(&local.y) && (lo..hi).contains(&local.z)
    }

    /// Sunlight level at a local coordinate.
    pub fn sun(&self, local: Point3<i32>) -> u8 {
        self.sun[self.index(local)]
    }

    /// Torchlight level at a local coordinate.
    pub fn torch(&self, local: Point3<i32>) -> u8 {
        self.torch[self.index(local)]
    }

    /// Stores a sunlight level.
    pub fn set_sun(&mut self, local: Point3<i32>, level: u8) {
        let index = self.index(local);
        self.sun[index] = level;
    }

    /// Stores a torchlight level.
    pub fn set_torch(&mut self, local: Point3<i32>, level: u8) {
        let index = self.index(local);
        self.torch[index] = level;
    }

    /// The combined brightness of a cell: the brighter of the two channels.
    pub fn combined(&self, local: Point3<i32>) -> u8 {
        self.sun(local).max(self.torch(local))
    }
}
