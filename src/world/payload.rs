//! # Persistence Payloads
//!
//! The serialized forms exchanged with the persistence/network
//! collaborator. The world only ever needs two documents: the world-level
//! parameters and, per chunk, the serialized block array plus the
//! `changed_blocks` overlay. Because terrain is a pure function of the
//! seed, a storage backend may also drop the block array entirely and keep
//! just the overlay; regeneration reproduces the rest.

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::block::{self, BlockId};
use crate::block::block_type::BlockType;
use crate::chunk::{CHUNK_MARGIN, VoxelGrid};
use crate::error::WorldError;

/// One block-registry entry as shipped to a client, so ids in chunk
/// payloads can be interpreted without compiled-in knowledge of the
/// registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRegistryEntry {
    /// The raw id stored in voxel arrays.
    pub id: BlockId,
    /// Whether the block occupies its cell for collision purposes.
    pub solid: bool,
    /// Whether light and sight pass through the block.
    pub transparent: bool,
    /// Torchlight intensity the block emits.
    pub light_emission: u8,
    /// Atlas texture index per face, in registry face order.
    pub face_textures: [u8; 6],
}

/// World-level parameters a client needs before it can interpret chunk
/// payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldPayload {
    /// World seed.
    pub seed: u32,
    /// Logical chunk edge length in voxels.
    pub chunk_size: i32,
    /// Edge length of one block in world units.
    pub block_dimension: f32,
    /// The complete block-type registry.
    pub blocks: Vec<BlockRegistryEntry>,
}

impl WorldPayload {
    /// Builds the payload for a world, embedding the block registry.
    pub fn new(seed: u32, chunk_size: i32, block_dimension: f32) -> Self {
        let blocks = (0..BlockType::COUNT)
            .filter_map(BlockType::from_id)
            .map(|block_type| BlockRegistryEntry {
                id: block_type.id(),
                solid: block_type.is_solid(),
                transparent: block_type.is_transparent(),
                light_emission: block_type.light_emission(),
                face_textures: block::face_textures(block_type.id()),
            })
            .collect();
        WorldPayload {
            seed,
            chunk_size,
            block_dimension,
            blocks,
        }
    }
}

/// A persisted chunk: its coordinate, the full padded block array and the
/// player-edit overlay (absolute voxel coordinate → block id).
///
/// The padded array is stored so a restored chunk can be meshed without a
/// regeneration round trip; the overlay rides along so a re-generation
/// after a seed-only restore still reproduces the edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPayload {
    /// Chunk coordinate.
    pub position: Point3<i32>,
    /// The padded block array in grid layout order.
    pub blocks: Vec<BlockId>,
    /// Edit overlay entries as (absolute voxel, block id) pairs.
    pub changed_blocks: Vec<(Point3<i32>, BlockId)>,
}

impl ChunkPayload {
    /// Snapshots a grid (and its overlay entries) into a payload.
    pub fn from_grid(
        position: Point3<i32>,
        grid: &VoxelGrid,
        changed_blocks: Vec<(Point3<i32>, BlockId)>,
    ) -> Self {
        ChunkPayload {
            position,
            blocks: grid.blocks().to_vec(),
            changed_blocks,
        }
    }

    /// Rebuilds the voxel grid this payload serialized.
    ///
    /// # Errors
    /// Returns [`WorldError::PayloadSize`] when the block array does not
    /// match the padded volume for `chunk_size`.
    pub fn into_grid(self, chunk_size: i32) -> Result<VoxelGrid, WorldError> {
        let padded = chunk_size + 2 * CHUNK_MARGIN;
        let expected = (padded * padded * padded) as usize;
        let actual = self.blocks.len();
        VoxelGrid::from_blocks(chunk_size, self.blocks)
            .ok_or(WorldError::PayloadSize { expected, actual })
    }
}
