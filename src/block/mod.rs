//! # Block Module
//!
//! The closed block-type registry shared by the terrain generator, the
//! lighting propagator and the mesher. Every voxel in the world stores a
//! single [`BlockId`]; the registry maps that id to the flags
//! (solid / transparent / light-emitting / fluid) and the per-face texture
//! indices that the other components key their behavior on.

pub mod block_side;
pub mod block_type;

use block_type::BlockType;

/// The underlying integer type used to represent block types in memory.
/// This is what the dense per-chunk voxel arrays store and what persisted
/// chunk payloads serialize.
pub type BlockId = u8;

/// The id of the empty/air block. Grids are initialized to this value.
pub const AIR_ID: BlockId = 0;

/// Number of texture columns/rows in the material atlas. Texture indices
/// map to atlas cells row-major: `col = index % ATLAS_COLUMNS`.
pub const ATLAS_COLUMNS: u8 = 4;

/// Maps each block id to its texture index per face.
///
/// The value array is indexed by `BlockSide as usize` in the order
/// [Front, Back, Bottom, Top, Left, Right]. Grass is the only multi-faced
/// type: green on top, dirt underneath, grass-on-dirt on the sides.
pub static BLOCK_FACE_TEXTURES: phf::Map<u8, [u8; 6]> = phf::phf_map! {
    0u8 => [0, 0, 0, 0, 0, 0],  // AIR (never meshed)
    1u8 => [1, 1, 1, 1, 1, 1],  // STONE
    2u8 => [2, 2, 2, 2, 2, 2],  // DIRT
    3u8 => [4, 4, 2, 3, 4, 4],  // GRASS (top: 3, bottom: 2, sides: 4)
    4u8 => [5, 5, 5, 5, 5, 5],  // BEDROCK
    5u8 => [6, 6, 6, 6, 6, 6],  // WATER
    6u8 => [7, 7, 7, 7, 7, 7],  // LEAVES
    7u8 => [8, 8, 8, 8, 8, 8],  // LAMP
};

/// Gets the per-face texture indices for a block id.
///
/// # Arguments
/// * `id` - The block id as stored in a voxel grid
///
/// # Returns
/// An array of 6 texture indices, one per face in `BlockSide` order.
/// Unregistered ids fall back to the air entry so a corrupt payload cannot
/// panic the mesher.
pub fn face_textures(id: BlockId) -> [u8; 6] {
    *BLOCK_FACE_TEXTURES.get(&id).unwrap_or(&[0; 6])
}

/// Decides whether a face of `current` against `neighbor` must be emitted.
///
/// A face is visible when the neighbor is empty, or when the neighbor is
/// transparent while the current block is not. The asymmetry is deliberate:
/// water and leaves must not cull the faces of opaque neighbors, but two
/// adjacent transparent blocks cull each other to avoid internal surfaces.
pub fn face_visible(current: BlockType, neighbor: BlockType) -> bool {
    if neighbor == BlockType::AIR {
        return true;
    }
    neighbor.is_transparent() && !current.is_transparent()
}
