//! # Block Type Module
//!
//! Defines the closed set of block types in the voxel world along with the
//! registry flags the generator, lighting propagator and mesher consult.

use num_derive::FromPrimitive;

use super::BlockId;
use crate::lighting::MAX_LIGHT_LEVEL;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminants are the on-disk/in-grid [`BlockId`] values; `AIR` is
/// zero so freshly allocated grids are empty. The `FromPrimitive` derive
/// provides the id-to-type conversion used everywhere a raw grid value is
/// interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum BlockType {
    /// The empty block: non-solid, fully transparent, occupies no geometry.
    AIR = 0,

    /// Plain stone, the bulk of the underground.
    STONE = 1,

    /// Dirt, found in the layers just below the surface.
    DIRT = 2,

    /// Grass-covered surface block with distinct top/side/bottom textures.
    GRASS = 3,

    /// Unbreakable world floor.
    BEDROCK = 4,

    /// Fluid block; transparent so terrain behind it stays visible.
    WATER = 5,

    /// Foliage; transparent but solid for collision purposes.
    LEAVES = 6,

    /// Light-emitting block, the torchlight source of the lighting pass.
    LAMP = 7,
}

impl BlockType {
    /// Number of registered block types, used to size closed tables.
    pub const COUNT: u8 = 8;

    /// Converts a raw [`BlockId`] into a `BlockType`.
    ///
    /// # Returns
    /// `None` if the id is outside the closed registry. Callers that read
    /// ids out of a grid this crate produced may rely on `Some`; payloads
    /// from a storage collaborator go through validation first.
    pub fn from_id(id: BlockId) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// Returns this type's raw [`BlockId`].
    pub fn id(self) -> BlockId {
        self as BlockId
    }

    /// Whether the block occupies its cell for collision purposes.
    ///
    /// Water is the one non-solid, non-air type: entities pass through it.
    pub fn is_solid(self) -> bool {
        !matches!(self, BlockType::AIR | BlockType::WATER)
    }

    /// Whether light and sight pass through the block.
    ///
    /// Air counts as transparent for lighting, but the mesher treats it
    /// separately (an air neighbor always exposes a face).
    pub fn is_transparent(self) -> bool {
        matches!(
            self,
            BlockType::AIR | BlockType::WATER | BlockType::LEAVES
        )
    }

    /// Torchlight intensity the block emits, `0` for non-emissive types.
    pub fn light_emission(self) -> u8 {
        match self {
            BlockType::LAMP => MAX_LIGHT_LEVEL,
            _ => 0,
        }
    }

    /// Whether the block is a fluid.
    pub fn is_fluid(self) -> bool {
        matches!(self, BlockType::WATER)
    }

    /// Whether the block stops light propagation entirely.
    pub fn is_opaque(self) -> bool {
        !self.is_transparent()
    }
}
