//! # Lighting Propagator
//!
//! Computes the two per-voxel light channels of a chunk, sunlight and
//! torchlight, and derives the smooth per-vertex values the mesher bakes
//! into its geometry.
//!
//! ## Propagation
//!
//! Both channels are breadth-first flood fills over the chunk's padded
//! volume:
//!
//! * **Sunlight** seeds every sky-exposed cell (scanning each column from
//!   the top of the padded volume) at the maximum level. Full-strength
//!   sunlight travels downward undiminished; every other hop decays by the
//!   configured step.
//! * **Torchlight** seeds at light-emitting blocks with their emission
//!   level and decays by the step on every hop.
//!
//! Fills stop at opaque voxels and at level zero, and all values stay in
//! `[0, max_light_level]`. Because the fill is confined to one padded
//! volume, recomputing after a block edit is a bounded re-flood of the
//! edited chunk (the margin supplies neighbor context), never a
//! world-wide recompute.

use bitvec::prelude::BitVec;
use cgmath::Point3;
use std::collections::VecDeque;

use crate::block::block_side::BlockSide;
use crate::block::block_type::BlockType;
use crate::chunk::{CHUNK_MARGIN, LightGrid, VoxelGrid};

/// The brightest light level either channel can carry.
pub const MAX_LIGHT_LEVEL: u8 = 15;

/// Default intensity lost per traversed non-opaque voxel.
pub const LIGHT_DECAY_STEP: u8 = 1;

/// Tunable lighting parameters, carried in the world configuration.
#[derive(Debug, Clone, Copy)]
pub struct LightingConfig {
    /// Upper clamp for both channels; sky-exposed cells start here.
    pub max_light_level: u8,
    /// Intensity lost per flood-fill hop.
    pub decay_step: u8,
}

impl Default for LightingConfig {
    fn default() -> Self {
        LightingConfig {
            max_light_level: MAX_LIGHT_LEVEL,
            decay_step: LIGHT_DECAY_STEP,
        }
    }
}

/// Opacity lookup over a padded grid, precomputed once per fill so the
/// flood loops never re-decode block ids.
struct OpacityMask {
    padded: i32,
    bits: BitVec,
}

impl OpacityMask {
    fn build(grid: &VoxelGrid) -> Self {
        let padded = grid.padded();
        let mut bits = BitVec::repeat(false, (padded * padded * padded) as usize);
        let m = CHUNK_MARGIN;
        for z in -m..grid.size() + m {
            for y in -m..grid.size() + m {
                for x in -m..grid.size() + m {
                    let local = Point3::new(x, y, z);
                    let opaque = BlockType::from_id(grid.get(local))
                        .map(BlockType::is_opaque)
                        .unwrap_or(false);
                    if opaque {
                        let index = (x + m) + padded * (y + m) + padded * padded * (z + m);
                        bits.set(index as usize, true);
                    }
                }
            }
        }
        OpacityMask { padded, bits }
    }

    fn is_opaque(&self, local: Point3<i32>) -> bool {
        let m = CHUNK_MARGIN;
        let index =
            (local.x + m) + self.padded * (local.y + m) + self.padded * self.padded * (local.z + m);
        self.bits[index as usize]
    }
}

/// Computes both light channels for one chunk's padded voxel grid.
///
/// The result covers the padded volume, so smooth lighting at chunk
/// borders samples meaningful values without touching neighbor chunks.
pub fn compute_chunk_light(grid: &VoxelGrid, config: &LightingConfig) -> LightGrid {
    let mut light = LightGrid::new(grid.size());
    let opacity = OpacityMask::build(grid);
    let max = config.max_light_level.min(MAX_LIGHT_LEVEL);
    let lo = -CHUNK_MARGIN;
    let hi = grid.size() + CHUNK_MARGIN;

    // Sunlight: seed every sky-exposed cell, column by column, from the top
    // of the padded volume down to the first opaque voxel.
    let mut queue: VecDeque<(Point3<i32>, u8)> = VecDeque::new();
    for z in lo..hi {
        for x in lo..hi {
            for y in (lo..hi).rev() {
                let local = Point3::new(x, y, z);
                if opacity.is_opaque(local) {
                    break;
                }
                light.set_sun(local, max);
                queue.push_back((local, max));
            }
        }
    }
    while let Some((local, level)) = queue.pop_front() {
        for side in BlockSide::all() {
            let neighbor = local + side.offset();
            if !light.in_padded_bounds(neighbor) || opacity.is_opaque(neighbor) {
                continue;
            }
            // Full-strength sunlight keeps its level traveling straight down.
            let candidate = if neighbor.y < local.y && level == max {
                max
            } else {
                level.saturating_sub(config.decay_step)
            };
            if candidate > light.sun(neighbor) {
                light.set_sun(neighbor, candidate);
                queue.push_back((neighbor, candidate));
            }
        }
    }

    // Torchlight: seed at emissive blocks and flood outward.
    let mut queue: VecDeque<(Point3<i32>, u8)> = VecDeque::new();
    for z in lo..hi {
        for y in lo..hi {
            for x in lo..hi {
                let local = Point3::new(x, y, z);
                let emission = BlockType::from_id(grid.get(local))
                    .map(BlockType::light_emission)
                    .unwrap_or(0)
                    .min(max);
                if emission > 0 {
                    light.set_torch(local, emission);
                    queue.push_back((local, emission));
                }
            }
        }
    }
    while let Some((local, level)) = queue.pop_front() {
        let candidate = level.saturating_sub(config.decay_step);
        if candidate == 0 {
            continue;
        }
        for side in BlockSide::all() {
            let neighbor = local + side.offset();
            if !light.in_padded_bounds(neighbor) || opacity.is_opaque(neighbor) {
                continue;
            }
            if candidate > light.torch(neighbor) {
                light.set_torch(neighbor, candidate);
                queue.push_back((neighbor, candidate));
            }
        }
    }

    light
}

/// Smooth per-vertex light for one corner of an emitted face.
///
/// Averages the combined (sun-or-torch, whichever is brighter) level over
/// the up-to-4 voxels sharing the vertex: the cell the face opens into and
/// its neighbors along the face's tangent axes toward the corner. Opaque
/// cells contribute zero but still count, which is what softens hard block
/// edges into the ambient-occlusion-like gradient.
///
/// # Arguments
/// * `base` - The cell the face opens into (`voxel + side.offset()`)
/// * `side` - The face being emitted
/// * `corner` - Corner position along the face's tangents, each `0` or `1`
///
/// # Returns
/// A normalized intensity in `[0, 1]`, ready for the vertex-light buffer.
pub fn vertex_light(
    grid: &VoxelGrid,
    light: &LightGrid,
    base: Point3<i32>,
    side: BlockSide,
    corner: (i32, i32),
    config: &LightingConfig,
) -> f32 {
    let (t1, t2) = side.tangents();
    let d1 = if corner.0 == 1 { t1 } else { -t1 };
    let d2 = if corner.1 == 1 { t2 } else { -t2 };

    let cells = [base, base + d1, base + d2, base + d1 + d2];
    let mut sum = 0u32;
    let mut count = 0u32;
    for cell in cells {
        if !light.in_padded_bounds(cell) {
            continue;
        }
        count += 1;
        let opaque = BlockType::from_id(grid.get(cell))
            .map(BlockType::is_opaque)
            .unwrap_or(false);
        if !opaque {
            sum += light.combined(cell) as u32;
        }
    }

    if count == 0 {
        return 0.0;
    }
    (sum as f32 / count as f32) / config.max_light_level.max(1) as f32
}
