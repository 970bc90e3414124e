//! # Terrain Generation
//!
//! Deterministic terrain: every block id is a pure function of the world
//! seed and the absolute voxel coordinate. Re-running generation with the
//! same seed reproduces the world bit-for-bit, which is what lets the
//! persistence collaborator store only the `changed_blocks` deltas.
//!
//! ## Strategies
//!
//! Three named strategies are supported, selected by configuration:
//!
//! * `flat` - a horizontal surface at a fixed height, layered
//!   grass / dirt / stone downward. The reference strategy for tests.
//! * `sincos` - a rolling surface from a sine/cosine height field.
//! * `hilly` - octave Perlin noise heightmap with bedrock at the world
//!   floor and water filling basins up to a sea level.
//!
//! An unknown strategy name, or a strategy with unusable parameters, is a
//! fatal configuration error raised when the world starts, never a
//! per-voxel runtime error.

use cgmath::Point3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::block::block_type::BlockType;
use crate::block::BlockId;
use crate::chunk::{CHUNK_MARGIN, VoxelGrid};
use crate::coords;
use crate::error::WorldError;

/// The named generation strategies and their per-strategy parameters.
///
/// Deserialized straight out of [`crate::world::config::WorldConfig`]; an
/// unrecognized `name` fails deserialization, which satisfies the
/// fail-fast rule for bad strategy names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum GenerationStrategy {
    /// Flat world: grass surface at `max_height`, dirt below it down to
    /// `max_height / 2`, stone underneath, air above.
    Flat {
        /// Voxel y of the grass surface.
        max_height: i32,
    },

    /// Rolling sine/cosine hills around `base_height`.
    SinCos {
        /// Mean surface height.
        base_height: i32,
        /// Peak-to-mean surface displacement in voxels.
        amplitude: f64,
        /// Horizontal wavelength divisor; larger values stretch the hills.
        period: f64,
    },

    /// Octave-noise heightmap terrain.
    Hilly {
        /// Mean surface height.
        base_height: i32,
        /// Height swing applied to the accumulated noise value.
        amplitude: f64,
        /// Base noise frequency; each octave doubles it.
        scale: f64,
        /// Number of noise octaves accumulated.
        octaves: u32,
        /// Per-octave amplitude falloff, in `(0, 1]`.
        persistence: f64,
        /// Basins below this voxel y fill with water.
        sea_level: i32,
    },
}

impl GenerationStrategy {
    /// Validates the numeric parameters of the strategy.
    ///
    /// Called once at world start; a failure here aborts construction
    /// before any chunk exists (no partial world).
    pub fn validate(&self) -> Result<(), WorldError> {
        match self {
            GenerationStrategy::Flat { .. } => Ok(()),
            GenerationStrategy::SinCos {
                amplitude, period, ..
            } => {
                if !period.is_finite() || *period <= 0.0 {
                    return Err(WorldError::InvalidStrategy(format!(
                        "sincos period must be positive, got {period}"
                    )));
                }
                if !amplitude.is_finite() || *amplitude < 0.0 {
                    return Err(WorldError::InvalidStrategy(format!(
                        "sincos amplitude must be non-negative, got {amplitude}"
                    )));
                }
                Ok(())
            }
            GenerationStrategy::Hilly {
                amplitude,
                scale,
                octaves,
                persistence,
                ..
            } => {
                if *octaves == 0 {
                    return Err(WorldError::InvalidStrategy(
                        "hilly octaves must be at least 1".to_string(),
                    ));
                }
                if !scale.is_finite() || *scale <= 0.0 {
                    return Err(WorldError::InvalidStrategy(format!(
                        "hilly scale must be positive, got {scale}"
                    )));
                }
                if !persistence.is_finite() || *persistence <= 0.0 || *persistence > 1.0 {
                    return Err(WorldError::InvalidStrategy(format!(
                        "hilly persistence must be in (0, 1], got {persistence}"
                    )));
                }
                if !amplitude.is_finite() || *amplitude < 0.0 {
                    return Err(WorldError::InvalidStrategy(format!(
                        "hilly amplitude must be non-negative, got {amplitude}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// The deterministic terrain function for one world.
///
/// Holds the seed, the validated strategy and the seeded noise source.
/// There is no other state: [`TerrainGenerator::block_at`] depends only on
/// its arguments and these immutable fields, so every worker boots with a
/// copy of this and produces identical terrain.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    seed: u32,
    strategy: GenerationStrategy,
    perlin: Perlin,
}

impl TerrainGenerator {
    /// Builds a generator for the given seed and strategy.
    ///
    /// # Errors
    /// Returns [`WorldError::InvalidStrategy`] when the strategy's numeric
    /// parameters are out of range. This is the fail-fast startup check of
    /// the world: no generator, no world.
    pub fn new(seed: u32, strategy: GenerationStrategy) -> Result<Self, WorldError> {
        strategy.validate()?;
        Ok(TerrainGenerator {
            seed,
            strategy,
            perlin: Perlin::new(seed),
        })
    }

    /// The world seed this generator reproduces.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The block generated at an absolute voxel coordinate.
    ///
    /// Pure: two calls with the same coordinate always agree, across
    /// workers and across program runs with the same seed.
    pub fn block_at(&self, voxel: Point3<i32>) -> BlockId {
        match &self.strategy {
            GenerationStrategy::Flat { max_height } => {
                Self::layered_column(voxel.y, *max_height).id()
            }
            GenerationStrategy::SinCos {
                base_height,
                amplitude,
                period,
            } => {
                let sway = (voxel.x as f64 / period).sin() + (voxel.z as f64 / period).cos();
                let surface = *base_height + (amplitude * sway / 2.0).round() as i32;
                if voxel.y == 0 {
                    return BlockType::BEDROCK.id();
                }
                Self::layered_column(voxel.y, surface).id()
            }
            GenerationStrategy::Hilly {
                base_height,
                amplitude,
                scale,
                octaves,
                persistence,
                sea_level,
            } => {
                if voxel.y == 0 {
                    return BlockType::BEDROCK.id();
                }
                let mut value = 0.0;
                let mut frequency = *scale;
                let mut weight = 1.0;
                let mut weight_sum = 0.0;
                for _ in 0..*octaves {
                    value += weight
                        * self
                            .perlin
                            .get([voxel.x as f64 * frequency, voxel.z as f64 * frequency]);
                    weight_sum += weight;
                    weight *= persistence;
                    frequency *= 2.0;
                }
                let surface = *base_height + (amplitude * value / weight_sum).round() as i32;
                let block = Self::layered_column(voxel.y, surface);
                if block == BlockType::AIR && voxel.y <= *sea_level {
                    return BlockType::WATER.id();
                }
                block.id()
            }
        }
    }

    /// Standard surface layering around a column's surface height: grass at
    /// the surface, dirt in the upper half below it, stone underneath.
    fn layered_column(y: i32, surface: i32) -> BlockType {
        if y > surface {
            BlockType::AIR
        } else if y == surface {
            BlockType::GRASS
        } else if y > surface / 2 {
            BlockType::DIRT
        } else {
            BlockType::STONE
        }
    }

    /// Fills a padded voxel grid for one chunk.
    ///
    /// Every cell, margin included, is evaluated at its absolute voxel
    /// coordinate, so the margin carries exactly the data the neighboring
    /// chunks generate for themselves. Entries in the `changed_blocks`
    /// overlay (absolute voxel coordinate → block id) take precedence over
    /// generated terrain, which is how player edits survive regeneration.
    ///
    /// # Arguments
    /// * `chunk_pos` - The chunk coordinate being generated
    /// * `chunk_size` - Logical chunk edge length in voxels
    /// * `changed_blocks` - Overlay covering this chunk's padded region
    pub fn generate(
        &self,
        chunk_pos: Point3<i32>,
        chunk_size: i32,
        changed_blocks: &HashMap<Point3<i32>, BlockId>,
    ) -> VoxelGrid {
        let origin = coords::chunk_to_voxel(chunk_pos, chunk_size);
        let mut grid = VoxelGrid::new(chunk_size);

        for z in -CHUNK_MARGIN..chunk_size + CHUNK_MARGIN {
            for y in -CHUNK_MARGIN..chunk_size + CHUNK_MARGIN {
                for x in -CHUNK_MARGIN..chunk_size + CHUNK_MARGIN {
                    let local = Point3::new(x, y, z);
                    let voxel = Point3::new(origin.x + x, origin.y + y, origin.z + z);
                    let id = changed_blocks
                        .get(&voxel)
                        .copied()
                        .unwrap_or_else(|| self.block_at(voxel));
                    grid.set(local, id);
                }
            }
        }

        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(max_height: i32) -> TerrainGenerator {
        TerrainGenerator::new(42, GenerationStrategy::Flat { max_height }).unwrap()
    }

    #[test]
    fn flat_strategy_layers_grass_dirt_stone() {
        let generator = flat(6);
        for x in 0..8 {
            for z in 0..8 {
                for y in 0..8 {
                    let id = generator.block_at(Point3::new(x, y, z));
                    let expected = if y > 6 {
                        BlockType::AIR
                    } else if y == 6 {
                        BlockType::GRASS
                    } else if y > 3 {
                        BlockType::DIRT
                    } else {
                        BlockType::STONE
                    };
                    assert_eq!(id, expected.id(), "at ({x},{y},{z})");
                }
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let strategy = GenerationStrategy::Hilly {
            base_height: 10,
            amplitude: 8.0,
            scale: 0.05,
            octaves: 3,
            persistence: 0.5,
            sea_level: 7,
        };
        let a = TerrainGenerator::new(1234, strategy.clone()).unwrap();
        let b = TerrainGenerator::new(1234, strategy).unwrap();
        let overlay = HashMap::new();
        let chunk = Point3::new(-2, 0, 3);
        assert_eq!(
            a.generate(chunk, 8, &overlay).blocks(),
            b.generate(chunk, 8, &overlay).blocks()
        );
    }

    #[test]
    fn overlay_takes_precedence_over_generated_terrain() {
        let generator = flat(6);
        let chunk = Point3::new(0, 0, 0);
        let target = Point3::new(1, 1, 1);

        let mut overlay = HashMap::new();
        overlay.insert(target, BlockType::WATER.id());

        let plain = generator.generate(chunk, 8, &HashMap::new());
        let edited = generator.generate(chunk, 8, &overlay);

        assert_eq!(plain.get(target), BlockType::STONE.id());
        assert_eq!(edited.get(target), BlockType::WATER.id());
        // Every other cell is untouched by the overlay.
        assert_eq!(edited.get(Point3::new(2, 1, 1)), plain.get(Point3::new(2, 1, 1)));
        assert_eq!(edited.get(Point3::new(1, 6, 1)), BlockType::GRASS.id());
    }

    #[test]
    fn margin_matches_what_the_neighbor_generates() {
        let generator = flat(6);
        let overlay = HashMap::new();
        let west = generator.generate(Point3::new(-1, 0, 0), 8, &overlay);
        let home = generator.generate(Point3::new(0, 0, 0), 8, &overlay);
        for y in 0..8 {
            for z in 0..8 {
                // Home's -x margin column is west's x = 7 column.
                assert_eq!(
                    home.get(Point3::new(-1, y, z)),
                    west.get(Point3::new(7, y, z))
                );
            }
        }
    }

    #[test]
    fn bad_strategy_parameters_fail_at_startup() {
        let err = TerrainGenerator::new(
            1,
            GenerationStrategy::SinCos {
                base_height: 4,
                amplitude: 2.0,
                period: 0.0,
            },
        );
        assert!(err.is_err());

        let err = TerrainGenerator::new(
            1,
            GenerationStrategy::Hilly {
                base_height: 4,
                amplitude: 2.0,
                scale: 0.1,
                octaves: 0,
                persistence: 0.5,
                sea_level: 0,
            },
        );
        assert!(err.is_err());
    }
}
