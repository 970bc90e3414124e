//! # World Configuration
//!
//! All recognized tunables of the voxel world core, deserializable from
//! JSON so a hosting application or persistence collaborator can pass a
//! whole world description in one document. Validation is strict and runs
//! at world start: a bad value (or an unknown generation strategy name)
//! aborts construction rather than producing a partial world.

use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::lighting::{LIGHT_DECAY_STEP, LightingConfig, MAX_LIGHT_LEVEL};
use crate::terrain::GenerationStrategy;

/// Configuration for one voxel world instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    /// World seed; the same seed always regenerates identical terrain.
    pub seed: u32,

    /// Logical chunk edge length in voxels.
    pub chunk_size: i32,

    /// Edge length of one block in world units.
    pub block_dimension: f32,

    /// Horizontal Chebyshev radius, in chunks, within which chunks are
    /// kept loaded around the player.
    pub load_radius: i32,

    /// Vertical load radius in chunks.
    pub vertical_load_radius: i32,

    /// Ceiling on the total number of worker threads across both pools;
    /// the actual count also honors the machine's available parallelism.
    pub max_worker_count: usize,

    /// The named terrain strategy and its parameters.
    pub generation_strategy: GenerationStrategy,

    /// Brightest light level either lighting channel can carry.
    pub max_light_level: u8,

    /// Light intensity lost per propagated voxel.
    pub light_decay_step: u8,

    /// Minimum milliseconds between position-check ticks. Job results are
    /// still applied every tick; only the load/unload diff is throttled.
    pub tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: 0,
            chunk_size: 16,
            block_dimension: 1.0,
            load_radius: 3,
            vertical_load_radius: 1,
            max_worker_count: 8,
            generation_strategy: GenerationStrategy::Hilly {
                base_height: 12,
                amplitude: 10.0,
                scale: 0.02,
                octaves: 4,
                persistence: 0.5,
                sea_level: 8,
            },
            max_light_level: MAX_LIGHT_LEVEL,
            light_decay_step: LIGHT_DECAY_STEP,
            tick_interval_ms: 250,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    /// Fails on malformed JSON or an unknown `generationStrategy` name,
    /// both fatal at startup by design.
    pub fn from_json(json: &str) -> Result<Self, WorldError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every numeric range. Called by the chunk manager before any
    /// worker or chunk exists.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.chunk_size <= 0 {
            return Err(WorldError::InvalidConfig(format!(
                "chunkSize must be positive, got {}",
                self.chunk_size
            )));
        }
        if !self.block_dimension.is_finite() || self.block_dimension <= 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "blockDimension must be positive, got {}",
                self.block_dimension
            )));
        }
        if self.load_radius < 0 || self.vertical_load_radius < 0 {
            return Err(WorldError::InvalidConfig(
                "load radii must be non-negative".to_string(),
            ));
        }
        if self.max_worker_count == 0 {
            return Err(WorldError::InvalidConfig(
                "maxWorkerCount must be at least 1".to_string(),
            ));
        }
        if self.max_light_level == 0 || self.max_light_level > MAX_LIGHT_LEVEL {
            return Err(WorldError::InvalidConfig(format!(
                "maxLightLevel must be in [1, {MAX_LIGHT_LEVEL}], got {}",
                self.max_light_level
            )));
        }
        if self.light_decay_step == 0 {
            return Err(WorldError::InvalidConfig(
                "lightDecayStep must be at least 1".to_string(),
            ));
        }
        self.generation_strategy.validate()
    }

    /// The lighting parameters derived from this configuration.
    pub fn lighting(&self) -> LightingConfig {
        LightingConfig {
            max_light_level: self.max_light_level,
            decay_step: self.light_decay_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn json_round_trip_keeps_the_strategy() {
        let json = r#"{
            "seed": 42,
            "chunkSize": 8,
            "generationStrategy": { "name": "flat", "max_height": 6 }
        }"#;
        let config = WorldConfig::from_json(json).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.chunk_size, 8);
        assert!(matches!(
            config.generation_strategy,
            GenerationStrategy::Flat { max_height: 6 }
        ));
        // Unspecified fields fall back to defaults.
        assert_eq!(config.tick_interval_ms, 250);
    }

    #[test]
    fn unknown_strategy_name_is_a_startup_error() {
        let json = r#"{
            "generationStrategy": { "name": "fractal", "max_height": 6 }
        }"#;
        assert!(matches!(
            WorldConfig::from_json(json),
            Err(WorldError::Json(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut config = WorldConfig::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = WorldConfig::default();
        config.light_decay_step = 0;
        assert!(config.validate().is_err());

        let mut config = WorldConfig::default();
        config.max_worker_count = 0;
        assert!(config.validate().is_err());
    }
}
