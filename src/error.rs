//! # Error Types
//!
//! Fatal, startup-time errors for the voxel world core. Recoverable
//! conditions (stale job results, queries into unloaded chunks, per-job
//! worker failures) are intentionally *not* represented here: they are
//! expected outcomes and are modeled with `Option` returns and job outcome
//! variants instead.

use thiserror::Error;

/// Errors that abort world construction.
///
/// These are raised while validating configuration and building the terrain
/// generator, before any chunk is loaded. There is no partial-world recovery:
/// callers should surface the error and exit.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured generation strategy carries unusable parameters.
    #[error("invalid generation strategy: {0}")]
    InvalidStrategy(String),

    /// Configuration or payload JSON failed to parse. An unknown strategy
    /// name surfaces here, at startup, rather than as a per-voxel error.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted chunk payload does not match the world's chunk size.
    #[error("payload block array has {actual} entries, expected {expected}")]
    PayloadSize {
        /// Number of entries the padded grid requires.
        expected: usize,
        /// Number of entries the payload actually carried.
        actual: usize,
    },
}
