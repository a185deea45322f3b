//! Error types shared across the crate.
//!
//! The per-frame integration step has no error type: it is total over
//! validated tuning constants. Everything that can fail does so at startup
//! (configuration, asset loading) or at presentation time (surface errors).

use std::path::PathBuf;

use thiserror::Error;

/// Asset loading failures, surfaced to the caller of the load operation.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load model {path:?}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to spawn asset loader thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("asset loader worker exited before producing a result")]
    Worker,
    #[error("failed to decode Draco primitive in mesh {mesh:?}: {reason}")]
    Draco { mesh: String, reason: String },
    #[error("model has no part whose name contains {pattern:?}")]
    MissingPart { pattern: String },
}

/// Invalid tuning constants. Fatal to starting the vehicle controller.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("vehicle velocity {velocity} exceeds max_speed {max_speed}")]
    VelocityOutOfRange { velocity: f64, max_speed: f64 },
}

/// Presentation failures reported by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
