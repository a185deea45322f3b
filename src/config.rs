// config.rs - Vehicle tuning constants
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::VehicleState;
use crate::error::ConfigError;

/// Upper bound on the per-frame scale factor in [`StepMode::Scaled`].
/// A stalled frame advances at most this many reference frames.
pub const MAX_STEP_SCALE: f64 = 4.0;

/// How tuning increments relate to wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StepMode {
    /// Fixed increments per rendered frame. Motion speed depends on refresh rate.
    PerFrame,
    /// Increments are multiplied by `delta * reference_hz`, so the vehicle
    /// moves at the same speed it would under `PerFrame` at `reference_hz`.
    Scaled { reference_hz: f64 },
}

impl Default for StepMode {
    fn default() -> Self {
        StepMode::PerFrame
    }
}

impl StepMode {
    /// Scale factor applied to every increment for a frame of `delta` seconds
    pub fn scale(&self, delta: f32) -> f64 {
        match *self {
            StepMode::PerFrame => 1.0,
            StepMode::Scaled { reference_hz } => {
                (f64::from(delta.max(0.0)) * reference_hz).min(MAX_STEP_SCALE)
            }
        }
    }
}

/// Immutable motion tuning, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConstants {
    /// Heading change in radians per frame while a turn intent is held
    pub rotation_step: f64,
    /// Velocity gained per frame while accelerating or braking
    pub acceleration: f64,
    /// Velocity lost per frame while coasting
    pub deceleration: f64,
    /// Bound on |velocity|
    pub max_speed: f64,
    pub step_mode: StepMode,
}

impl Default for TuningConstants {
    fn default() -> Self {
        Self {
            rotation_step: 0.02,
            acceleration: 0.005,
            deceleration: 0.01,
            max_speed: 0.3,
            step_mode: StepMode::PerFrame,
        }
    }
}

impl TuningConstants {
    /// Read and validate a JSON tuning file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate tuning constants from JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let tuning: TuningConstants = serde_json::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject constants that would break the integrator's guarantees.
    ///
    /// A non-positive deceleration never settles, a non-positive acceleration
    /// or max speed makes the intents meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("acceleration", self.acceleration)?;
        positive("deceleration", self.deceleration)?;
        positive("max_speed", self.max_speed)?;

        if !self.rotation_step.is_finite() {
            return Err(ConfigError::NonFinite { field: "rotation_step" });
        }
        if self.rotation_step < 0.0 {
            return Err(ConfigError::Negative {
                field: "rotation_step",
                value: self.rotation_step,
            });
        }

        if let StepMode::Scaled { reference_hz } = self.step_mode {
            positive("step_mode.reference_hz", reference_hz)?;
        }

        Ok(())
    }

    /// Check a state loaded from disk against these constants.
    ///
    /// The integrator only clamps the pedal that pushes past the bound, so a
    /// start velocity above `max_speed` would never be pulled back down.
    pub fn validate_state(&self, state: &VehicleState) -> Result<(), ConfigError> {
        let p = state.position;
        for (field, value) in [
            ("position.x", p.x),
            ("position.y", p.y),
            ("position.z", p.z),
            ("heading", state.heading),
            ("velocity", state.velocity),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        if state.velocity.abs() > self.max_speed {
            return Err(ConfigError::VelocityOutOfRange {
                velocity: state.velocity,
                max_speed: self.max_speed,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}
