use std::path::Path;

use anyhow::{Context, Result};
use glam::{DVec3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::TuningConstants;

/// Kinematic state of the vehicle.
///
/// Kept in f64 so that per-frame increments accumulate onto the configured
/// bounds exactly; converted to f32 only when handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: DVec3,
    /// Facing angle around +Y, radians. Unbounded.
    pub heading: f64,
    /// Signed forward speed in world units per step
    pub velocity: f64,
}

impl VehicleState {
    pub fn new(position: DVec3, heading: f64) -> Self {
        Self {
            position,
            heading,
            velocity: 0.0,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.velocity == 0.0
    }

    /// Unit vector the vehicle travels along at positive velocity
    pub fn forward(&self) -> DVec3 {
        DVec3::new(-self.heading.cos(), 0.0, self.heading.sin())
    }

    /// Model matrix for rendering (rotation about Y, then translation)
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(
            Quat::from_rotation_y(self.heading as f32),
            self.position.as_vec3(),
        )
    }

    pub fn render_position(&self) -> Vec3 {
        self.position.as_vec3()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Read a saved state and check it against the tuning it will be driven with
    pub fn load(path: impl AsRef<Path>, tuning: &TuningConstants) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vehicle state: {:?}", path))?;
        let state = Self::from_json(&text)
            .with_context(|| format!("Failed to parse vehicle state: {:?}", path))?;
        tuning
            .validate_state(&state)
            .with_context(|| format!("Invalid vehicle state: {:?}", path))?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vehicle_is_stopped() {
        let state = VehicleState::new(DVec3::new(1.0, 0.0, 2.0), 0.5);
        assert!(state.is_stopped());
        assert_eq!(state.heading, 0.5);
    }

    #[test]
    fn test_forward_at_zero_heading() {
        let state = VehicleState::default();
        let fwd = state.forward();
        assert_eq!(fwd.x, -1.0);
        assert_eq!(fwd.z, 0.0);
    }

    #[test]
    fn test_transform_translates() {
        let state = VehicleState::new(DVec3::new(3.0, 0.0, -2.0), 0.0);
        let point = state.transform().transform_point3(Vec3::ZERO);
        assert!((point - Vec3::new(3.0, 0.0, -2.0)).length() < 1e-6);
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let state = VehicleState {
            position: DVec3::new(0.1, 0.0, -12.345678901234),
            heading: 1.0 / 3.0,
            velocity: -0.017,
        };
        let json = state.to_json().unwrap();
        let restored = VehicleState::from_json(&json).unwrap();
        assert_eq!(state, restored);
    }
}
