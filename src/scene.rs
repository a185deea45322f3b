use glam::{Mat4, Vec3};

use crate::core::{ControlInput, VehicleState};
use crate::loaders::{ModelAsset, Part, WHEEL_PATTERN};

/// Ambient light colour (0x707070)
pub const AMBIENT_LIGHT: [f32; 3] = [112.0 / 255.0, 112.0 / 255.0, 112.0 / 255.0];

/// Direction towards the key light, world space
pub const LIGHT_DIRECTION: [f32; 3] = [0.4, 1.0, 0.3];

/// Half extent of the ground plane
pub const GROUND_HALF_EXTENT: f32 = 200.0;

/// The controllable vehicle: kinematic state plus the model it drives
#[derive(Debug, Clone)]
pub struct VehicleEntity {
    pub state: VehicleState,
    pub model: ModelAsset,
}

impl VehicleEntity {
    pub fn new(model: ModelAsset, state: VehicleState) -> Self {
        if model.parts.group(WHEEL_PATTERN).next().is_none() {
            log::warn!("Model has no parts matching {:?}", WHEEL_PATTERN);
        }
        Self { state, model }
    }

    /// Model matrix driven by the current state
    pub fn transform(&self) -> Mat4 {
        self.state.transform()
    }

    pub fn wheels(&self) -> impl Iterator<Item = &Part> + '_ {
        self.model.parts.group(WHEEL_PATTERN)
    }
}

/// Everything the renderer draws
#[derive(Debug, Clone)]
pub struct Scene {
    pub vehicle: VehicleEntity,
    /// Input applied by the most recent integration step
    pub last_input: ControlInput,
    /// Delta of the frame that produced this state, seconds
    pub last_delta: f32,
    pub ambient: [f32; 3],
    pub light_direction: Vec3,
}

impl Scene {
    pub fn new(vehicle: VehicleEntity) -> Self {
        Self {
            vehicle,
            last_input: ControlInput::default(),
            last_delta: 0.0,
            ambient: AMBIENT_LIGHT,
            light_direction: Vec3::from_array(LIGHT_DIRECTION).normalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_vehicle_transform_follows_state() {
        let mut vehicle = VehicleEntity::new(ModelAsset::placeholder(), VehicleState::default());
        vehicle.state.position = DVec3::new(2.0, 0.0, -1.0);

        let origin = vehicle.transform().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(2.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_placeholder_wheels_resolved() {
        let vehicle = VehicleEntity::new(ModelAsset::placeholder(), VehicleState::default());
        assert_eq!(vehicle.wheels().count(), 4);
    }

    #[test]
    fn test_scene_light_is_normalized() {
        let scene = Scene::new(VehicleEntity::new(
            ModelAsset::placeholder(),
            VehicleState::default(),
        ));
        assert!((scene.light_direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(scene.ambient, AMBIENT_LIGHT);
    }
}
