use glam::{Mat4, Vec3};

pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;

/// Perspective camera looking at a target point
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view, radians
    pub fov_y: f32,
    pub aspect: f32,
    /// When set, `follow` keeps this offset between target and eye
    follow_offset: Option<Vec3>,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            fov_y: DEFAULT_FOV_DEGREES.to_radians(),
            aspect,
            follow_offset: None,
        }
    }

    /// Track the vehicle, keeping the current eye-to-target offset
    pub fn with_follow(mut self) -> Self {
        self.follow_offset = Some(self.position - self.target);
        self
    }

    pub fn is_following(&self) -> bool {
        self.follow_offset.is_some()
    }

    /// Re-aim at `target`. Moves the eye only in follow mode.
    pub fn follow(&mut self, target: Vec3) {
        if let Some(offset) = self.follow_offset {
            self.target = target;
            self.position = target + offset;
        }
    }

    /// Update the aspect ratio for a new canvas size. Zero-sized canvases are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
