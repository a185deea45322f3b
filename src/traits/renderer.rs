use crate::camera::Camera;
use crate::error::RenderError;
use crate::scene::Scene;

/// Scene renderer - the drawing collaborator driven by the render loop
pub trait SceneRenderer {
    /// Apply a pending canvas resize, updating the camera projection.
    /// Returns true if a resize was applied.
    fn resize_if_needed(&mut self, camera: &mut Camera) -> bool;

    /// Draw the scene as seen from `camera`
    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError>;
}
