use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::frame::FrameInfo;
use crate::scene::Scene;
use crate::traits::{FrameSource, SceneRenderer};

use super::controller::ControlInput;
use super::integrator::MotionIntegrator;
use super::replay::InputRecorder;
use super::timer::Throttled;

/// Seconds between vehicle telemetry log lines
const TELEMETRY_INTERVAL: f32 = 1.0;

/// Cancellation token for a [`RenderLoop`]
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Whether the host should schedule another frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Continue,
    Stopped,
}

/// Per-frame driver: clock, one integration step, then render.
///
/// The host calls [`run_frame`](Self::run_frame) once per display refresh and
/// schedules the next call only while it returns [`LoopStatus::Continue`].
pub struct RenderLoop<F: FrameSource> {
    frames: F,
    integrator: MotionIntegrator,
    stop: StopHandle,
    recorder: Option<InputRecorder>,
    telemetry: Throttled,
    last_frame: Option<FrameInfo>,
}

impl<F: FrameSource> RenderLoop<F> {
    pub fn new(frames: F, integrator: MotionIntegrator) -> Self {
        Self {
            frames,
            integrator,
            stop: StopHandle::new(),
            recorder: None,
            telemetry: Throttled::new(TELEMETRY_INTERVAL),
            last_frame: None,
        }
    }

    /// Record the input and delta used by every subsequent step
    pub fn with_recorder(mut self, recorder: InputRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn integrator(&self) -> &MotionIntegrator {
        &self.integrator
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }

    pub fn last_frame(&self) -> Option<FrameInfo> {
        self.last_frame
    }

    pub fn recorder(&self) -> Option<&InputRecorder> {
        self.recorder.as_ref()
    }

    pub fn take_recorder(&mut self) -> Option<InputRecorder> {
        self.recorder.take()
    }

    /// Advance the vehicle by exactly one step and hand the scene to the renderer
    pub fn run_frame<R: SceneRenderer + ?Sized>(
        &mut self,
        scene: &mut Scene,
        camera: &mut Camera,
        input: &ControlInput,
        renderer: &mut R,
    ) -> Result<LoopStatus, RenderError> {
        if self.stop.is_stopped() {
            return Ok(LoopStatus::Stopped);
        }

        let Some(frame) = self.frames.next() else {
            log::info!("Frame source exhausted, stopping");
            self.stop.stop();
            return Ok(LoopStatus::Stopped);
        };
        self.last_frame = Some(frame);

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(*input, frame.delta);
        }

        scene.last_input = *input;
        scene.last_delta = frame.delta;
        let state = &mut scene.vehicle.state;
        self.integrator.step(state, input, frame.delta);

        if self.telemetry.try_tick(frame.delta) {
            log::debug!(
                "frame {}: pos=({:.3}, {:.3}) heading={:.3} velocity={:.4}",
                frame.number,
                state.position.x,
                state.position.z,
                state.heading,
                state.velocity
            );
        }

        camera.follow(scene.vehicle.state.render_position());

        if renderer.resize_if_needed(camera) {
            log::debug!("Viewport resized, aspect {:.3}", camera.aspect);
        }
        renderer.render(scene, camera)?;

        Ok(LoopStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_handle_is_shared() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_stopped());

        clone.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn stop_is_idempotent() {
        let handle = StopHandle::new();
        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());
    }
}
