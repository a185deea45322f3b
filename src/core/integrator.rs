use crate::config::TuningConstants;

use super::controller::ControlInput;
use super::vehicle::VehicleState;

/// Advances a [`VehicleState`] by one integration step per rendered frame.
///
/// Order within a step: turning, speed change, coasting decay, translation.
/// Translation uses the heading produced by the same step.
#[derive(Debug, Clone, Copy)]
pub struct MotionIntegrator {
    tuning: TuningConstants,
}

impl MotionIntegrator {
    /// `tuning` must already be validated
    pub fn new(tuning: TuningConstants) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &TuningConstants {
        &self.tuning
    }

    /// Pure form of [`step`](Self::step)
    pub fn advance(&self, state: VehicleState, input: &ControlInput, delta: f32) -> VehicleState {
        let mut next = state;
        self.step(&mut next, input, delta);
        next
    }

    /// Advance `state` in place by one frame of `delta` seconds.
    /// `delta` only matters in scaled step mode.
    pub fn step(&self, state: &mut VehicleState, input: &ControlInput, delta: f32) {
        let t = &self.tuning;
        let scale = t.step_mode.scale(delta);

        if input.turn_left {
            state.heading += t.rotation_step * scale;
        }
        if input.turn_right {
            state.heading -= t.rotation_step * scale;
        }

        let accel = t.acceleration * scale;
        if input.accelerate && state.velocity < t.max_speed {
            state.velocity = (state.velocity + accel).min(t.max_speed);
        }
        if input.brake && state.velocity > -t.max_speed {
            state.velocity = (state.velocity - accel).max(-t.max_speed);
        }

        if input.is_coasting() {
            state.velocity = decay_toward_zero(state.velocity, t.deceleration * scale);
        }

        let distance = state.velocity * scale;
        state.position.x += -distance * state.heading.cos();
        state.position.z += distance * state.heading.sin();
    }
}

/// Move `velocity` toward zero by `amount`, snapping to exactly zero
/// instead of crossing it.
fn decay_toward_zero(velocity: f64, amount: f64) -> f64 {
    if velocity.abs() <= amount {
        0.0
    } else {
        velocity - amount * velocity.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_snaps_inside_band() {
        assert_eq!(decay_toward_zero(0.004, 0.01), 0.0);
        assert_eq!(decay_toward_zero(-0.004, 0.01), 0.0);
        assert_eq!(decay_toward_zero(0.01, 0.01), 0.0);
        assert_eq!(decay_toward_zero(0.0, 0.01), 0.0);
    }

    #[test]
    fn decay_keeps_sign_outside_band() {
        assert!((decay_toward_zero(0.05, 0.01) - 0.04).abs() < 1e-12);
        assert!((decay_toward_zero(-0.05, 0.01) + 0.04).abs() < 1e-12);
    }

    #[test]
    fn both_pedals_cancel_and_skip_decay() {
        let integrator = MotionIntegrator::new(TuningConstants::default());
        let input = ControlInput {
            accelerate: true,
            brake: true,
            ..Default::default()
        };
        let state = VehicleState {
            velocity: 0.1,
            ..Default::default()
        };
        let next = integrator.advance(state, &input, 0.016);
        assert!((next.velocity - 0.1).abs() < 1e-12);
    }
}
