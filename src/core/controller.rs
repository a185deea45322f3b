use serde::{Deserialize, Serialize};

/// Discrete control signal derived from keyboard state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Accelerate,
    Brake,
    TurnLeft,
    TurnRight,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::Accelerate,
        Intent::Brake,
        Intent::TurnLeft,
        Intent::TurnRight,
    ];
}

/// Currently active intents.
///
/// Written by key handlers, read once per frame by the integrator.
/// Latest write wins per intent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    pub accelerate: bool,
    pub brake: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

impl ControlInput {
    /// Activate or release an intent. Idempotent.
    pub fn set_intent(&mut self, intent: Intent, active: bool) {
        match intent {
            Intent::Accelerate => self.accelerate = active,
            Intent::Brake => self.brake = active,
            Intent::TurnLeft => self.turn_left = active,
            Intent::TurnRight => self.turn_right = active,
        }
    }

    pub fn is_active(&self, intent: Intent) -> bool {
        match intent {
            Intent::Accelerate => self.accelerate,
            Intent::Brake => self.brake,
            Intent::TurnLeft => self.turn_left,
            Intent::TurnRight => self.turn_right,
        }
    }

    /// True when neither Accelerate nor Brake is held
    pub fn is_coasting(&self) -> bool {
        !self.accelerate && !self.brake
    }

    /// Iterate active intents in declaration order
    pub fn active(&self) -> impl Iterator<Item = Intent> + '_ {
        Intent::ALL.into_iter().filter(|&intent| self.is_active(intent))
    }

    /// Release everything (e.g. when the window loses focus)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
