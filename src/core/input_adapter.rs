use std::collections::HashMap;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{ControlInput, Intent};

/// Key code to intent table
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Intent>,
}

impl KeyBindings {
    /// Empty table - every key is ignored
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    /// Bind a key, replacing any previous binding for it
    pub fn bind(mut self, key: KeyCode, intent: Intent) -> Self {
        self.map.insert(key, intent);
        self
    }

    pub fn intent_for(&self, key: KeyCode) -> Option<Intent> {
        self.map.get(&key).copied()
    }
}

impl Default for KeyBindings {
    /// W forward, S brake/reverse, A left, D right
    fn default() -> Self {
        Self::empty()
            .bind(KeyCode::KeyW, Intent::Accelerate)
            .bind(KeyCode::KeyS, Intent::Brake)
            .bind(KeyCode::KeyA, Intent::TurnLeft)
            .bind(KeyCode::KeyD, Intent::TurnRight)
    }
}

/// Adapter that bridges Winit keyboard events to [`ControlInput`]
#[derive(Debug, Clone, Default)]
pub struct KeyboardInput {
    bindings: KeyBindings,
}

impl KeyboardInput {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Apply a key press or release. Returns false for unbound keys,
    /// which leave `input` untouched.
    pub fn handle_key(&self, key: KeyCode, pressed: bool, input: &mut ControlInput) -> bool {
        match self.bindings.intent_for(key) {
            Some(intent) => {
                input.set_intent(intent, pressed);
                true
            }
            None => false,
        }
    }

    /// Process a Winit WindowEvent and update `input`.
    /// Returns true if the event changed an intent binding.
    pub fn process_event(&self, event: &WindowEvent, input: &mut ControlInput) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                // OS auto-repeat re-sends Pressed while held
                if event.repeat {
                    return false;
                }
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    return self.handle_key(keycode, pressed, input);
                }
                false
            }
            WindowEvent::Focused(false) => {
                // Key-up events are lost while unfocused
                input.clear();
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Winit KeyEvent has private fields, so these go through handle_key

    #[test]
    fn test_default_bindings_are_wasd() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.intent_for(KeyCode::KeyW), Some(Intent::Accelerate));
        assert_eq!(bindings.intent_for(KeyCode::KeyS), Some(Intent::Brake));
        assert_eq!(bindings.intent_for(KeyCode::KeyA), Some(Intent::TurnLeft));
        assert_eq!(bindings.intent_for(KeyCode::KeyD), Some(Intent::TurnRight));
        assert_eq!(bindings.intent_for(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_press_and_release() {
        let keyboard = KeyboardInput::default();
        let mut input = ControlInput::default();

        assert!(keyboard.handle_key(KeyCode::KeyW, true, &mut input));
        assert!(input.accelerate);

        assert!(keyboard.handle_key(KeyCode::KeyW, false, &mut input));
        assert_eq!(input, ControlInput::default());
    }

    #[test]
    fn test_unbound_keys_ignored() {
        let keyboard = KeyboardInput::default();
        let mut input = ControlInput::default();
        input.set_intent(Intent::TurnLeft, true);
        let before = input;

        for key in [KeyCode::Space, KeyCode::KeyQ, KeyCode::ArrowUp, KeyCode::Escape] {
            assert!(!keyboard.handle_key(key, true, &mut input));
            assert!(!keyboard.handle_key(key, false, &mut input));
        }
        assert_eq!(input, before);
    }

    #[test]
    fn test_custom_bindings() {
        let keyboard = KeyboardInput::new(
            KeyBindings::empty()
                .bind(KeyCode::ArrowUp, Intent::Accelerate)
                .bind(KeyCode::ArrowLeft, Intent::TurnLeft),
        );
        let mut input = ControlInput::default();

        assert!(!keyboard.handle_key(KeyCode::KeyW, true, &mut input));
        assert!(keyboard.handle_key(KeyCode::ArrowUp, true, &mut input));
        assert!(keyboard.handle_key(KeyCode::ArrowLeft, true, &mut input));
        assert!(input.accelerate);
        assert!(input.turn_left);
    }

    #[test]
    fn test_rebind_replaces() {
        let bindings = KeyBindings::default().bind(KeyCode::KeyW, Intent::Brake);
        assert_eq!(bindings.intent_for(KeyCode::KeyW), Some(Intent::Brake));
    }
}
