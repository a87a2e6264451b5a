//! Input management system
//!
//! The window layer reports raw [`WindowEvent`]s; the [`InputManager`] folds
//! them into keyboard, mouse and joystick state. Components read the
//! resulting [`InputState`] through their services.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use crate::render::window::WindowEvent;

bitflags! {
    /// Modifier keys held during a key event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Either shift key
        const SHIFT = 1 << 0;
        /// Either control key
        const CONTROL = 1 << 1;
        /// Either alt key
        const ALT = 1 << 2;
        /// Either super / command key
        const SUPER = 1 << 3;
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Tab key
    Tab,
    /// Backspace key
    Backspace,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Any key without a dedicated variant
    Other(i32),
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// State of one joystick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoystickState {
    /// Axis values in `[-1, 1]`, indexed by axis number
    pub axes: Vec<f32>,
    /// Buttons currently held
    pub buttons: HashSet<u8>,
}

/// Snapshot of every input device
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    previous_keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    previous_mouse_buttons: HashSet<MouseButton>,
    modifiers: Modifiers,
    cursor: (f64, f64),
    cursor_delta: (f64, f64),
    scroll: (f64, f64),
    cursor_inside: bool,
    joysticks: HashMap<u8, JoystickState>,
    typed: Vec<char>,
}

impl InputState {
    /// Key is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Key went down since the last update tick
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.contains(&key) && !self.previous_keys.contains(&key)
    }

    /// Key went up since the last update tick
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        !self.keys.contains(&key) && self.previous_keys.contains(&key)
    }

    /// Mouse button is held
    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Mouse button went down since the last update tick
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button) && !self.previous_mouse_buttons.contains(&button)
    }

    /// Modifiers of the last key event
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Cursor position in window coordinates
    pub fn cursor_position(&self) -> (f64, f64) {
        self.cursor
    }

    /// Cursor movement since the last update tick
    pub fn cursor_delta(&self) -> (f64, f64) {
        self.cursor_delta
    }

    /// Scroll since the last update tick
    pub fn scroll_delta(&self) -> (f64, f64) {
        self.scroll
    }

    /// Whether the cursor is inside the window
    pub fn is_cursor_inside(&self) -> bool {
        self.cursor_inside
    }

    /// Characters typed since the last update tick
    pub fn typed_chars(&self) -> &[char] {
        &self.typed
    }

    /// State of a connected joystick
    pub fn joystick(&self, id: u8) -> Option<&JoystickState> {
        self.joysticks.get(&id)
    }

    /// Axis value, zero when unknown
    pub fn joystick_axis(&self, id: u8, axis: u8) -> f32 {
        self.joystick(id)
            .and_then(|joystick| joystick.axes.get(usize::from(axis)).copied())
            .unwrap_or(0.0)
    }
}

/// Input manager
#[derive(Debug, Default)]
pub struct InputManager {
    state: InputState,
}

impl InputManager {
    /// Create a new input manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// End of an update tick: current device state becomes the previous state
    pub fn update(&mut self) {
        let state = &mut self.state;
        state.previous_keys.clone_from(&state.keys);
        state.previous_mouse_buttons.clone_from(&state.mouse_buttons);
        state.cursor_delta = (0.0, 0.0);
        state.scroll = (0.0, 0.0);
        state.typed.clear();
    }

    /// Fold one window event into the device state
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match *event {
            WindowEvent::Key { key, pressed, modifiers } => self.handle_key_input(key, pressed, modifiers),
            WindowEvent::MouseButton { button, pressed } => self.handle_mouse_button(button, pressed),
            WindowEvent::CursorMoved { x, y } => self.handle_mouse_move(x, y),
            WindowEvent::CursorEnter(entered) => self.state.cursor_inside = entered,
            WindowEvent::Scroll { x, y } => {
                self.state.scroll.0 += x;
                self.state.scroll.1 += y;
            }
            WindowEvent::Char(character) => self.state.typed.push(character),
            WindowEvent::JoystickAxis { joystick, axis, value } => {
                let axes = &mut self.state.joysticks.entry(joystick).or_default().axes;
                let index = usize::from(axis);
                if axes.len() <= index {
                    axes.resize(index + 1, 0.0);
                }
                axes[index] = value.clamp(-1.0, 1.0);
            }
            WindowEvent::JoystickButton { joystick, button, pressed } => {
                let buttons = &mut self.state.joysticks.entry(joystick).or_default().buttons;
                if pressed {
                    buttons.insert(button);
                } else {
                    buttons.remove(&button);
                }
            }
            WindowEvent::JoystickConnected { joystick, connected } => {
                if connected {
                    self.state.joysticks.entry(joystick).or_default();
                } else {
                    self.state.joysticks.remove(&joystick);
                }
            }
            WindowEvent::Resized { .. } | WindowEvent::CloseRequested => {}
        }
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool, modifiers: Modifiers) {
        self.state.modifiers = modifiers;
        if pressed {
            self.state.keys.insert(key);
        } else {
            self.state.keys.remove(&key);
        }
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.state.mouse_buttons.insert(button);
        } else {
            self.state.mouse_buttons.remove(&button);
        }
    }

    /// Handle mouse movement
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        let (old_x, old_y) = self.state.cursor;
        self.state.cursor_delta.0 += x - old_x;
        self.state.cursor_delta.1 += y - old_y;
        self.state.cursor = (x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: KeyCode, pressed: bool) -> WindowEvent {
        WindowEvent::Key {
            key,
            pressed,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn test_key_pressed_only_until_update() {
        let mut input = InputManager::new();
        input.handle_event(&key(KeyCode::Space, true));

        assert!(input.state().is_key_down(KeyCode::Space));
        assert!(input.state().is_key_pressed(KeyCode::Space));

        input.update();
        assert!(input.state().is_key_down(KeyCode::Space));
        assert!(!input.state().is_key_pressed(KeyCode::Space));

        input.handle_event(&key(KeyCode::Space, false));
        assert!(input.state().is_key_released(KeyCode::Space));
    }

    #[test]
    fn test_mouse_delta_accumulates_between_updates() {
        let mut input = InputManager::new();
        input.handle_event(&WindowEvent::CursorMoved { x: 10.0, y: 5.0 });
        input.handle_event(&WindowEvent::CursorMoved { x: 15.0, y: 5.0 });
        input.handle_event(&WindowEvent::MouseButton { button: MouseButton::Left, pressed: true });

        assert_eq!(input.state().cursor_position(), (15.0, 5.0));
        assert_eq!(input.state().cursor_delta(), (15.0, 5.0));
        assert!(input.state().is_mouse_pressed(MouseButton::Left));

        input.update();
        assert_eq!(input.state().cursor_delta(), (0.0, 0.0));
        assert!(input.state().is_mouse_down(MouseButton::Left));
        assert!(!input.state().is_mouse_pressed(MouseButton::Left));
    }

    #[test]
    fn test_joystick_axes_and_disconnect() {
        let mut input = InputManager::new();
        input.handle_event(&WindowEvent::JoystickAxis { joystick: 0, axis: 2, value: 1.5 });
        input.handle_event(&WindowEvent::JoystickButton { joystick: 0, button: 1, pressed: true });

        assert_eq!(input.state().joystick_axis(0, 2), 1.0);
        assert_eq!(input.state().joystick_axis(0, 0), 0.0);
        assert!(input.state().joystick(0).unwrap().buttons.contains(&1));

        input.handle_event(&WindowEvent::JoystickConnected { joystick: 0, connected: false });
        assert!(input.state().joystick(0).is_none());
    }

    #[test]
    fn test_modifiers_and_typed_chars() {
        let mut input = InputManager::new();
        input.handle_event(&WindowEvent::Key {
            key: KeyCode::A,
            pressed: true,
            modifiers: Modifiers::SHIFT | Modifiers::CONTROL,
        });
        input.handle_event(&WindowEvent::Char('A'));

        assert!(input.state().modifiers().contains(Modifiers::SHIFT));
        assert_eq!(input.state().typed_chars(), &['A']);

        input.update();
        assert!(input.state().typed_chars().is_empty());
    }
}
