//! Window management subsystem
//!
//! The engine talks to the platform window only through [`WindowSurface`]:
//! close detection, event polling and presentation. Two implementations ship
//! with the crate:
//!
//! - **`headless`**: scripted events, no OS window; used by tests and the demo
//! - **`glfw`** (feature `glfw`): a real GLFW window

pub mod backend;
pub mod headless;

#[cfg(feature = "glfw")]
pub mod glfw;

use crate::input::{KeyCode, Modifiers, MouseButton};

pub use backend::{WindowError, WindowResult, WindowSurface};
pub use headless::HeadlessWindow;

#[cfg(feature = "glfw")]
pub use self::glfw::GlfwWindow;

/// Platform event delivered by [`WindowSurface::poll_events`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    /// Key pressed or released
    Key {
        /// Key
        key: KeyCode,
        /// `true` on press and repeat
        pressed: bool,
        /// Modifiers held
        modifiers: Modifiers,
    },
    /// Mouse button pressed or released
    MouseButton {
        /// Button
        button: MouseButton,
        /// `true` on press
        pressed: bool,
    },
    /// Cursor moved to a window position
    CursorMoved {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },
    /// Cursor entered (`true`) or left the window
    CursorEnter(bool),
    /// Scroll wheel or touchpad scroll
    Scroll {
        /// Horizontal offset
        x: f64,
        /// Vertical offset
        y: f64,
    },
    /// Unicode character typed
    Char(char),
    /// Joystick axis moved
    JoystickAxis {
        /// Joystick slot
        joystick: u8,
        /// Axis index
        axis: u8,
        /// New value
        value: f32,
    },
    /// Joystick button changed
    JoystickButton {
        /// Joystick slot
        joystick: u8,
        /// Button index
        button: u8,
        /// `true` on press
        pressed: bool,
    },
    /// Joystick plugged in or removed
    JoystickConnected {
        /// Joystick slot
        joystick: u8,
        /// `true` when connected
        connected: bool,
    },
    /// Client area resized
    Resized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// The user asked to close the window
    CloseRequested,
}
