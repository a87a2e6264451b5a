//! GLFW-backed window
//!
//! Created without a client API; presentation belongs to the render backend,
//! so [`WindowSurface::present`] only reports success here.

use std::any::Any;

use crate::core::config::WindowSettings;
use crate::input::{KeyCode, Modifiers, MouseButton};
use crate::render::window::{WindowError, WindowEvent, WindowResult, WindowSurface};

/// OS window managed by GLFW
pub struct GlfwWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    title: String,
}

impl GlfwWindow {
    /// Open a window as configured
    pub fn new(settings: &WindowSettings) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(settings.resizable));

        let (mut window, events) = glfw
            .create_window(settings.width, settings.height, &settings.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_char_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_cursor_enter_polling(true);
        window.set_scroll_polling(true);
        window.set_close_polling(true);
        window.set_size_polling(true);

        log::info!("Opened GLFW window '{}' ({}x{})", settings.title, settings.width, settings.height);
        Ok(Self {
            glfw,
            window,
            events,
            title: settings.title.clone(),
        })
    }
}

fn translate_key(key: glfw::Key) -> KeyCode {
    use glfw::Key;
    match key {
        Key::A => KeyCode::A,
        Key::B => KeyCode::B,
        Key::C => KeyCode::C,
        Key::D => KeyCode::D,
        Key::E => KeyCode::E,
        Key::F => KeyCode::F,
        Key::G => KeyCode::G,
        Key::H => KeyCode::H,
        Key::I => KeyCode::I,
        Key::J => KeyCode::J,
        Key::K => KeyCode::K,
        Key::L => KeyCode::L,
        Key::M => KeyCode::M,
        Key::N => KeyCode::N,
        Key::O => KeyCode::O,
        Key::P => KeyCode::P,
        Key::Q => KeyCode::Q,
        Key::R => KeyCode::R,
        Key::S => KeyCode::S,
        Key::T => KeyCode::T,
        Key::U => KeyCode::U,
        Key::V => KeyCode::V,
        Key::W => KeyCode::W,
        Key::X => KeyCode::X,
        Key::Y => KeyCode::Y,
        Key::Z => KeyCode::Z,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::Escape => KeyCode::Escape,
        Key::Tab => KeyCode::Tab,
        Key::Backspace => KeyCode::Backspace,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        other => KeyCode::Other(other as i32),
    }
}

fn translate_modifiers(mods: glfw::Modifiers) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, mods.contains(glfw::Modifiers::Shift));
    modifiers.set(Modifiers::CONTROL, mods.contains(glfw::Modifiers::Control));
    modifiers.set(Modifiers::ALT, mods.contains(glfw::Modifiers::Alt));
    modifiers.set(Modifiers::SUPER, mods.contains(glfw::Modifiers::Super));
    modifiers
}

fn translate_event(event: glfw::WindowEvent) -> Option<WindowEvent> {
    let translated = match event {
        glfw::WindowEvent::Key(key, _, action, mods) => WindowEvent::Key {
            key: translate_key(key),
            pressed: action != glfw::Action::Release,
            modifiers: translate_modifiers(mods),
        },
        glfw::WindowEvent::MouseButton(button, action, _) => {
            let button = match button {
                glfw::MouseButton::Button1 => MouseButton::Left,
                glfw::MouseButton::Button2 => MouseButton::Right,
                glfw::MouseButton::Button3 => MouseButton::Middle,
                _ => return None,
            };
            WindowEvent::MouseButton {
                button,
                pressed: action == glfw::Action::Press,
            }
        }
        glfw::WindowEvent::CursorPos(x, y) => WindowEvent::CursorMoved { x, y },
        glfw::WindowEvent::CursorEnter(entered) => WindowEvent::CursorEnter(entered),
        glfw::WindowEvent::Scroll(x, y) => WindowEvent::Scroll { x, y },
        glfw::WindowEvent::Char(character) => WindowEvent::Char(character),
        glfw::WindowEvent::Close => WindowEvent::CloseRequested,
        glfw::WindowEvent::Size(width, height) => WindowEvent::Resized {
            width: u32::try_from(width).unwrap_or(0),
            height: u32::try_from(height).unwrap_or(0),
        },
        _ => return None,
    };
    Some(translated)
}

impl WindowSurface for GlfwWindow {
    fn is_close_requested(&self) -> bool {
        self.window.should_close()
    }

    fn request_close(&mut self) {
        self.window.set_should_close(true);
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate_event(event))
            .collect()
    }

    fn present(&mut self) -> WindowResult<()> {
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0))
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
