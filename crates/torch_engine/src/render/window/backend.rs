//! Backend-agnostic window trait

use std::any::Any;

use thiserror::Error;

use crate::render::window::WindowEvent;

/// Window errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// The windowing library could not start
    #[error("Window system initialization failed: {0}")]
    InitializationFailed(String),

    /// The OS window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Presenting the frame failed
    #[error("Present failed: {0}")]
    PresentFailed(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Window surface driven by the main loop
///
/// Window operations typically need to happen on the main thread, so the
/// trait does not require `Send`.
pub trait WindowSurface {
    /// Whether the user or the application asked to close the window
    fn is_close_requested(&self) -> bool;

    /// Ask the window to close; the loop stops at its next check
    fn request_close(&mut self);

    /// Process pending platform events and return them in arrival order
    fn poll_events(&mut self) -> Vec<WindowEvent>;

    /// Show the frame that was just rendered
    fn present(&mut self) -> WindowResult<()>;

    /// Client area size in pixels
    fn size(&self) -> (u32, u32);

    /// Window title
    fn title(&self) -> &str;

    /// Get access to the concrete type for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get mutable access to the concrete type for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
