//! # Rendering and window surfaces
//!
//! The core only needs two narrow seams from the graphics side:
//! - **`RenderBackend`**: draws one [`ObjectView`](crate::scene::ObjectView) at a time
//! - **`WindowSurface`**: polls platform events, reports close requests, presents

pub mod backend;
pub mod window;

pub use backend::{BackendResult, NullRenderer, RenderBackend, RenderError};
pub use window::{HeadlessWindow, WindowError, WindowEvent, WindowSurface};
