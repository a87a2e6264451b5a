//! Render backend trait
//!
//! The engine issues one `render` (and optionally one `render_gizmos`) call
//! per live object per frame; everything GPU-side belongs to the backend.

use std::any::Any;

use thiserror::Error;

use crate::scene::ObjectView;

/// Render backend errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend could not be created
    #[error("Backend initialization failed: {0}")]
    InitializationFailed(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Main rendering backend trait
pub trait RenderBackend {
    /// Start recording a frame
    fn begin_frame(&mut self) -> BackendResult<()> {
        Ok(())
    }

    /// Draw one object
    fn render(&mut self, object: &ObjectView) -> BackendResult<()>;

    /// Draw debug gizmos for one object
    fn render_gizmos(&mut self, _object: &ObjectView) -> BackendResult<()> {
        Ok(())
    }

    /// Finish the frame; presentation is the window's job
    fn end_frame(&mut self) -> BackendResult<()> {
        Ok(())
    }

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn Any;
}

/// Backend that draws nothing and counts what it was asked to draw
#[derive(Debug, Default, Clone)]
pub struct NullRenderer {
    frames: u64,
    objects: u64,
    gizmos: u64,
    last_frame: Vec<String>,
    recording: Vec<String>,
}

impl NullRenderer {
    /// Create a new null renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total `render` calls
    pub fn objects_rendered(&self) -> u64 {
        self.objects
    }

    /// Total `render_gizmos` calls
    pub fn gizmos_rendered(&self) -> u64 {
        self.gizmos
    }

    /// Object names drawn in the last completed frame, in draw order
    pub fn last_frame(&self) -> &[String] {
        &self.last_frame
    }
}

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self) -> BackendResult<()> {
        self.recording.clear();
        Ok(())
    }

    fn render(&mut self, object: &ObjectView) -> BackendResult<()> {
        self.objects += 1;
        self.recording.push(object.name.clone());
        Ok(())
    }

    fn render_gizmos(&mut self, _object: &ObjectView) -> BackendResult<()> {
        self.gizmos += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.frames += 1;
        self.last_frame = std::mem::take(&mut self.recording);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
