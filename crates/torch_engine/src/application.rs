//! Application trait and lifecycle management

use thiserror::Error;

use crate::assets::AssetError;
use crate::core::config::ConfigError;
use crate::engine::{Engine, EngineError};
use crate::render::window::WindowEvent;
use crate::scene::SceneError;

/// Application lifecycle trait
///
/// Implement this trait to create your game or application using the engine.
/// Most behaviour lives in components; the application sets up scenes and
/// reacts to engine-wide concerns.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once by [`Engine::run`] before the first loop iteration. Use
    /// this to create scenes, spawn objects and load assets.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called once per fixed update tick, after the scene's update and
    /// post-update phases.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Fixed step length in seconds
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Handle a window event
    ///
    /// Called for every polled event after the input state was updated.
    fn handle_event(&mut self, _engine: &mut Engine, _event: &WindowEvent) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called when the loop ends, before scenes are torn down.
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene manipulation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
