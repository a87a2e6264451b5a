//! # Torch Engine
//!
//! A scene-graph game engine core: GameObjects carrying Components and a
//! Transform hierarchy, a Scene with deferred add/remove, a fixed-timestep
//! main loop and a reference-counted asset registry.
//!
//! ## Features
//!
//! - **Scene graph**: parent/child transforms with cycle rejection
//! - **Component lifecycle**: start once, then update/render phases in frame-queue order
//! - **Deferred mutation**: objects added or removed mid-frame take effect at the next flush
//! - **Asset registry**: shared data released when the last consumer unlinks
//! - **Pluggable surfaces**: headless window and null renderer for tests, GLFW behind a feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use torch_engine::prelude::*;
//!
//! struct Spin;
//!
//! impl Component for Spin {
//!     fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
//!         let step = ctx.delta_time();
//!         if let Some(local) = ctx.local_transform_mut() {
//!             local.rotation *= Quat::from_euler_angles(0.0, step, 0.0);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let scenes = engine.scenes_mut();
//!         let id = scenes.create_scene("main");
//!         if let Some(scene) = scenes.get_mut(id) {
//!             let cube = scene.create_object("Cube")?;
//!             scene.add_component(cube, Spin)?;
//!         }
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::headless(ApplicationConfig::new("Quick Start"))?;
//!     engine.run(&mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod assets;
pub mod input;
pub mod render;
pub mod scene;

mod application;
mod engine;

#[cfg(test)]
mod tests;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError, StepReport};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, Application,
        Engine, EngineError, StepReport,
        foundation::{
            collections::{ComponentId, GameObjectId, SceneId, TransformId},
            math::{Mat4, Quat, Transform, Vec3},
            time::{Clock, FrameTime, ManualClock, Stopwatch, SystemClock, Timer},
        },
        scene::{
            Component, ComponentContext, ComponentError, ComponentResult, FieldDescriptor, FieldKind,
            FieldSet, FieldValue, ObjectView, Phase, Scene, SceneError, SceneManager, Services,
        },
        assets::{Asset, AssetError, AssetHandle, AssetRegistry, ConsumerId, FileImporter, Importer},
        render::{NullRenderer, RenderBackend},
        render::window::{HeadlessWindow, WindowEvent, WindowSurface},
        input::{InputState, KeyCode, Modifiers, MouseButton},
        core::config::{ApplicationConfig, AssetSettings, Config, EngineSettings, WindowSettings},
    };
}
