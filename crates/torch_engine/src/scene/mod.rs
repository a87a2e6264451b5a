//! Scene graph: game objects, components and the transform hierarchy
//!
//! ## Lifecycle
//!
//! ```text
//! create_object ──► pending Add ──flush──► live ──construct──► frame queue
//!                        │                   │                      │
//!                 remove_object       remove_object          start, update,
//!                 (cancel)            (pending Remove)       post_update, render
//!                                            │
//!                                         flush ──► destroy hooks, freed
//! ```
//!
//! Structural changes requested while a pass runs are deferred: new objects
//! wait for the next flush and new components for the next frame queue.

pub mod component;
pub mod fields;
mod game_object;
mod scene_graph;
mod scene_manager;
mod services;
pub mod transform;

use thiserror::Error;

use crate::foundation::collections::{ComponentId, GameObjectId, SceneId};

pub use component::{Component, ComponentContext, ComponentError, ComponentResult};
pub use fields::{FieldDescriptor, FieldError, FieldKind, FieldSet, FieldValue};
pub use game_object::{GameObject, ObjectView, PendingOp};
pub use scene_graph::{Phase, Scene};
pub use scene_manager::SceneManager;
pub use services::Services;
pub use transform::{TransformNode, TransformTree};

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// No game object with this handle
    #[error("Unknown game object: {0:?}")]
    UnknownObject(GameObjectId),

    /// The game object was destroyed
    #[error("Game object {0:?} is destroyed")]
    ObjectDestroyed(GameObjectId),

    /// No component with this handle
    #[error("Unknown component: {0:?}")]
    UnknownComponent(ComponentId),

    /// No transform with this handle
    #[error("Unknown transform")]
    UnknownTransform,

    /// No scene with this handle
    #[error("Unknown scene: {0:?}")]
    UnknownScene(SceneId),

    /// Parenting would create a cycle
    #[error("A transform cannot be parented to itself or to one of its descendants")]
    InvalidParent,

    /// Rejected object name
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// The component's hook is running and its data is borrowed
    #[error("Component {0:?} is busy")]
    ComponentBusy(ComponentId),

    /// The scene was destroyed and accepts no new objects
    #[error("Scene '{0}' is destroyed")]
    SceneDestroyed(String),

    /// Field access failed
    #[error("Field error: {0}")]
    Field(#[from] FieldError),
}

/// Check a game object name
///
/// Names must contain something other than whitespace and no control
/// characters.
pub fn validate_name(name: &str) -> Result<(), SceneError> {
    if name.trim().is_empty() || name.chars().any(char::is_control) {
        return Err(SceneError::InvalidName(name.to_string()));
    }
    Ok(())
}
