//! Game object record and the read-only view handed to renderers

use crate::foundation::collections::{ComponentId, GameObjectId, TransformId};
use crate::foundation::math::Mat4;

/// Operation waiting in a scene's pending queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    /// Becomes live on the next flush
    Add,
    /// Is destroyed on the next flush
    Remove,
}

/// A named container of components with exactly one transform
///
/// Game objects live inside a [`Scene`](super::Scene) arena and are addressed
/// by [`GameObjectId`]; this record is only reachable through the scene.
#[derive(Debug, Clone)]
pub struct GameObject {
    pub(crate) name: String,
    pub(crate) transform: TransformId,
    pub(crate) components: Vec<ComponentId>,
    pub(crate) frame_queue: Vec<ComponentId>,
    // Destroyed while live; freed at the next flush
    pub(crate) destroyed: bool,
}

impl GameObject {
    pub(crate) fn new(name: String, transform: TransformId) -> Self {
        Self {
            name,
            transform,
            components: Vec::new(),
            frame_queue: Vec::new(),
            destroyed: false,
        }
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform node owned by this object
    pub fn transform(&self) -> TransformId {
        self.transform
    }

    /// Attached components in attachment order
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    /// Whether the object was destroyed and waits to be freed
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Components eligible for callbacks this frame
    pub fn frame_queue(&self) -> &[ComponentId] {
        &self.frame_queue
    }
}

/// Snapshot of one object for a render backend
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectView {
    /// Object handle
    pub id: GameObjectId,
    /// Object name
    pub name: String,
    /// Local-to-world matrix
    pub world: Mat4,
    /// Names of the components in the frame queue
    pub components: Vec<String>,
}
