//! Handle types for arena storage

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Handle to a game object inside a scene
    pub struct GameObjectId;

    /// Handle to a component slot inside a scene
    pub struct ComponentId;

    /// Handle to a node of a transform tree
    pub struct TransformId;

    /// Handle to a scene owned by the scene manager
    pub struct SceneId;
}
