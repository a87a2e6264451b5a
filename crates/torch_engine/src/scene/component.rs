//! Component trait and the context handed to every lifecycle hook
//!
//! A component is a unit of behaviour attached to exactly one game object.
//! Hooks are plain trait methods with empty defaults, so a behaviour only
//! implements the phases it cares about.

use std::any::Any;

use thiserror::Error;

use crate::assets::{AssetError, ConsumerId};
use crate::foundation::collections::{ComponentId, GameObjectId, TransformId};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::scene::fields::{FieldDescriptor, FieldError, FieldValue};
use crate::scene::{Scene, SceneError, Services};

/// Result type of every fallible hook
pub type ComponentResult = Result<(), ComponentError>;

/// Failure reported by a component hook
#[derive(Error, Debug)]
pub enum ComponentError {
    /// Free-form failure raised by user code
    #[error("{0}")]
    Failed(String),

    /// The hook panicked; the payload message is kept when it was a string
    #[error("panicked: {0}")]
    Panicked(String),

    /// Asset access failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Scene operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Field access failed
    #[error("Field error: {0}")]
    Field(#[from] FieldError),
}

impl ComponentError {
    /// Shorthand for [`ComponentError::Failed`]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Access to `Any` for downcasting trait objects
pub trait AsAny: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour attached to a game object
///
/// Lifecycle per component: attached, then `start` exactly once on the first
/// frame its object's frame queue contains it, then the per-frame phases, and
/// finally `destroy` if it was ever live.
#[allow(unused_variables)]
pub trait Component: AsAny {
    /// Called once, before the first `update`
    fn start(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Fixed-step simulation update
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Runs after every live component finished `update`
    fn post_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Runs before the render phase of any object
    fn pre_render_object(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Runs right before the backend draws the owning object
    fn render_object(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Runs after every object was drawn
    fn post_render_object(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// The cursor entered (`true`) or left (`false`) the window
    fn on_cursor_enter(&mut self, ctx: &mut ComponentContext<'_>, entered: bool) -> ComponentResult {
        Ok(())
    }

    /// A character was typed
    fn on_char_pressed(&mut self, ctx: &mut ComponentContext<'_>, character: char) -> ComponentResult {
        Ok(())
    }

    /// Teardown; only called for components that were live
    fn destroy(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// Externally configurable fields
    fn fields(&self) -> Vec<FieldDescriptor> {
        Vec::new()
    }

    /// Read a field by name
    fn field(&self, name: &str) -> Option<FieldValue> {
        None
    }

    /// Write a field by name
    ///
    /// The scene validates the name and kind against [`Component::fields`]
    /// before calling this, so implementations only check value ranges.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        Err(FieldError::UnknownField(name.to_string()))
    }
}

/// Borrow a component trait object as its concrete type
pub fn downcast_ref<'a, T: Component>(component: &'a (dyn Component + 'static)) -> Option<&'a T> {
    <dyn Component as AsAny>::as_any(component).downcast_ref::<T>()
}

/// Mutably borrow a component trait object as its concrete type
pub fn downcast_mut<'a, T: Component>(component: &'a mut (dyn Component + 'static)) -> Option<&'a mut T> {
    <dyn Component as AsAny>::as_any_mut(component).downcast_mut::<T>()
}

/// Last path segment of a type name, without generic arguments
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Name given to a component: `"{object}/{type}"`
pub fn component_name(object_name: &str, type_name: &str) -> String {
    format!("{object_name}/{type_name}")
}

/// Everything a hook may touch
///
/// The scene is borrowed mutably, so hooks can spawn objects, attach or
/// remove components and edit transforms directly. Structural changes made
/// here never affect the pass that is currently running.
pub struct ComponentContext<'a> {
    /// Scene that owns the component
    pub scene: &'a mut Scene,
    /// Shared engine services
    pub services: &'a Services,
    object: GameObjectId,
    component: ComponentId,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        scene: &'a mut Scene,
        services: &'a Services,
        object: GameObjectId,
        component: ComponentId,
    ) -> Self {
        Self {
            scene,
            services,
            object,
            component,
        }
    }

    /// Owning game object
    pub fn object(&self) -> GameObjectId {
        self.object
    }

    /// This component's handle
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Consumer identity for asset links made by this component
    pub fn consumer(&self) -> ConsumerId {
        self.scene.consumer_of(self.component)
    }

    /// Transform node of the owning object
    pub fn transform_id(&self) -> Option<TransformId> {
        self.scene.transform_of(self.object)
    }

    /// Local transform of the owning object
    pub fn local_transform(&self) -> Option<&Transform> {
        let id = self.transform_id()?;
        self.scene.transforms().local(id)
    }

    /// Mutable local transform of the owning object
    pub fn local_transform_mut(&mut self) -> Option<&mut Transform> {
        let id = self.transform_id()?;
        self.scene.transforms_mut().local_mut(id)
    }

    /// World matrix of the owning object
    pub fn world_matrix(&self) -> Mat4 {
        self.scene.world_matrix(self.object)
    }

    /// World position of the owning object
    pub fn world_position(&self) -> Vec3 {
        self.transform_id()
            .map_or_else(Vec3::zeros, |id| self.scene.transforms().world_position(id))
    }

    /// Name of the owning object
    pub fn object_name(&self) -> &str {
        self.scene.object_name(self.object).unwrap_or_default()
    }

    /// Fixed step length in seconds
    pub fn delta_time(&self) -> f32 {
        self.services.time.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Spinner;
    impl Component for Spinner {}

    struct Generic<T>(T);
    impl<T: 'static> Component for Generic<T> {}

    #[test]
    fn test_short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name::<Spinner>(), "Spinner");
        assert_eq!(short_type_name::<Generic<u32>>(), "Generic");
    }

    #[test]
    fn test_component_name_format() {
        assert_eq!(component_name("Player", "Spinner"), "Player/Spinner");
    }

    #[test]
    fn test_downcast_through_trait_object() {
        let mut boxed: Box<dyn Component> = Box::new(Generic(7_u32));
        assert!(downcast_ref::<Spinner>(boxed.as_ref()).is_none());

        let inner = downcast_mut::<Generic<u32>>(boxed.as_mut()).unwrap();
        inner.0 += 1;
        assert_eq!(downcast_ref::<Generic<u32>>(boxed.as_ref()).unwrap().0, 8);
    }
}
