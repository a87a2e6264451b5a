//! Scene: object arena, live set and pending queue
//!
//! Objects and components are stored in slot maps and addressed by handle.
//! While a hook runs, its component is moved out of its slot so the hook can
//! receive `&mut Scene`; the slot is refilled when the hook returns.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::ConsumerId;

use crate::foundation::collections::{ComponentId, GameObjectId, SecondaryMap, SlotMap, TransformId};
use crate::foundation::logging::SCENE_TARGET;
use crate::foundation::math::{Mat4, Transform};
use crate::scene::component::{self, Component, ComponentContext, ComponentError, ComponentResult};
use crate::scene::fields::{self, FieldDescriptor, FieldSet, FieldValue};
use crate::scene::game_object::{GameObject, ObjectView, PendingOp};
use crate::scene::transform::TransformTree;
use crate::scene::{validate_name, SceneError, Services};

/// Per-frame phase dispatched across every live object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fixed-step simulation
    Update,
    /// After every update finished
    PostUpdate,
    /// Before any object is drawn
    PreRender,
    /// Per-object draw hooks
    Render,
    /// After every object was drawn
    PostRender,
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Start,
    Phase(Phase),
    CursorEnter(bool),
    Char(char),
}

impl Hook {
    fn call(self, behaviour: &mut dyn Component, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        match self {
            Self::Start => behaviour.start(ctx),
            Self::Phase(Phase::Update) => behaviour.update(ctx),
            Self::Phase(Phase::PostUpdate) => behaviour.post_update(ctx),
            Self::Phase(Phase::PreRender) => behaviour.pre_render_object(ctx),
            Self::Phase(Phase::Render) => behaviour.render_object(ctx),
            Self::Phase(Phase::PostRender) => behaviour.post_render_object(ctx),
            Self::CursorEnter(entered) => behaviour.on_cursor_enter(ctx, entered),
            Self::Char(character) => behaviour.on_char_pressed(ctx, character),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Phase(Phase::Update) => "update",
            Self::Phase(Phase::PostUpdate) => "post_update",
            Self::Phase(Phase::PreRender) => "pre_render_object",
            Self::Phase(Phase::Render) => "render_object",
            Self::Phase(Phase::PostRender) => "post_render_object",
            Self::CursorEnter(_) => "on_cursor_enter",
            Self::Char(_) => "on_char_pressed",
        }
    }
}

struct ComponentSlot {
    owner: GameObjectId,
    name: String,
    type_name: &'static str,
    started: bool,
    // Has been part of a constructed frame queue
    was_live: bool,
    // Removed while its own hook was running
    detached: bool,
    // Frame in which a hook failed
    faulted_frame: Option<u64>,
    // `None` while a hook of this component runs
    behaviour: Option<Box<dyn Component>>,
}

static NEXT_SCENE_SERIAL: AtomicU64 = AtomicU64::new(1);

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A set of game objects with deferred add/remove
pub struct Scene {
    name: String,
    serial: u64,
    objects: SlotMap<GameObjectId, GameObject>,
    components: SlotMap<ComponentId, ComponentSlot>,
    transforms: TransformTree,
    transform_owner: SecondaryMap<TransformId, GameObjectId>,
    // Ordered live set; `live_members` is the lookup side
    live: Vec<GameObjectId>,
    live_members: SecondaryMap<GameObjectId, ()>,
    pending: Vec<(GameObjectId, PendingOp)>,
    queued: SecondaryMap<GameObjectId, PendingOp>,
    destroyed: bool,
    frame: u64,
    tick: u64,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("objects", &self.objects.len())
            .field("components", &self.components.len())
            .field("live", &self.live)
            .field("pending", &self.pending)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial: NEXT_SCENE_SERIAL.fetch_add(1, Ordering::Relaxed),
            objects: SlotMap::with_key(),
            components: SlotMap::with_key(),
            transforms: TransformTree::new(),
            transform_owner: SecondaryMap::new(),
            live: Vec::new(),
            live_members: SecondaryMap::new(),
            pending: Vec::new(),
            queued: SecondaryMap::new(),
            destroyed: false,
            frame: 0,
            tick: 0,
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Process-unique number of this scene
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Asset consumer identity of `component`
    pub fn consumer_of(&self, component: ComponentId) -> ConsumerId {
        ConsumerId::Component {
            scene: self.serial,
            component,
        }
    }

    /// Whether [`SceneManager::destroy_scene`](super::SceneManager::destroy_scene) was called
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of update ticks started so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.pending.clear();
        self.queued.clear();
        self.destroyed = true;
        log::info!(target: SCENE_TARGET, "Scene '{}' marked for destruction", self.name);
    }

    // ---------------------------------------------------------------------
    // Objects and the pending queue
    // ---------------------------------------------------------------------

    /// Create an object at the origin and queue it for addition
    pub fn create_object(&mut self, name: &str) -> Result<GameObjectId, SceneError> {
        self.create_object_with(name, Transform::identity())
    }

    /// Create an object with a local transform and queue it for addition
    pub fn create_object_with(&mut self, name: &str, local: Transform) -> Result<GameObjectId, SceneError> {
        if self.destroyed {
            return Err(SceneError::SceneDestroyed(self.name.clone()));
        }
        if let Err(err) = validate_name(name) {
            log::warn!(target: SCENE_TARGET, "Rejected game object name {:?}", name);
            return Err(err);
        }

        let transform = self.transforms.insert(local);
        let id = self.objects.insert(GameObject::new(name.to_string(), transform));
        self.transform_owner.insert(transform, id);
        self.queue(id, PendingOp::Add);

        log::debug!(target: SCENE_TARGET, "Created game object '{}' ({:?})", name, id);
        Ok(id)
    }

    /// Create an object parented to `parent`
    pub fn create_child(&mut self, name: &str, parent: GameObjectId) -> Result<GameObjectId, SceneError> {
        if !self.objects.contains_key(parent) {
            return Err(SceneError::UnknownObject(parent));
        }
        let id = self.create_object(name)?;
        self.set_parent(id, Some(parent))?;
        Ok(id)
    }

    /// Queue an object for addition
    ///
    /// Cancels a pending removal; does nothing for objects that are already
    /// live or already waiting to be added. Destroyed objects are rejected.
    pub fn add_object(&mut self, id: GameObjectId) -> Result<(), SceneError> {
        let object = self.objects.get(id).ok_or(SceneError::UnknownObject(id))?;
        if object.destroyed {
            return Err(SceneError::ObjectDestroyed(id));
        }
        if self.destroyed {
            return Err(SceneError::SceneDestroyed(self.name.clone()));
        }

        match self.pending_op(id) {
            Some(PendingOp::Add) => {}
            Some(PendingOp::Remove) => {
                self.cancel_pending(id);
                log::debug!(target: SCENE_TARGET, "Cancelled removal of {:?}", id);
            }
            None if self.is_live(id) => {}
            None => self.queue(id, PendingOp::Add),
        }
        Ok(())
    }

    /// Queue an object for removal
    ///
    /// Cancels a pending addition, in which case the object never becomes
    /// live and stays in storage. A removed live object is destroyed at the
    /// next flush.
    pub fn remove_object(&mut self, id: GameObjectId) -> Result<(), SceneError> {
        if !self.objects.contains_key(id) {
            return Err(SceneError::UnknownObject(id));
        }

        match self.pending_op(id) {
            Some(PendingOp::Add) => {
                self.cancel_pending(id);
                log::debug!(target: SCENE_TARGET, "Cancelled addition of {:?}", id);
            }
            Some(PendingOp::Remove) => {}
            None if self.is_live(id) => self.queue(id, PendingOp::Remove),
            None => {}
        }
        Ok(())
    }

    /// Apply the pending queue
    ///
    /// Added objects join the live set and become eligible for the next frame
    /// queue construction. Removed objects receive their destroy notification
    /// and are freed. A destroyed scene additionally tears down every live
    /// object.
    pub fn flush_pending(&mut self, services: &Services) {
        let pending = std::mem::take(&mut self.pending);
        self.queued.clear();
        for (id, op) in pending {
            match op {
                PendingOp::Add => {
                    if self.objects.contains_key(id) && !self.is_live(id) {
                        self.live.push(id);
                        self.live_members.insert(id, ());
                        log::debug!(target: SCENE_TARGET, "Game object {:?} is live", id);
                    }
                }
                PendingOp::Remove => self.on_destroy(id, services),
            }
        }

        if self.destroyed && !self.live.is_empty() {
            for id in self.live.clone() {
                self.on_destroy(id, services);
            }
            self.live_members.clear();
        }
        self.compact_live();
    }

    /// Destroy an object and, first, all of its descendants
    ///
    /// Components are removed right away; live objects leave the live set at
    /// the next flush, objects that never became live are freed immediately.
    pub fn destroy_object(&mut self, id: GameObjectId, services: &Services) -> Result<(), SceneError> {
        let transform = self.objects.get(id).ok_or(SceneError::UnknownObject(id))?.transform;

        let children: Vec<GameObjectId> = self
            .transforms
            .children(transform)
            .iter()
            .filter_map(|child| self.transform_owner.get(*child).copied())
            .collect();
        for child in children {
            if self.objects.contains_key(child) {
                self.destroy_object(child, services)?;
            }
        }

        let components = self.components_of(id).to_vec();
        for component in components {
            if self.components.contains_key(component) {
                self.remove_component(component, services)?;
            }
        }

        if !self.objects.contains_key(id) {
            return Ok(());
        }
        if self.is_live(id) {
            self.objects[id].destroyed = true;
            self.remove_object(id)?;
        } else {
            self.free_object(id);
        }
        log::debug!(target: SCENE_TARGET, "Destroyed game object {:?}", id);
        Ok(())
    }

    /// Final teardown: every live object is destroyed, pending additions are dropped
    pub fn destroy_all(&mut self, services: &Services) {
        for (id, op) in std::mem::take(&mut self.pending) {
            if op == PendingOp::Add && !self.is_live(id) {
                self.free_object(id);
            }
        }
        self.queued.clear();
        for id in self.live.clone() {
            self.on_destroy(id, services);
        }
        self.live.clear();
        self.live_members.clear();
        self.pending.clear();
        self.queued.clear();
    }

    fn on_destroy(&mut self, id: GameObjectId, services: &Services) {
        if !self.objects.contains_key(id) {
            return;
        }
        self.live_members.remove(id);

        let components = self.components_of(id).to_vec();
        for component in components {
            if self.components.contains_key(component) {
                // The handle was just read from the owner's list, so removal cannot fail
                let _ = self.remove_component(component, services);
            }
        }
        self.free_object(id);
        log::debug!(target: SCENE_TARGET, "Game object {:?} removed from scene '{}'", id, self.name);
    }

    // Callers that free live objects run `compact_live` afterwards
    fn free_object(&mut self, id: GameObjectId) {
        self.live_members.remove(id);
        self.cancel_pending(id);

        let Some(object) = self.objects.remove(id) else {
            return;
        };
        for component in object.components {
            let running = self
                .components
                .get(component)
                .is_some_and(|slot| slot.behaviour.is_none());
            if running {
                if let Some(slot) = self.components.get_mut(component) {
                    slot.detached = true;
                }
            } else {
                self.components.remove(component);
            }
        }
        self.transform_owner.remove(object.transform);
        self.transforms.remove(object.transform);
    }

    fn queue(&mut self, id: GameObjectId, op: PendingOp) {
        self.pending.push((id, op));
        self.queued.insert(id, op);
    }

    fn cancel_pending(&mut self, id: GameObjectId) {
        if self.queued.remove(id).is_some() {
            self.pending.retain(|(pending, _)| *pending != id);
        }
    }

    // Drop objects that left `live_members` from the ordered live set
    fn compact_live(&mut self) {
        if self.live.len() != self.live_members.len() {
            let members = &self.live_members;
            self.live.retain(|id| members.contains_key(*id));
        }
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Attach a component; it starts with the owner's next frame queue
    pub fn add_component<C: Component>(
        &mut self,
        object: GameObjectId,
        behaviour: C,
    ) -> Result<ComponentId, SceneError> {
        let type_name = component::short_type_name::<C>();
        let name = {
            let owner = self.objects.get(object).ok_or(SceneError::UnknownObject(object))?;
            if owner.destroyed {
                return Err(SceneError::ObjectDestroyed(object));
            }
            component::component_name(&owner.name, type_name)
        };

        log::debug!(target: SCENE_TARGET, "Attached component '{}'", name);
        let id = self.components.insert(ComponentSlot {
            owner: object,
            name,
            type_name,
            started: false,
            was_live: false,
            detached: false,
            faulted_frame: None,
            behaviour: Some(Box::new(behaviour)),
        });
        self.objects[object].components.push(id);
        Ok(id)
    }

    /// Detach a component
    ///
    /// Its `destroy` hook fires if it was ever part of a frame queue. Called
    /// from inside the component's own hook, the component is destroyed once
    /// that hook returns.
    pub fn remove_component(&mut self, id: ComponentId, services: &Services) -> Result<(), SceneError> {
        let slot = self.components.get_mut(id).ok_or(SceneError::UnknownComponent(id))?;
        if slot.detached {
            return Ok(());
        }
        let owner = slot.owner;
        let running = slot.behaviour.is_none();
        if running {
            slot.detached = true;
        }

        if let Some(object) = self.objects.get_mut(owner) {
            object.components.retain(|component| *component != id);
            object.frame_queue.retain(|component| *component != id);
        }

        if !running {
            if let Some(slot) = self.components.remove(id) {
                self.retire(id, slot, services);
            }
        }
        Ok(())
    }

    fn retire(&mut self, id: ComponentId, slot: ComponentSlot, services: &Services) {
        let ComponentSlot {
            owner,
            name,
            was_live,
            behaviour,
            ..
        } = slot;

        if let (true, Some(mut behaviour)) = (was_live, behaviour) {
            let outcome = {
                let mut ctx = ComponentContext::new(self, services, owner, id);
                panic::catch_unwind(AssertUnwindSafe(|| behaviour.destroy(&mut ctx)))
            };
            if let Err(payload) = outcome {
                log::error!(
                    target: SCENE_TARGET,
                    "Component '{}' panicked in destroy: {}",
                    name,
                    panic_message(payload.as_ref())
                );
            }
        }
        log::debug!(target: SCENE_TARGET, "Removed component '{}'", name);
    }

    fn restore(&mut self, id: ComponentId, behaviour: Box<dyn Component>, services: &Services) {
        let Some(slot) = self.components.get_mut(id) else {
            return;
        };
        slot.behaviour = Some(behaviour);
        if slot.detached {
            if let Some(slot) = self.components.remove(id) {
                self.retire(id, slot, services);
            }
        }
    }

    fn invoke(&mut self, id: ComponentId, services: &Services, hook: Hook) {
        let frame = self.frame;
        let Some(slot) = self.components.get_mut(id) else {
            return;
        };
        if slot.detached || slot.faulted_frame == Some(frame) {
            return;
        }
        let Some(mut behaviour) = slot.behaviour.take() else {
            return;
        };
        let owner = slot.owner;

        let outcome = {
            let mut ctx = ComponentContext::new(self, services, owner, id);
            panic::catch_unwind(AssertUnwindSafe(|| hook.call(&mut *behaviour, &mut ctx)))
        };
        let result = outcome
            .unwrap_or_else(|payload| Err(ComponentError::Panicked(panic_message(payload.as_ref()))));

        if let Err(err) = result {
            if let Some(slot) = self.components.get_mut(id) {
                log::error!(
                    target: SCENE_TARGET,
                    "Component '{}' failed in {}: {}; skipped for the rest of this frame",
                    slot.name,
                    hook.name(),
                    err
                );
                slot.faulted_frame = Some(frame);
            }
        }
        self.restore(id, behaviour, services);
    }

    // ---------------------------------------------------------------------
    // Frame passes
    // ---------------------------------------------------------------------

    /// Open a new frame: snapshot every live object's components into its
    /// frame queue
    pub fn construct_frame_queues(&mut self) {
        self.frame += 1;
        for id in &self.live {
            if let Some(object) = self.objects.get_mut(*id) {
                object.frame_queue.clone_from(&object.components);
                for component in &object.frame_queue {
                    if let Some(slot) = self.components.get_mut(*component) {
                        slot.was_live = true;
                    }
                }
            }
        }
    }

    fn queued_components(&self) -> Vec<ComponentId> {
        self.live
            .iter()
            .filter_map(|id| self.objects.get(*id))
            .flat_map(|object| object.frame_queue.iter().copied())
            .collect()
    }

    /// Open a new update tick and start every queued component not yet started
    pub fn run_start_pass(&mut self, services: &Services) {
        self.tick += 1;
        for id in self.queued_components() {
            let needs_start = match self.components.get_mut(id) {
                Some(slot) if !slot.started && !slot.detached => {
                    slot.started = true;
                    true
                }
                _ => false,
            };
            if needs_start {
                self.invoke(id, services, Hook::Start);
            }
        }
    }

    /// Run one phase on every started component in the frame queues
    ///
    /// Objects are visited in live-set order and components in queue order;
    /// the phase completes for all objects before this returns.
    pub fn run_phase(&mut self, phase: Phase, services: &Services) {
        for id in self.queued_components() {
            if self.is_started(id) {
                self.invoke(id, services, Hook::Phase(phase));
            }
        }
    }

    /// Render phase: each object's `render_object` hooks, then `draw` for it
    pub fn render_objects(&mut self, services: &Services, mut draw: impl FnMut(&ObjectView)) {
        for object in self.live.clone() {
            let Some(queue) = self.objects.get(object).map(|o| o.frame_queue.clone()) else {
                continue;
            };
            for id in queue {
                if self.is_started(id) {
                    self.invoke(id, services, Hook::Phase(Phase::Render));
                }
            }
            if let Some(view) = self.view(object) {
                draw(&view);
            }
        }
    }

    /// Deliver a cursor enter/leave event to started components
    pub fn broadcast_cursor_enter(&mut self, entered: bool, services: &Services) {
        self.broadcast(Hook::CursorEnter(entered), services);
    }

    /// Deliver a typed character to started components
    pub fn broadcast_char(&mut self, character: char, services: &Services) {
        self.broadcast(Hook::Char(character), services);
    }

    fn broadcast(&mut self, hook: Hook, services: &Services) {
        let targets: Vec<ComponentId> = self
            .live
            .iter()
            .filter_map(|id| self.objects.get(*id))
            .flat_map(|object| object.components.iter().copied())
            .filter(|id| self.is_started(*id))
            .collect();
        for id in targets {
            self.invoke(id, services, hook);
        }
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    /// Transform arena
    pub fn transforms(&self) -> &TransformTree {
        &self.transforms
    }

    /// Mutable transform arena
    pub fn transforms_mut(&mut self) -> &mut TransformTree {
        &mut self.transforms
    }

    /// Transform node of an object
    pub fn transform_of(&self, id: GameObjectId) -> Option<TransformId> {
        self.objects.get(id).map(|object| object.transform)
    }

    /// Object owning a transform node
    pub fn object_of(&self, transform: TransformId) -> Option<GameObjectId> {
        self.transform_owner.get(transform).copied()
    }

    /// Local transform of an object
    pub fn local_transform(&self, id: GameObjectId) -> Option<&Transform> {
        self.transforms.local(self.transform_of(id)?)
    }

    /// Mutable local transform of an object
    pub fn local_transform_mut(&mut self, id: GameObjectId) -> Option<&mut Transform> {
        let transform = self.transform_of(id)?;
        self.transforms.local_mut(transform)
    }

    /// Parent `child` under `parent`, or detach it with `None`
    pub fn set_parent(&mut self, child: GameObjectId, parent: Option<GameObjectId>) -> Result<(), SceneError> {
        let child_transform = self.transform_of(child).ok_or(SceneError::UnknownObject(child))?;
        let parent_transform = match parent {
            Some(parent) => Some(self.transform_of(parent).ok_or(SceneError::UnknownObject(parent))?),
            None => None,
        };
        self.transforms.set_parent(child_transform, parent_transform)
    }

    /// Parent object
    pub fn parent_of(&self, id: GameObjectId) -> Option<GameObjectId> {
        let parent = self.transforms.parent(self.transform_of(id)?)?;
        self.object_of(parent)
    }

    /// Direct child objects
    pub fn children_of(&self, id: GameObjectId) -> Vec<GameObjectId> {
        self.transform_of(id)
            .map(|transform| {
                self.transforms
                    .children(transform)
                    .iter()
                    .filter_map(|child| self.object_of(*child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Topmost ancestor, or the object itself
    pub fn root_of(&self, id: GameObjectId) -> Option<GameObjectId> {
        let root = self.transforms.root(self.transform_of(id)?);
        self.object_of(root)
    }

    /// Local-to-world matrix; identity for unknown objects
    pub fn world_matrix(&self, id: GameObjectId) -> Mat4 {
        self.transform_of(id)
            .map_or_else(Mat4::identity, |transform| self.transforms.transformation(transform))
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Object record
    pub fn object(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Object name
    pub fn object_name(&self, id: GameObjectId) -> Option<&str> {
        self.objects.get(id).map(GameObject::name)
    }

    /// Rename an object; component names follow
    pub fn set_object_name(&mut self, id: GameObjectId, name: &str) -> Result<(), SceneError> {
        if let Err(err) = validate_name(name) {
            log::warn!(target: SCENE_TARGET, "Rejected game object name {:?}", name);
            return Err(err);
        }
        let object = self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))?;
        object.name = name.to_string();
        for component in &object.components {
            if let Some(slot) = self.components.get_mut(*component) {
                slot.name = component::component_name(name, slot.type_name);
            }
        }
        Ok(())
    }

    /// Number of stored objects, live or not
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether the object is in the live set
    pub fn is_live(&self, id: GameObjectId) -> bool {
        self.live_members.contains_key(id)
    }

    /// Whether an operation is queued for the object
    pub fn is_pending(&self, id: GameObjectId) -> bool {
        self.pending_op(id).is_some()
    }

    /// Operation queued for the object
    pub fn pending_op(&self, id: GameObjectId) -> Option<PendingOp> {
        self.queued.get(id).copied()
    }

    /// Queued operations in submission order
    pub fn pending_ops(&self) -> &[(GameObjectId, PendingOp)] {
        &self.pending
    }

    /// Live objects in the order they became live
    pub fn live_objects(&self) -> &[GameObjectId] {
        &self.live
    }

    /// First object with this name, preferring live ones
    pub fn find_by_name(&self, name: &str) -> Option<GameObjectId> {
        self.live
            .iter()
            .copied()
            .find(|id| self.object_name(*id) == Some(name))
            .or_else(|| {
                self.objects
                    .iter()
                    .find(|(_, object)| object.name == name)
                    .map(|(id, _)| id)
            })
    }

    /// Components attached to an object
    pub fn components_of(&self, id: GameObjectId) -> &[ComponentId] {
        self.objects
            .get(id)
            .map_or(&[], |object| object.components.as_slice())
    }

    /// First component of type `C` on an object
    pub fn find_component<C: Component>(&self, object: GameObjectId) -> Option<ComponentId> {
        self.components_of(object)
            .iter()
            .copied()
            .find(|id| self.component::<C>(*id).is_some())
    }

    /// Borrow a component as its concrete type
    ///
    /// Returns `None` while one of the component's own hooks is running.
    pub fn component<C: Component>(&self, id: ComponentId) -> Option<&C> {
        self.components
            .get(id)?
            .behaviour
            .as_deref()
            .and_then(|behaviour| component::downcast_ref::<C>(behaviour))
    }

    /// Mutably borrow a component as its concrete type
    pub fn component_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut C> {
        self.components
            .get_mut(id)?
            .behaviour
            .as_deref_mut()
            .and_then(|behaviour| component::downcast_mut::<C>(behaviour))
    }

    /// Component name, `"{object}/{type}"`
    pub fn component_name(&self, id: ComponentId) -> Option<&str> {
        self.components.get(id).map(|slot| slot.name.as_str())
    }

    /// Object the component is attached to
    pub fn component_owner(&self, id: ComponentId) -> Option<GameObjectId> {
        self.components.get(id).map(|slot| slot.owner)
    }

    /// Whether `start` has run for the component
    pub fn is_started(&self, id: ComponentId) -> bool {
        self.components.get(id).is_some_and(|slot| slot.started)
    }

    /// Whether the component was ever part of a frame queue
    pub fn was_live(&self, id: ComponentId) -> bool {
        self.components.get(id).is_some_and(|slot| slot.was_live)
    }

    /// Whether the component's hook failed during the current frame
    pub fn is_faulted(&self, id: ComponentId) -> bool {
        self.components
            .get(id)
            .is_some_and(|slot| slot.faulted_frame == Some(self.frame))
    }

    /// Render snapshot of an object
    pub fn view(&self, id: GameObjectId) -> Option<ObjectView> {
        let object = self.objects.get(id)?;
        Some(ObjectView {
            id,
            name: object.name.clone(),
            world: self.transforms.transformation(object.transform),
            components: object
                .frame_queue
                .iter()
                .filter_map(|component| self.components.get(*component))
                .map(|slot| slot.name.clone())
                .collect(),
        })
    }

    // ---------------------------------------------------------------------
    // Fields
    // ---------------------------------------------------------------------

    fn behaviour(&self, id: ComponentId) -> Result<&(dyn Component + 'static), SceneError> {
        let slot = self.components.get(id).ok_or(SceneError::UnknownComponent(id))?;
        match slot.behaviour.as_deref() {
            Some(behaviour) => Ok(behaviour),
            None => Err(SceneError::ComponentBusy(id)),
        }
    }

    fn behaviour_mut(&mut self, id: ComponentId) -> Result<&mut (dyn Component + 'static), SceneError> {
        let slot = self.components.get_mut(id).ok_or(SceneError::UnknownComponent(id))?;
        match slot.behaviour.as_deref_mut() {
            Some(behaviour) => Ok(behaviour),
            None => Err(SceneError::ComponentBusy(id)),
        }
    }

    /// Field declarations of a component
    pub fn component_fields(&self, id: ComponentId) -> Result<Vec<FieldDescriptor>, SceneError> {
        Ok(self.behaviour(id)?.fields())
    }

    /// Current value of a component field
    pub fn component_field(&self, id: ComponentId, name: &str) -> Result<Option<FieldValue>, SceneError> {
        Ok(self.behaviour(id)?.field(name))
    }

    /// All declared fields with their current values
    pub fn component_snapshot(&self, id: ComponentId) -> Result<FieldSet, SceneError> {
        Ok(fields::snapshot(self.behaviour(id)?))
    }

    /// Validate and write one component field
    pub fn set_component_field(
        &mut self,
        id: ComponentId,
        name: &str,
        value: FieldValue,
    ) -> Result<(), SceneError> {
        let behaviour = self.behaviour_mut(id)?;
        fields::set_checked(behaviour, name, value).map_err(|err| {
            log::warn!(target: SCENE_TARGET, "Rejected field '{}' on {:?}: {}", name, id, err);
            SceneError::from(err)
        })
    }

    /// Validate and write every field in `set`
    pub fn apply_fields(&mut self, id: ComponentId, set: &FieldSet) -> Result<(), SceneError> {
        let behaviour = self.behaviour_mut(id)?;
        fields::apply_fields(behaviour, set).map_err(|err| {
            log::warn!(target: SCENE_TARGET, "Rejected field set on {:?}: {}", id, err);
            SceneError::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::fields::{FieldError, FieldKind};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Probe {
        label: &'static str,
        journal: Journal,
    }

    impl Probe {
        fn new(label: &'static str, journal: &Journal) -> Self {
            Self {
                label,
                journal: Rc::clone(journal),
            }
        }

        fn record(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{}:{}", self.label, event));
        }
    }

    impl Component for Probe {
        fn start(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
            self.record("start");
            Ok(())
        }

        fn update(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
            self.record("update");
            Ok(())
        }

        fn post_update(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
            self.record("post_update");
            Ok(())
        }

        fn on_char_pressed(&mut self, _ctx: &mut ComponentContext<'_>, character: char) -> ComponentResult {
            self.record(&format!("char {character}"));
            Ok(())
        }

        fn destroy(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.record("destroy");
        }
    }

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow().clone()
    }

    fn run_frame(scene: &mut Scene, services: &Services) {
        scene.flush_pending(services);
        scene.construct_frame_queues();
        scene.run_start_pass(services);
        scene.run_phase(Phase::Update, services);
        scene.run_phase(Phase::PostUpdate, services);
    }

    fn live_object(scene: &mut Scene, services: &Services, name: &str) -> GameObjectId {
        let id = scene.create_object(name).unwrap();
        scene.flush_pending(services);
        id
    }

    #[test]
    fn test_repeated_add_queues_once() {
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Box").unwrap();

        scene.add_object(id).unwrap();
        scene.add_object(id).unwrap();

        assert_eq!(scene.pending_ops(), &[(id, PendingOp::Add)]);
    }

    #[test]
    fn test_add_then_remove_before_flush_is_noop() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Ghost").unwrap();
        scene.add_component(id, Probe::new("ghost", &log)).unwrap();

        scene.remove_object(id).unwrap();
        run_frame(&mut scene, &services);

        assert!(!scene.is_live(id));
        assert!(!scene.is_pending(id));
        assert!(entries(&log).is_empty());

        // A cancelled object can still be added later
        scene.add_object(id).unwrap();
        assert_eq!(scene.pending_op(id), Some(PendingOp::Add));
    }

    #[test]
    fn test_add_cancels_pending_remove() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Keeper").unwrap();
        scene.add_component(id, Probe::new("keeper", &log)).unwrap();
        run_frame(&mut scene, &services);

        scene.remove_object(id).unwrap();
        assert_eq!(scene.pending_op(id), Some(PendingOp::Remove));
        scene.remove_object(id).unwrap();
        assert_eq!(scene.pending_ops().len(), 1);

        scene.add_object(id).unwrap();
        assert!(!scene.is_pending(id));

        run_frame(&mut scene, &services);
        assert!(scene.is_live(id));
        assert!(!entries(&log).contains(&"keeper:destroy".to_string()));
    }

    #[test]
    fn test_remove_live_object_destroys_on_flush() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Doomed").unwrap();
        scene.add_component(id, Probe::new("doomed", &log)).unwrap();
        run_frame(&mut scene, &services);

        scene.remove_object(id).unwrap();
        assert!(scene.is_live(id));
        assert!(!entries(&log).contains(&"doomed:destroy".to_string()));

        scene.flush_pending(&services);
        assert!(!scene.is_live(id));
        assert!(scene.object(id).is_none());
        assert_eq!(entries(&log).last().map(String::as_str), Some("doomed:destroy"));
    }

    #[test]
    fn test_start_runs_once_before_update() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Player").unwrap();
        scene.add_component(id, Probe::new("p", &log)).unwrap();

        for _ in 0..3 {
            run_frame(&mut scene, &services);
        }

        assert_eq!(
            entries(&log),
            vec![
                "p:start", "p:update", "p:post_update",
                "p:update", "p:post_update",
                "p:update", "p:post_update",
            ]
        );
    }

    #[test]
    fn test_phases_are_global_barriers() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let a = scene.create_object("A").unwrap();
        let b = scene.create_object("B").unwrap();
        scene.add_component(a, Probe::new("a", &log)).unwrap();
        scene.add_component(b, Probe::new("b", &log)).unwrap();

        run_frame(&mut scene, &services);

        assert_eq!(
            entries(&log),
            vec!["a:start", "b:start", "a:update", "b:update", "a:post_update", "b:post_update"]
        );
    }

    struct Attacher {
        journal: Journal,
        attached: bool,
    }

    impl Component for Attacher {
        fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
            if !self.attached {
                self.attached = true;
                let object = ctx.object();
                ctx.scene.add_component(object, Probe::new("late", &self.journal))?;
                ctx.scene.create_object("Spawned")?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_component_attached_during_update_waits_for_next_frame() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Host").unwrap();
        scene
            .add_component(id, Attacher { journal: Rc::clone(&log), attached: false })
            .unwrap();

        run_frame(&mut scene, &services);
        assert!(entries(&log).is_empty());
        assert_eq!(scene.components_of(id).len(), 2);
        assert_eq!(scene.object(id).unwrap().frame_queue().len(), 1);

        let spawned = scene.find_by_name("Spawned").unwrap();
        assert_eq!(scene.pending_op(spawned), Some(PendingOp::Add));

        run_frame(&mut scene, &services);
        assert_eq!(entries(&log), vec!["late:start", "late:update", "late:post_update"]);
        assert!(scene.is_live(spawned));
    }

    #[test]
    fn test_destroy_hook_only_for_live_components() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Host").unwrap();
        let live = scene.add_component(id, Probe::new("live", &log)).unwrap();
        run_frame(&mut scene, &services);

        let fresh = scene.add_component(id, Probe::new("fresh", &log)).unwrap();
        scene.remove_component(fresh, &services).unwrap();
        scene.remove_component(live, &services).unwrap();

        let log = entries(&log);
        assert!(!log.contains(&"fresh:destroy".to_string()));
        assert_eq!(log.last().map(String::as_str), Some("live:destroy"));
        assert!(scene.components_of(id).is_empty());
        assert_eq!(
            scene.remove_component(live, &services),
            Err(SceneError::UnknownComponent(live))
        );
    }

    struct SelfRemover {
        journal: Journal,
    }

    impl Component for SelfRemover {
        fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
            let id = ctx.component();
            ctx.scene.remove_component(id, ctx.services)?;
            self.journal.borrow_mut().push("removed".to_string());
            Ok(())
        }

        fn post_update(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
            self.journal.borrow_mut().push("post_update".to_string());
            Ok(())
        }

        fn destroy(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.journal.borrow_mut().push("destroy".to_string());
        }
    }

    #[test]
    fn test_component_can_remove_itself() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Host").unwrap();
        let component = scene.add_component(id, SelfRemover { journal: Rc::clone(&log) }).unwrap();

        run_frame(&mut scene, &services);

        assert_eq!(entries(&log), vec!["removed", "destroy"]);
        assert!(scene.component_name(component).is_none());
        assert!(scene.object(id).unwrap().frame_queue().is_empty());
    }

    #[test]
    fn test_destroy_object_cascades_post_order() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let root = scene.create_object("Root").unwrap();
        let child = scene.create_child("Child", root).unwrap();
        let grandchild = scene.create_child("Grandchild", child).unwrap();
        scene.add_component(root, Probe::new("root", &log)).unwrap();
        scene.add_component(child, Probe::new("child", &log)).unwrap();
        scene.add_component(grandchild, Probe::new("grandchild", &log)).unwrap();
        run_frame(&mut scene, &services);
        log.borrow_mut().clear();

        scene.destroy_object(root, &services).unwrap();
        assert_eq!(entries(&log), vec!["grandchild:destroy", "child:destroy", "root:destroy"]);

        scene.flush_pending(&services);
        assert!(scene.live_objects().is_empty());
        assert_eq!(scene.object_count(), 0);
        assert!(scene.transforms().is_empty());
    }

    #[test]
    fn test_destroyed_live_object_cannot_be_re_added() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = live_object(&mut scene, &services, "Doomed");

        scene.destroy_object(id, &services).unwrap();
        assert!(scene.object(id).is_some_and(GameObject::is_destroyed));
        assert!(matches!(scene.add_object(id), Err(SceneError::ObjectDestroyed(_))));
        assert!(matches!(
            scene.add_component(id, Probe::new("late", &log)),
            Err(SceneError::ObjectDestroyed(_))
        ));
        assert_eq!(scene.pending_op(id), Some(PendingOp::Remove));

        scene.flush_pending(&services);
        assert!(!scene.is_live(id));
        assert!(scene.object(id).is_none());
    }

    #[test]
    fn test_live_order_survives_removals() {
        let services = Services::default();
        let mut scene = Scene::new("Test");
        let ids: Vec<GameObjectId> = ["A", "B", "C", "D"]
            .iter()
            .map(|name| scene.create_object(name).unwrap())
            .collect();
        scene.flush_pending(&services);

        scene.remove_object(ids[1]).unwrap();
        scene.remove_object(ids[2]).unwrap();
        scene.add_object(ids[2]).unwrap();
        assert_eq!(scene.pending_ops(), &[(ids[1], PendingOp::Remove)]);
        assert_eq!(scene.pending_op(ids[2]), None);

        let late = scene.create_object("E").unwrap();
        scene.flush_pending(&services);

        assert_eq!(scene.live_objects(), &[ids[0], ids[2], ids[3], late]);
        assert!(!scene.is_live(ids[1]));
        assert!(scene.is_live(late));
        assert!(scene.pending_ops().is_empty());
    }

    #[test]
    fn test_destroy_pending_object_frees_immediately() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Unborn").unwrap();
        scene.add_component(id, Probe::new("unborn", &log)).unwrap();

        scene.destroy_object(id, &services).unwrap();

        assert!(scene.object(id).is_none());
        assert!(!scene.is_pending(id));
        assert!(entries(&log).is_empty());
    }

    struct Flaky {
        journal: Journal,
        fail_on: u64,
        panic: bool,
        updates: u64,
    }

    impl Component for Flaky {
        fn update(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
            self.updates += 1;
            if self.updates == self.fail_on {
                if self.panic {
                    panic!("flaky update exploded");
                }
                return Err(ComponentError::failed("flaky update failed"));
            }
            Ok(())
        }

        fn post_update(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
            self.journal.borrow_mut().push(format!("flaky:post {}", self.updates));
            Ok(())
        }
    }

    fn assert_isolated(panic: bool) {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let flaky_object = scene.create_object("Flaky").unwrap();
        let steady_object = scene.create_object("Steady").unwrap();
        let flaky = scene
            .add_component(flaky_object, Flaky { journal: Rc::clone(&log), fail_on: 5, panic, updates: 0 })
            .unwrap();
        scene.add_component(steady_object, Probe::new("steady", &log)).unwrap();

        for frame in 1..=6 {
            run_frame(&mut scene, &services);
            assert_eq!(scene.is_faulted(flaky), frame == 5);
        }

        let log = entries(&log);
        assert_eq!(log.iter().filter(|e| e.as_str() == "steady:update").count(), 6);
        assert!(log.contains(&"flaky:post 4".to_string()));
        assert!(!log.contains(&"flaky:post 5".to_string()));
        assert!(log.contains(&"flaky:post 6".to_string()));
        assert!(scene.component::<Flaky>(flaky).is_some());
    }

    #[test]
    fn test_fault_spans_every_tick_of_the_frame() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Flaky").unwrap();
        let flaky = scene
            .add_component(id, Flaky { journal: Rc::clone(&log), fail_on: 1, panic: false, updates: 0 })
            .unwrap();

        // One frame queue, three catch-up ticks
        scene.flush_pending(&services);
        scene.construct_frame_queues();
        for _ in 0..3 {
            scene.run_start_pass(&services);
            scene.run_phase(Phase::Update, &services);
            scene.run_phase(Phase::PostUpdate, &services);
        }
        assert!(scene.is_faulted(flaky));
        assert_eq!(scene.component::<Flaky>(flaky).map(|flaky| flaky.updates), Some(1));
        assert!(entries(&log).is_empty());

        run_frame(&mut scene, &services);
        assert!(!scene.is_faulted(flaky));
        assert_eq!(entries(&log), vec!["flaky:post 2"]);
    }

    #[test]
    fn test_failing_component_skipped_for_rest_of_frame() {
        assert_isolated(false);
    }

    #[test]
    fn test_panicking_component_skipped_for_rest_of_frame() {
        assert_isolated(true);
    }

    #[test]
    fn test_destroyed_scene_notifies_live_objects() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Level");
        let a = scene.create_object("A").unwrap();
        scene.add_component(a, Probe::new("a", &log)).unwrap();
        run_frame(&mut scene, &services);
        let queued = scene.create_object("Queued").unwrap();

        scene.mark_destroyed();
        assert!(!scene.is_pending(queued));
        scene.flush_pending(&services);

        assert!(scene.live_objects().is_empty());
        assert_eq!(entries(&log).last().map(String::as_str), Some("a:destroy"));
        assert_eq!(
            scene.create_object("Late"),
            Err(SceneError::SceneDestroyed("Level".to_string()))
        );
    }

    #[test]
    fn test_component_names_follow_object_name() {
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Player").unwrap();
        let probe = scene.add_component(id, Probe::new("p", &log)).unwrap();
        assert_eq!(scene.component_name(probe), Some("Player/Probe"));

        scene.set_object_name(id, "Hero").unwrap();
        assert_eq!(scene.component_name(probe), Some("Hero/Probe"));

        assert!(matches!(scene.set_object_name(id, " "), Err(SceneError::InvalidName(_))));
        assert_eq!(scene.object_name(id), Some("Hero"));
        assert!(matches!(scene.create_object("\t"), Err(SceneError::InvalidName(_))));
    }

    #[test]
    fn test_hierarchy_queries() {
        let mut scene = Scene::new("Test");
        let root = scene
            .create_object_with("Root", Transform::from_position(crate::foundation::math::Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let arm = scene.create_child("Arm", root).unwrap();
        let hand = scene.create_child("Hand", arm).unwrap();

        assert_eq!(scene.parent_of(hand), Some(arm));
        assert_eq!(scene.children_of(root), vec![arm]);
        assert_eq!(scene.root_of(hand), Some(root));
        assert_eq!(scene.set_parent(root, Some(hand)), Err(SceneError::InvalidParent));
        assert_eq!(scene.parent_of(root), None);

        let world = scene.world_matrix(hand);
        assert_relative_eq!(world[(0, 3)], 1.0, epsilon = 1e-6);

        scene.set_parent(hand, None).unwrap();
        assert!(scene.children_of(arm).is_empty());
    }

    #[derive(Default)]
    struct Tunable {
        speed: f64,
    }

    impl Component for Tunable {
        fn fields(&self) -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::new("speed", FieldKind::Float)]
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            (name == "speed").then_some(FieldValue::Float(self.speed))
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
            self.speed = value
                .as_float()
                .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
            Ok(())
        }
    }

    #[test]
    fn test_component_field_access() {
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Car").unwrap();
        let tunable = scene.add_component(id, Tunable::default()).unwrap();

        scene.set_component_field(tunable, "speed", FieldValue::Float(4.0)).unwrap();
        assert_eq!(scene.component::<Tunable>(tunable).unwrap().speed, 4.0);
        assert_eq!(scene.component_field(tunable, "speed"), Ok(Some(FieldValue::Float(4.0))));

        let result = scene.set_component_field(tunable, "speed", FieldValue::Text("fast".into()));
        assert!(matches!(result, Err(SceneError::Field(FieldError::KindMismatch { .. }))));

        let set = FieldSet::from_ron(r#"{ "speed": Int(9) }"#).unwrap();
        scene.apply_fields(tunable, &set).unwrap();
        assert_eq!(scene.component_snapshot(tunable).unwrap().get("speed"), Some(&FieldValue::Float(9.0)));
        assert_eq!(scene.find_component::<Tunable>(id), Some(tunable));
    }

    #[test]
    fn test_char_broadcast_reaches_started_components_only() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let id = scene.create_object("Typist").unwrap();
        scene.add_component(id, Probe::new("started", &log)).unwrap();
        run_frame(&mut scene, &services);
        scene.add_component(id, Probe::new("fresh", &log)).unwrap();
        log.borrow_mut().clear();

        scene.broadcast_char('x', &services);

        assert_eq!(entries(&log), vec!["started:char x"]);
    }

    #[test]
    fn test_render_objects_draws_each_live_object() {
        let services = Services::default();
        let log = journal();
        let mut scene = Scene::new("Test");
        let a = scene.create_object("A").unwrap();
        scene.add_component(a, Probe::new("a", &log)).unwrap();
        live_object(&mut scene, &services, "B");
        run_frame(&mut scene, &services);

        let mut drawn = Vec::new();
        scene.render_objects(&services, |view| drawn.push((view.name.clone(), view.components.clone())));

        assert_eq!(
            drawn,
            vec![
                ("A".to_string(), vec!["A/Probe".to_string()]),
                ("B".to_string(), Vec::new()),
            ]
        );
    }
}
