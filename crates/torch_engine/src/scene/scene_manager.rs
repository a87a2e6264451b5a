//! Owner of all scenes and of the "current scene" pointer

use crate::foundation::collections::{SceneId, SlotMap};
use crate::foundation::logging::SCENE_TARGET;
use crate::scene::{Scene, SceneError, Services};

/// Scene registry
///
/// Replaces a process-wide current-scene static: the engine owns one manager
/// and passes it where needed.
#[derive(Debug, Default)]
pub struct SceneManager {
    scenes: SlotMap<SceneId, Scene>,
    current: Option<SceneId>,
}

impl SceneManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scene; it becomes current when no scene is
    pub fn create_scene(&mut self, name: impl Into<String>) -> SceneId {
        let scene = Scene::new(name);
        log::info!(target: SCENE_TARGET, "Created scene '{}'", scene.name());
        let id = self.scenes.insert(scene);
        if self.current.is_none() {
            self.current = Some(id);
        }
        id
    }

    /// Make `id` the current scene
    pub fn set_current(&mut self, id: SceneId) -> Result<(), SceneError> {
        match self.scenes.get(id) {
            Some(scene) if !scene.is_destroyed() => {
                self.current = Some(id);
                Ok(())
            }
            _ => Err(SceneError::UnknownScene(id)),
        }
    }

    /// Handle of the current scene
    pub fn current_id(&self) -> Option<SceneId> {
        self.current
    }

    /// Current scene
    pub fn current(&self) -> Option<&Scene> {
        self.scenes.get(self.current?)
    }

    /// Mutable current scene
    pub fn current_mut(&mut self) -> Option<&mut Scene> {
        self.scenes.get_mut(self.current?)
    }

    /// Scene by handle
    pub fn get(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    /// Mutable scene by handle
    pub fn get_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    /// Number of scenes, including destroyed ones not yet processed
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether there are no scenes
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Iterate all scenes
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SceneId, &mut Scene)> {
        self.scenes.iter_mut()
    }

    /// Mark a scene destroyed
    ///
    /// Its pending queue is dropped now; live objects are torn down and the
    /// scene released on the next [`SceneManager::process_queues`].
    pub fn destroy_scene(&mut self, id: SceneId) -> Result<(), SceneError> {
        let scene = self.scenes.get_mut(id).ok_or(SceneError::UnknownScene(id))?;
        scene.mark_destroyed();
        Ok(())
    }

    /// Flush the pending queue of every scene and release destroyed scenes
    pub fn process_queues(&mut self, services: &Services) {
        let mut released = Vec::new();
        for (id, scene) in &mut self.scenes {
            scene.flush_pending(services);
            if scene.is_destroyed() {
                released.push(id);
            }
        }

        for id in released {
            if self.current == Some(id) {
                self.current = None;
            }
            if let Some(scene) = self.scenes.remove(id) {
                log::info!(target: SCENE_TARGET, "Released scene '{}'", scene.name());
            }
        }
    }

    /// Tear down every scene
    pub fn destroy_all(&mut self, services: &Services) {
        for (_, scene) in &mut self.scenes {
            scene.destroy_all(services);
        }
        self.scenes.clear();
        self.current = None;
    }
}
