//! Engine-level tests driving the full main loop
//!
//! Time comes from a [`ManualClock`] (or a clock that moves on every read),
//! the window is headless and the renderer only counts, so every loop
//! iteration is reproducible.


use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::config::{ApplicationConfig, EngineSettings};
use crate::engine::Engine;
use crate::foundation::collections::{ComponentId, GameObjectId, SceneId};
use crate::foundation::time::{Clock, ManualClock};
use crate::render::window::HeadlessWindow;
use crate::render::NullRenderer;
use crate::scene::{Component, ComponentContext, ComponentResult, Scene};

pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn count(journal: &Journal, entry: &str) -> usize {
    journal.borrow().iter().filter(|e| e.as_str() == entry).count()
}

/// Records every hook it receives as `label:hook`
pub(crate) struct Probe {
    label: String,
    journal: Journal,
}

impl Probe {
    pub(crate) fn new(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
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

    fn pre_render_object(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.record("pre_render");
        Ok(())
    }

    fn render_object(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.record("render");
        Ok(())
    }

    fn post_render_object(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.record("post_render");
        Ok(())
    }

    fn on_cursor_enter(&mut self, _ctx: &mut ComponentContext<'_>, entered: bool) -> ComponentResult {
        self.record(&format!("cursor {entered}"));
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

/// Clock that moves forward by a fixed step every time it is read
pub(crate) struct SteppingClock {
    now: Cell<f64>,
    step: f64,
}

impl SteppingClock {
    pub(crate) fn new(step: f64) -> Self {
        Self { now: Cell::new(0.0), step }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> f64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Loop settings used by most tests: 4 ticks per second, no idle sleep
pub(crate) fn settings() -> EngineSettings {
    EngineSettings::new()
        .with_target_frame_rate(4.0)
        .with_idle_sleep_ms(0)
        .with_gizmos(false)
}

pub(crate) fn engine_with(clock: Box<dyn Clock>, window: HeadlessWindow, settings: EngineSettings) -> Engine {
    let config = ApplicationConfig::new("Test").with_engine(settings);
    Engine::new(config, Box::new(window), Box::new(NullRenderer::new()), clock).unwrap()
}

pub(crate) fn manual_engine(clock: &ManualClock) -> Engine {
    engine_with(Box::new(clock.clone()), HeadlessWindow::new("Test", 64, 64), settings())
}

pub(crate) fn renderer(engine: &Engine) -> &NullRenderer {
    engine.renderer().as_any().downcast_ref::<NullRenderer>().unwrap()
}

pub(crate) fn window(engine: &Engine) -> &HeadlessWindow {
    engine.window().as_any().downcast_ref::<HeadlessWindow>().unwrap()
}

pub(crate) fn window_mut(engine: &mut Engine) -> &mut HeadlessWindow {
    engine.window_mut().as_any_mut().downcast_mut::<HeadlessWindow>().unwrap()
}

pub(crate) fn current_scene(engine: &mut Engine) -> &mut Scene {
    engine.scenes_mut().current_mut().unwrap()
}

/// Create a scene holding one object with a [`Probe`]
pub(crate) fn spawn_probe(engine: &mut Engine, label: &str, journal: &Journal) -> (SceneId, GameObjectId, ComponentId) {
    let scenes = engine.scenes_mut();
    let scene_id = match scenes.current_id() {
        Some(id) => id,
        None => scenes.create_scene("main"),
    };
    let scene = scenes.get_mut(scene_id).unwrap();
    let object = scene.create_object(label).unwrap();
    let component = scene.add_component(object, Probe::new(label, journal)).unwrap();
    (scene_id, object, component)
}
