//! Asteroid field demo
//!
//! Runs the engine loop over a small scene: a spinning sun with an orbiting
//! planet and a spawner that keeps the field filled with drifting asteroids.
//! Headless by default (stops after a fixed number of frames); build with
//! `--features glfw` to open a window instead.
//!
//! Usage: `torch_demo [config.toml|config.ron]`

mod components;

use thiserror::Error;
use torch_engine::core::config::ConfigError;
use torch_engine::input::KeyCode;
use torch_engine::prelude::*;

use components::{Rotator, Spawner, ASTEROID_MESH};

/// Frames rendered by the headless run
#[cfg(not(feature = "glfw"))]
const HEADLESS_FRAMES: u64 = 300;

/// Overrides applied to the sun's rotator
const SUN_FIELDS: &str = r#"{ "speed": Float(0.5), "axis": Vec3((0.0, 1.0, 0.2)) }"#;

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Default)]
struct AsteroidField {
    ticks: u64,
}

impl Application for AsteroidField {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Building asteroid field...");
        let scenes = engine.scenes_mut();
        let id = scenes.create_scene("asteroid_field");
        let scene = scenes
            .get_mut(id)
            .ok_or_else(|| AppError::Custom("scene vanished".to_string()))?;

        let sun = scene.create_object("Sun")?;
        let rotator = scene.add_component(sun, Rotator::default())?;
        let overrides = FieldSet::from_ron(SUN_FIELDS).map_err(|e| AppError::Custom(e.to_string()))?;
        scene.apply_fields(rotator, &overrides)?;

        let planet = scene.create_child("Planet", sun)?;
        if let Some(local) = scene.local_transform_mut(planet) {
            local.position = Vec3::new(5.0, 0.0, 0.0);
        }
        scene.add_component(planet, Rotator { speed: 2.0, ..Rotator::default() })?;

        let spawner = scene.create_object("Spawner")?;
        scene.add_component(spawner, Spawner::new(0.25, 24, 7))?;

        log::info!("Scene '{}' ready with {} objects", scene.name(), scene.object_count());
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        self.ticks += 1;
        if self.ticks % 60 == 0 {
            if let Some(scene) = engine.scenes().current() {
                log::info!(
                    "tick {}: {} live objects, mesh shared by {}",
                    self.ticks,
                    scene.live_objects().len(),
                    engine.assets().usage_count(ASTEROID_MESH)
                );
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, engine: &mut Engine, event: &WindowEvent) -> Result<(), AppError> {
        if let WindowEvent::Key {
            key: KeyCode::Escape,
            pressed: true,
            ..
        } = event
        {
            engine.stop();
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!(
            "Ran {} ticks, {} frames at {:.1} fps",
            self.ticks,
            engine.timer().frame_count(),
            engine.timer().average_fps()
        );
    }
}

fn load_config() -> Result<ApplicationConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            ApplicationConfig::load_from_file(path)
        }
        None => Ok(ApplicationConfig::new("Torch - Asteroid Field")),
    }
}

#[cfg(not(feature = "glfw"))]
fn create_engine(config: ApplicationConfig) -> Result<Engine, EngineError> {
    let window = HeadlessWindow::from_settings(&config.window).with_close_after(HEADLESS_FRAMES);
    Engine::new(config, Box::new(window), Box::new(NullRenderer::new()), Box::new(SystemClock::new()))
}

#[cfg(feature = "glfw")]
fn create_engine(config: ApplicationConfig) -> Result<Engine, EngineError> {
    Engine::with_glfw(config, Box::new(NullRenderer::new()))
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let mut engine = create_engine(config)?;
    engine.run(&mut AsteroidField::default())?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
