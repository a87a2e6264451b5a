//! Core engine implementation
//!
//! [`Engine`] owns the scenes, the shared services and the platform
//! collaborators, and drives them with a fixed-timestep loop: any number of
//! update ticks per iteration (bounded by `max_catch_up_ticks`), at most one
//! rendered frame, and only after at least one tick.

use std::time::Duration;

use thiserror::Error;

use crate::application::Application;
use crate::assets::{AssetRegistry, FileImporter};
use crate::core::config::{ApplicationConfig, ConfigError};
use crate::foundation::logging::{self, ENGINE_TARGET};
use crate::foundation::time::{Clock, SystemClock, Timer};
use crate::input::{InputManager, InputState};
use crate::render::{NullRenderer, RenderBackend, RenderError};
use crate::render::window::{HeadlessWindow, WindowError, WindowEvent, WindowSurface};
use crate::scene::{Phase, SceneError, SceneManager, Services};

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// A process-wide facility was set up twice
    #[error("Already initialized: {0}")]
    AlreadyInitialized(String),

    /// Window error
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Rendering error
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),

    /// Rejected frame rate
    #[error("Invalid target frame rate: {0}")]
    InvalidFrameRate(f64),

    /// Scene error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// What one loop iteration did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Update ticks run
    pub ticks: u32,
    /// Whether a frame was rendered and presented
    pub rendered: bool,
}

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine {
    config: ApplicationConfig,
    scenes: SceneManager,
    services: Services,
    input: InputManager,
    window: Box<dyn WindowSurface>,
    renderer: Box<dyn RenderBackend>,
    clock: Box<dyn Clock>,
    timer: Timer,
    frame_time: f64,
    unprocessed: f64,
    last_time: f64,
    last_frame: f64,
    running: bool,
    shut_down: bool,
}

impl Engine {
    /// Create a new engine instance
    ///
    /// Logging is initialized from `config.engine.log_level`; a logger that is
    /// already installed is kept.
    pub fn new(
        config: ApplicationConfig,
        window: Box<dyn WindowSurface>,
        renderer: Box<dyn RenderBackend>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        if let Err(e) = logging::init(&config.engine.log_level) {
            log::debug!(target: ENGINE_TARGET, "{e}; keeping the existing logger");
        }
        log::info!(target: ENGINE_TARGET, "Initializing engine...");

        let assets = AssetRegistry::with_file_importer(FileImporter::new(&config.assets.search_paths));
        let now = clock.now();

        Ok(Self {
            frame_time: config.engine.frame_time(),
            config,
            scenes: SceneManager::new(),
            services: Services::new(assets),
            input: InputManager::new(),
            window,
            renderer,
            clock,
            timer: Timer::new(),
            unprocessed: 0.0,
            last_time: now,
            last_frame: now,
            running: true,
            shut_down: false,
        })
    }

    /// Engine with a headless window, a null renderer and the system clock
    pub fn headless(config: ApplicationConfig) -> Result<Self, EngineError> {
        let window = HeadlessWindow::from_settings(&config.window);
        Self::new(config, Box::new(window), Box::new(NullRenderer::new()), Box::new(SystemClock::new()))
    }

    /// Engine with a GLFW window and the system clock
    #[cfg(feature = "glfw")]
    pub fn with_glfw(config: ApplicationConfig, renderer: Box<dyn RenderBackend>) -> Result<Self, EngineError> {
        let window = crate::render::window::GlfwWindow::new(&config.window)
            .map_err(|e| EngineError::InitializationFailed(format!("Window: {e}")))?;
        Self::new(config, Box::new(window), renderer, Box::new(SystemClock::new()))
    }

    /// Run the engine main loop with the given application
    ///
    /// Returns once the window asks to close or [`Engine::stop`] is called.
    /// All scenes are torn down and assets released before returning.
    pub fn run<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::Application(format!("App initialization: {e}")))?;

        log::info!(target: ENGINE_TARGET, "Starting main loop...");
        self.running = true;
        self.unprocessed = 0.0;
        self.last_time = self.clock.now();
        self.last_frame = self.last_time;

        let mut result = Ok(());
        while self.running {
            if let Err(e) = self.iterate(app) {
                log::error!(target: ENGINE_TARGET, "Main loop aborted: {e}");
                result = Err(e);
                break;
            }
        }

        app.cleanup(self);
        self.shutdown();
        result
    }

    /// Run a single loop iteration without an application
    pub fn step(&mut self) -> Result<StepReport, EngineError> {
        self.iterate(&mut Idle)
    }

    fn iterate(&mut self, app: &mut dyn Application) -> Result<StepReport, EngineError> {
        let now = self.clock.now();
        self.unprocessed += (now - self.last_time).max(0.0);
        self.last_time = now;

        for event in self.window.poll_events() {
            self.dispatch_event(&event);
            app.handle_event(self, &event)
                .map_err(|e| EngineError::Application(format!("App event: {e}")))?;
        }

        self.scenes.process_queues(&self.services);
        if let Some(scene) = self.scenes.current_mut() {
            scene.construct_frame_queues();
        }

        let mut report = StepReport::default();
        let max_ticks = self.config.engine.max_catch_up_ticks;
        while self.unprocessed > self.frame_time && report.ticks < max_ticks {
            if self.window.is_close_requested() {
                self.running = false;
            }
            report.rendered = true;
            report.ticks += 1;
            self.unprocessed -= self.frame_time;
            self.update_cycle(app)?;
        }

        if self.unprocessed > self.frame_time {
            log::warn!(
                target: ENGINE_TARGET,
                "Running behind: dropping {:.3}s after {} ticks",
                self.unprocessed - self.frame_time,
                max_ticks
            );
            self.unprocessed = self.frame_time;
        }

        if report.rendered {
            self.render_cycle()?;
            self.timer.record(now - self.last_frame);
            self.last_frame = now;
        } else if self.config.engine.idle_sleep_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.engine.idle_sleep_ms));
        }

        Ok(report)
    }

    fn dispatch_event(&mut self, event: &WindowEvent) {
        self.input.handle_event(event);
        self.services.input = self.input.state().clone();

        match *event {
            WindowEvent::CursorEnter(entered) => {
                if let Some(scene) = self.scenes.current_mut() {
                    scene.broadcast_cursor_enter(entered, &self.services);
                }
            }
            WindowEvent::Char(character) => {
                if let Some(scene) = self.scenes.current_mut() {
                    scene.broadcast_char(character, &self.services);
                }
            }
            WindowEvent::Resized { width, height } => {
                log::debug!(target: ENGINE_TARGET, "Window resized to {width}x{height}");
            }
            WindowEvent::CloseRequested => {
                log::info!(target: ENGINE_TARGET, "Window close requested");
            }
            _ => {}
        }
    }

    fn update_cycle(&mut self, app: &mut dyn Application) -> Result<(), EngineError> {
        self.services.time.step(self.frame_time);
        self.services.input = self.input.state().clone();

        if let Some(scene) = self.scenes.current_mut() {
            scene.run_start_pass(&self.services);
            scene.run_phase(Phase::Update, &self.services);
            scene.run_phase(Phase::PostUpdate, &self.services);
        }

        let delta = self.services.time.delta;
        app.update(self, delta)
            .map_err(|e| EngineError::Application(format!("App update: {e}")))?;

        self.input.update();
        Ok(())
    }

    fn render_cycle(&mut self) -> Result<(), EngineError> {
        self.renderer.begin_frame()?;

        if let Some(scene) = self.scenes.current_mut() {
            scene.run_phase(Phase::PreRender, &self.services);

            let renderer = &mut self.renderer;
            let gizmos = self.config.engine.render_gizmos;
            let mut failure = None;
            scene.render_objects(&self.services, |view| {
                if failure.is_some() {
                    return;
                }
                let drawn = renderer.render(view).and_then(|()| {
                    if gizmos {
                        renderer.render_gizmos(view)
                    } else {
                        Ok(())
                    }
                });
                if let Err(e) = drawn {
                    failure = Some(e);
                }
            });
            if let Some(e) = failure {
                return Err(e.into());
            }

            scene.run_phase(Phase::PostRender, &self.services);
        }

        self.renderer.end_frame()?;
        self.window.present()?;
        Ok(())
    }

    /// Destroy every scene and release all assets
    ///
    /// Runs at most once; called by [`Engine::run`] on exit and on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.running = false;
        self.scenes.destroy_all(&self.services);
        self.services.assets.release_all();
        log::info!(
            target: ENGINE_TARGET,
            "Engine shutdown complete after {} frames ({:.1} fps average)",
            self.timer.frame_count(),
            self.timer.average_fps()
        );
    }

    /// Change the fixed update rate; takes effect on the next accumulator check
    pub fn set_target_frame_rate(&mut self, fps: f64) -> Result<(), EngineError> {
        if !(fps.is_finite() && fps > 0.0) {
            log::warn!(target: ENGINE_TARGET, "Ignoring invalid target frame rate {fps}");
            return Err(EngineError::InvalidFrameRate(fps));
        }
        self.config.engine.target_frame_rate = fps;
        self.frame_time = 1.0 / fps;
        Ok(())
    }

    /// Request engine shutdown
    pub fn stop(&mut self) {
        log::info!(target: ENGINE_TARGET, "Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds per update tick
    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    /// Active configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Scenes
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// Mutable access to the scenes
    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    /// Services shared with component hooks
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Shared asset registry
    pub fn assets(&self) -> &AssetRegistry {
        &self.services.assets
    }

    /// Current input state
    pub fn input(&self) -> &InputState {
        self.input.state()
    }

    /// Window surface
    pub fn window(&self) -> &dyn WindowSurface {
        self.window.as_ref()
    }

    /// Mutable window surface
    pub fn window_mut(&mut self) -> &mut dyn WindowSurface {
        self.window.as_mut()
    }

    /// Render backend
    pub fn renderer(&self) -> &dyn RenderBackend {
        self.renderer.as_ref()
    }

    /// Rendered frame statistics
    pub fn timer(&self) -> &Timer {
        &self.timer
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Application used by [`Engine::step`]
struct Idle;

impl Application for Idle {
    fn initialize(&mut self, _engine: &mut Engine) -> Result<(), crate::application::AppError> {
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), crate::application::AppError> {
        Ok(())
    }
}
