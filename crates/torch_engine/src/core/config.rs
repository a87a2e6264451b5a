//! # Application configuration
//!
//! One serializable tree covering the engine loop, the window and asset lookup.
//! Every section has defaults, so a config file only needs the keys it changes:
//!
//! ```toml
//! [engine]
//! target_frame_rate = 30.0
//!
//! [window]
//! title = "Demo"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Engine loop settings
///
/// Logging level and the fixed-timestep parameters of the main loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Log level for the engine
    pub log_level: String,
    /// Fixed update rate in ticks per second
    pub target_frame_rate: f64,
    /// Upper bound on update ticks run in one loop iteration
    pub max_catch_up_ticks: u32,
    /// Sleep when no tick is due, in milliseconds
    pub idle_sleep_ms: u64,
    /// Ask the render backend to draw gizmos
    pub render_gizmos: bool,
}

impl EngineSettings {
    /// Create engine settings with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            target_frame_rate: 60.0,
            max_catch_up_ticks: 10,
            idle_sleep_ms: 1,
            render_gizmos: cfg!(debug_assertions),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the fixed update rate
    pub fn with_target_frame_rate(mut self, fps: f64) -> Self {
        self.target_frame_rate = fps;
        self
    }

    /// Set the catch-up bound
    pub fn with_max_catch_up_ticks(mut self, ticks: u32) -> Self {
        self.max_catch_up_ticks = ticks;
        self
    }

    /// Set the idle sleep
    pub fn with_idle_sleep_ms(mut self, ms: u64) -> Self {
        self.idle_sleep_ms = ms;
        self
    }

    /// Enable gizmo rendering
    pub fn with_gizmos(mut self, enabled: bool) -> Self {
        self.render_gizmos = enabled;
        self
    }

    /// Seconds per update tick
    pub fn frame_time(&self) -> f64 {
        1.0 / self.target_frame_rate
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_frame_rate.is_finite() && self.target_frame_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "target_frame_rate must be positive, got {}",
                self.target_frame_rate
            )));
        }
        if self.max_catch_up_ticks == 0 {
            return Err(ConfigError::Invalid("max_catch_up_ticks must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Window title
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Synchronize presentation with the display
    pub vsync: bool,
    /// Allow the user to resize
    pub resizable: bool,
}

impl WindowSettings {
    /// Create window settings with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: 800,
            height: 600,
            vsync: true,
            resizable: true,
        }
    }

    /// Set window size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable vsync
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.vsync = enabled;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self::new("Torch")
    }
}

/// Asset lookup settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Directories searched by the file importer, in order
    pub search_paths: Vec<PathBuf>,
}

impl AssetSettings {
    /// Append a search path
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }
}

/// # Complete application configuration
///
/// Top-level configuration handed to [`Engine::new`](crate::engine::Engine::new).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Main loop configuration
    pub engine: EngineSettings,
    /// Window configuration
    pub window: WindowSettings,
    /// Asset lookup configuration
    pub assets: AssetSettings,
}

impl ApplicationConfig {
    /// Configuration with defaults and the given window title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            window: WindowSettings::new(title),
            ..Self::default()
        }
    }

    /// Replace engine settings
    pub fn with_engine(mut self, engine: EngineSettings) -> Self {
        self.engine = engine;
        self
    }

    /// Replace window settings
    pub fn with_window(mut self, window: WindowSettings) -> Self {
        self.window = window;
        self
    }

    /// Replace asset settings
    pub fn with_assets(mut self, assets: AssetSettings) -> Self {
        self.assets = assets;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.window.validate()
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.engine.log_level, "info");
        assert_relative_eq!(config.engine.target_frame_rate, 60.0);
        assert_eq!(config.engine.max_catch_up_ticks, 10);
        assert_eq!(config.window.title, "Torch");
        assert!(config.assets.search_paths.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = "[engine]\ntarget_frame_rate = 30.0\n\n[window]\ntitle = \"Demo\"\n";
        let config = ApplicationConfig::from_str_as(text, ConfigFormat::Toml).unwrap();

        assert_relative_eq!(config.engine.frame_time(), 1.0 / 30.0);
        assert_eq!(config.engine.idle_sleep_ms, 1);
        assert_eq!(config.window.title, "Demo");
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = ApplicationConfig::new("Ron")
            .with_engine(EngineSettings::new().with_target_frame_rate(120.0).with_gizmos(true))
            .with_assets(AssetSettings::default().with_search_path("resources"));

        let text = config.to_string_as(ConfigFormat::Ron).unwrap();
        let parsed = ApplicationConfig::from_str_as(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = ApplicationConfig::default().with_engine(EngineSettings::new().with_target_frame_rate(0.0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ApplicationConfig::default().with_engine(EngineSettings::new().with_max_catch_up_ticks(0));
        assert!(config.validate().is_err());

        let config = ApplicationConfig::default().with_window(WindowSettings::new("x").with_size(0, 10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("torch_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("app.toml");

        let config = ApplicationConfig::new("File").with_window(WindowSettings::new("File").with_size(320, 200));
        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);

        assert!(matches!(
            config.save_to_file(dir.join("app.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        std::fs::remove_dir_all(&dir).ok();
    }
}
