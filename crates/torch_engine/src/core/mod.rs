//! # Core Engine Module
//!
//! Shared configuration types used by the engine loop and its collaborators.

pub mod config;

pub use config::{ApplicationConfig, AssetSettings, Config, ConfigError, EngineSettings, WindowSettings};
