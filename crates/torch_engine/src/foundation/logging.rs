//! Logging setup
//!
//! The engine logs through the `log` facade; each subsystem uses its own
//! target so output can be filtered with `RUST_LOG`.

pub use log::{debug, error, info, trace, warn};

use crate::engine::EngineError;

/// Log target for scene and object lifecycle messages
pub const SCENE_TARGET: &str = "torch::scene";

/// Log target for the asset registry
pub const ASSETS_TARGET: &str = "torch::assets";

/// Log target for the main loop
pub const ENGINE_TARGET: &str = "torch::engine";

/// Install `env_logger` with `default_level` unless `RUST_LOG` overrides it
///
/// Returns [`EngineError::AlreadyInitialized`] when a logger is already
/// installed for this process.
pub fn init(default_level: &str) -> Result<(), EngineError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init()
        .map_err(|_| EngineError::AlreadyInitialized("logger".to_string()))
}
