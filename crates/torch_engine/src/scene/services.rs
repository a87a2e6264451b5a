//! Shared services handed to component hooks

use crate::assets::AssetRegistry;
use crate::foundation::time::FrameTime;
use crate::input::InputState;

/// Engine-owned state every component can read
///
/// Passed explicitly into each hook instead of living in process-wide
/// statics.
#[derive(Debug, Clone, Default)]
pub struct Services {
    /// Shared asset registry
    pub assets: AssetRegistry,
    /// Input snapshot for the current update tick
    pub input: InputState,
    /// Simulation time
    pub time: FrameTime,
}

impl Services {
    /// Services around an existing registry
    pub fn new(assets: AssetRegistry) -> Self {
        Self {
            assets,
            input: InputState::default(),
            time: FrameTime::default(),
        }
    }
}
