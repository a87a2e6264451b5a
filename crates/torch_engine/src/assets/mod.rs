//! Asset management system
//!
//! Assets are shared by key. Every consumer that links a key raises its usage
//! count; the data is released when the last consumer unlinks.
//!
//! ```ignore
//! let handle = services.assets.load("textures/crate.png", ctx.consumer(), &importer)?;
//! // ... handle derefs to the texture; dropping it unlinks the consumer
//! ```

mod handle;
mod importer;
mod resource_manager;

use std::any::type_name;

use thiserror::Error;

use crate::foundation::collections::ComponentId;

pub use handle::AssetHandle;
pub use importer::{FileImporter, Importer};
pub use resource_manager::AssetRegistry;

/// Asset trait for loadable resources
pub trait Asset: Send + Sync + 'static {
    /// Load asset from raw bytes
    fn from_bytes(_bytes: &[u8]) -> Result<Self, AssetError>
    where
        Self: Sized,
    {
        Err(AssetError::UnsupportedFormat(type_name::<Self>().to_string()))
    }

    /// Destroy routine, run once when the usage count drops to zero
    fn release(&self) {}
}

/// Raw file contents
impl Asset for Vec<u8> {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 text files
impl Asset for String {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| AssetError::InvalidData(e.to_string()))
    }
}

/// Identity of something holding asset links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerId {
    /// A component; component handles are only unique within their scene
    Component {
        /// Serial of the owning scene
        scene: u64,
        /// Component handle inside that scene
        component: ComponentId,
    },
    /// Any other owner, allocated by [`AssetRegistry::new_consumer`]
    Other(u64),
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The importer failed
    #[error("Failed to load asset '{key}': {reason}")]
    LoadFailed {
        /// Requested key
        key: String,
        /// Importer message
        reason: String,
    },

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// `link` on a key nobody registered
    #[error("Asset not registered: {0}")]
    NotRegistered(String),

    /// The key holds data of another type
    #[error("Asset '{key}' holds {found}, requested {expected}")]
    TypeMismatch {
        /// Requested key
        key: String,
        /// Requested type
        expected: &'static str,
        /// Stored type
        found: &'static str,
    },

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_assets_from_bytes() {
        assert_eq!(Vec::<u8>::from_bytes(b"abc").unwrap(), b"abc".to_vec());
        assert_eq!(String::from_bytes(b"hello").unwrap(), "hello");
        assert!(matches!(String::from_bytes(&[0xff, 0xfe]), Err(AssetError::InvalidData(_))));
    }

    #[test]
    fn test_component_consumer_identity_includes_scene() {
        let mut components = crate::foundation::collections::SlotMap::<ComponentId, ()>::with_key();
        let a = components.insert(());
        let b = components.insert(());

        let first = ConsumerId::Component { scene: 1, component: a };
        assert_eq!(first, ConsumerId::Component { scene: 1, component: a });
        assert_ne!(first, ConsumerId::Component { scene: 1, component: b });
        assert_ne!(first, ConsumerId::Component { scene: 2, component: a });
    }
}
