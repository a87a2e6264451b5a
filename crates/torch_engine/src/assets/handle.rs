//! Consumer-side asset handle

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::assets::resource_manager::RegistryState;
use crate::assets::{Asset, ConsumerId};

/// One consumer's link to a shared asset
///
/// Dereferences to the asset. Dropping the handle, or calling
/// [`AssetHandle::destroy`], unlinks its consumer; unlinking happens at most
/// once per handle.
pub struct AssetHandle<T: Asset> {
    data: Arc<T>,
    key: String,
    consumer: ConsumerId,
    registry: Weak<Mutex<RegistryState>>,
}

impl<T: Asset> AssetHandle<T> {
    pub(crate) fn new(
        data: Arc<T>,
        key: String,
        consumer: ConsumerId,
        registry: Weak<Mutex<RegistryState>>,
    ) -> Self {
        Self {
            data,
            key,
            consumer,
            registry,
        }
    }

    /// Registry key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Consumer this link belongs to
    pub fn consumer(&self) -> ConsumerId {
        self.consumer
    }

    /// Shared data
    pub fn data(&self) -> &Arc<T> {
        &self.data
    }

    /// Unlink now instead of at drop
    pub fn destroy(self) {}

    fn unlink(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .unlink(&self.key, self.consumer);
        }
        self.registry = Weak::new();
    }
}

impl<T: Asset> Deref for AssetHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T: Asset> Drop for AssetHandle<T> {
    fn drop(&mut self) {
        self.unlink();
    }
}

impl<T: Asset> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("key", &self.key)
            .field("consumer", &self.consumer)
            .finish_non_exhaustive()
    }
}
