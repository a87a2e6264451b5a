//! Reference-counted asset registry
//!
//! Maps a key (usually a file path) to shared data, a usage count and the
//! number of links each consumer holds. Every handle is one link. All bookkeeping sits behind one mutex:
//! the registry is cheap to clone and every clone sees the same entries.
//!
//! `load` keeps the lock while the importer runs, so concurrent loads of the
//! same missing key import it once. Importers must not call back into the
//! registry.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::assets::{Asset, AssetError, AssetHandle, ConsumerId, FileImporter, Importer};
use crate::foundation::logging::ASSETS_TARGET;

type SharedData = Arc<dyn Any + Send + Sync>;

struct Entry {
    data: SharedData,
    type_id: TypeId,
    type_name: &'static str,
    usage: usize,
    consumers: HashMap<ConsumerId, usize>,
    release: fn(&(dyn Any + Send + Sync)),
}

fn release_erased<T: Asset>(data: &(dyn Any + Send + Sync)) {
    if let Some(asset) = data.downcast_ref::<T>() {
        asset.release();
    }
}

#[derive(Default)]
pub(crate) struct RegistryState {
    entries: HashMap<String, Entry>,
    next_consumer: u64,
    files: FileImporter,
}

impl RegistryState {
    fn register<T: Asset>(&mut self, key: &str, data: T) {
        if self.entries.contains_key(key) {
            return;
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                data: Arc::new(data),
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                usage: 0,
                consumers: HashMap::new(),
                release: release_erased::<T>,
            },
        );
        log::debug!(target: ASSETS_TARGET, "Registered asset '{}' ({})", key, type_name::<T>());
    }

    fn link<T: Asset>(&mut self, key: &str, consumer: ConsumerId) -> Result<Arc<T>, AssetError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| AssetError::NotRegistered(key.to_string()))?;

        if entry.type_id != TypeId::of::<T>() {
            return Err(AssetError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
                found: entry.type_name,
            });
        }

        let data = Arc::clone(&entry.data)
            .downcast::<T>()
            .map_err(|_| AssetError::InvalidData(key.to_string()))?;

        *entry.consumers.entry(consumer).or_insert(0) += 1;
        entry.usage += 1;
        log::trace!(target: ASSETS_TARGET, "Linked {:?} to '{}' (usage {})", consumer, key, entry.usage);
        Ok(data)
    }

    pub(crate) fn unlink(&mut self, key: &str, consumer: ConsumerId) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(links) = entry.consumers.get_mut(&consumer) else {
            return false;
        };
        *links -= 1;
        if *links == 0 {
            entry.consumers.remove(&consumer);
        }

        entry.usage = entry.usage.saturating_sub(1);
        log::trace!(target: ASSETS_TARGET, "Unlinked {:?} from '{}' (usage {})", consumer, key, entry.usage);

        if entry.usage == 0 {
            if let Some(entry) = self.entries.remove(key) {
                (entry.release)(entry.data.as_ref());
                log::debug!(target: ASSETS_TARGET, "Released asset '{}'", key);
            }
        }
        true
    }
}

/// Shared, reference-counted asset store
#[derive(Clone, Default)]
pub struct AssetRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl AssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose [`AssetRegistry::load_file`] searches `importer`'s paths
    pub fn with_file_importer(importer: FileImporter) -> Self {
        let registry = Self::new();
        registry.lock().files = importer;
        registry
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle<T: Asset>(&self, data: Arc<T>, key: &str, consumer: ConsumerId) -> AssetHandle<T> {
        AssetHandle::new(data, key.to_string(), consumer, Arc::downgrade(&self.state))
    }

    /// Fresh consumer identity for owners that are not components
    pub fn new_consumer(&self) -> ConsumerId {
        let mut state = self.lock();
        state.next_consumer += 1;
        ConsumerId::Other(state.next_consumer)
    }

    /// Store `data` under `key` unless the key exists, then link `consumer`
    ///
    /// When the key is already registered `data` is dropped and the existing
    /// data is shared.
    pub fn register<T: Asset>(
        &self,
        key: &str,
        data: T,
        consumer: ConsumerId,
    ) -> Result<AssetHandle<T>, AssetError> {
        let shared = {
            let mut state = self.lock();
            state.register(key, data);
            state.link::<T>(key, consumer)?
        };
        Ok(self.handle(shared, key, consumer))
    }

    /// Share the data registered under `key`
    ///
    /// Every call adds one link, also for a consumer that is already linked;
    /// the returned handle owns that link.
    pub fn link<T: Asset>(&self, key: &str, consumer: ConsumerId) -> Result<AssetHandle<T>, AssetError> {
        let shared = self.lock().link::<T>(key, consumer)?;
        Ok(self.handle(shared, key, consumer))
    }

    /// Drop one of `consumer`'s links to `key`
    ///
    /// Releases the data when this was the last link. Returns `false`, and
    /// changes nothing, when the consumer was not linked.
    pub fn unlink(&self, key: &str, consumer: ConsumerId) -> bool {
        self.lock().unlink(key, consumer)
    }

    /// Link `key`, importing it first if nobody registered it
    ///
    /// A failed import leaves the registry untouched.
    pub fn load<T: Asset, I: Importer<T> + ?Sized>(
        &self,
        key: &str,
        consumer: ConsumerId,
        importer: &I,
    ) -> Result<AssetHandle<T>, AssetError> {
        let shared = {
            let mut state = self.lock();
            if !state.entries.contains_key(key) {
                let data = importer.import(key).map_err(|err| {
                    log::warn!(target: ASSETS_TARGET, "Failed to import '{}': {}", key, err);
                    err
                })?;
                state.register(key, data);
            }
            state.link::<T>(key, consumer)?
        };
        Ok(self.handle(shared, key, consumer))
    }

    /// [`AssetRegistry::load`] through the registry's own [`FileImporter`]
    pub fn load_file<T: Asset>(&self, key: &str, consumer: ConsumerId) -> Result<AssetHandle<T>, AssetError> {
        let files = self.lock().files.clone();
        self.load(key, consumer, &files)
    }

    /// Current usage count; zero for unknown keys
    pub fn usage_count(&self, key: &str) -> usize {
        self.lock().entries.get(key).map_or(0, |entry| entry.usage)
    }

    /// Whether data is registered under `key`
    pub fn is_loaded(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Consumers linked to `key`
    pub fn consumers(&self, key: &str) -> Vec<ConsumerId> {
        self.lock()
            .entries
            .get(key)
            .map(|entry| entry.consumers.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered keys, sorted
    pub fn loaded_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Release every entry regardless of its usage count
    ///
    /// Used at shutdown; entries still in use are reported as leaks.
    pub fn release_all(&self) {
        let entries: Vec<(String, Entry)> = self.lock().entries.drain().collect();
        for (key, entry) in entries {
            if entry.usage > 0 {
                log::warn!(target: ASSETS_TARGET, "Asset '{}' still has {} link(s) at shutdown", key, entry.usage);
            }
            (entry.release)(entry.data.as_ref());
        }
    }
}
