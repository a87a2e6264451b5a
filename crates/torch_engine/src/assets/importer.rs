//! Importers produce asset data on a registry cache miss

use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::{Asset, AssetError};
use crate::foundation::logging::ASSETS_TARGET;

/// Produces the data for a key
pub trait Importer<T> {
    /// Import the asset stored under `key`
    fn import(&self, key: &str) -> Result<T, AssetError>;
}

impl<T, F> Importer<T> for F
where
    F: Fn(&str) -> Result<T, AssetError>,
{
    fn import(&self, key: &str) -> Result<T, AssetError> {
        self(key)
    }
}

/// Reads files from a list of search paths and parses them with [`Asset::from_bytes`]
#[derive(Debug, Clone, Default)]
pub struct FileImporter {
    search_paths: Vec<PathBuf>,
}

impl FileImporter {
    /// Importer over the given search paths, tried in order
    pub fn new<P: AsRef<Path>>(search_paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            search_paths: search_paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    /// Configured search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First existing file for `key`; the key itself is tried last
    pub fn resolve(&self, key: &str) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|root| root.join(key))
            .chain(std::iter::once(PathBuf::from(key)))
            .find(|candidate| candidate.is_file())
    }
}

impl<T: Asset> Importer<T> for FileImporter {
    fn import(&self, key: &str) -> Result<T, AssetError> {
        let path = self
            .resolve(key)
            .ok_or_else(|| AssetError::NotFound(key.to_string()))?;
        log::debug!(target: ASSETS_TARGET, "Reading '{}' from {}", key, path.display());

        let bytes = fs::read(&path)?;
        T::from_bytes(&bytes)
    }
}
