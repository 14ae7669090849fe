use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, RwLock};

use arbor_types::{AssetId, DigestReader};
use tracing::trace;

use crate::asset::Asset;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectsStorage;

/// In-memory, HashMap-based objects storage.
///
/// Intended for tests and staging. Objects and references are held behind
/// `RwLock`s for safe concurrent access.
pub struct InMemoryObjectsStorage {
    objects: RwLock<HashMap<AssetId, Arc<[u8]>>>,
    references: RwLock<HashMap<String, AssetId>>,
}

impl InMemoryObjectsStorage {
    /// Create a new empty storage.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            references: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or_default()
    }

    /// Returns `true` if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, id: &AssetId) -> Option<Arc<[u8]>> {
        let map = self.objects.read().unwrap_or_else(|e| e.into_inner());
        map.get(id).cloned()
    }
}

impl Default for InMemoryObjectsStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectsStorage for InMemoryObjectsStorage {
    fn put(&self, asset: &Asset) -> StoreResult<()> {
        let id = asset.id()?;
        if id.is_empty() || self.contains(&id) {
            return Ok(());
        }

        let mut reader = DigestReader::new(asset.open()?);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let computed = reader.finish();
        if computed != id {
            return Err(StoreError::HashMismatch { id, computed });
        }

        let mut map = self
            .objects
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.entry(id.clone()).or_insert_with(|| data.into());
        trace!(%id, "stored object in memory");
        Ok(())
    }

    fn contains(&self, id: &AssetId) -> bool {
        !id.is_empty() && self.lookup(id).is_some()
    }

    fn get(&self, id: &AssetId) -> Asset {
        match self.lookup(id) {
            Some(data) => Asset::for_shared(data, id.clone()),
            None => Asset::invalid(),
        }
    }

    fn open(&self, id: &AssetId) -> StoreResult<Box<dyn Read + Send>> {
        let data = self
            .lookup(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn resolve(&self, name: &str) -> StoreResult<AssetId> {
        let refs = self
            .references
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(refs.get(name).cloned().unwrap_or_default())
    }

    fn update_reference(&self, name: &str, id: &AssetId) -> StoreResult<()> {
        crate::names::validate_reference_name(name)?;
        if !self.contains(id) {
            return Err(StoreError::DanglingReference {
                name: name.to_string(),
                id: id.clone(),
            });
        }
        let mut refs = self
            .references
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        refs.insert(name.to_string(), id.clone());
        Ok(())
    }

    fn destroy_reference(&self, name: &str) -> StoreResult<bool> {
        let mut refs = self
            .references
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(refs.remove(name).is_some())
    }

    fn list_references(&self) -> StoreResult<Vec<(String, AssetId)>> {
        let refs = self
            .references
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(refs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl std::fmt::Debug for InMemoryObjectsStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectsStorage")
            .field("object_count", &self.len())
            .finish()
    }
}
