use std::io::Read;

use arbor_types::AssetId;

use crate::asset::Asset;
use crate::error::{StoreError, StoreResult};

/// Content-addressed object store with a reference table.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. `put` of an id already present is
///   a no-op; there is no update path.
/// - A reference may only be bound to an id already present in the content
///   table.
/// - Reference updates are last-writer-wins; there is no compare-and-swap.
/// - Misses return sentinels (`Asset::invalid()`, `AssetId::empty()`), not
///   errors. Only I/O and integrity failures are errors.
pub trait ObjectsStorage: Send + Sync {
    /// Copy an asset's content into the store, keyed by its id.
    ///
    /// Empty-sentinel ids and ids already present are skipped.
    fn put(&self, asset: &Asset) -> StoreResult<()>;

    /// Put assets in the given order, stopping at the first failure.
    ///
    /// Callers rely on the ordering: children first, then the tree object.
    fn put_all(&self, assets: &[Asset]) -> StoreResult<()> {
        assets.iter().try_for_each(|asset| self.put(asset))
    }

    /// Check whether an object exists in the store.
    fn contains(&self, id: &AssetId) -> bool;

    /// Look up an object. Returns `Asset::invalid()` on a miss.
    fn get(&self, id: &AssetId) -> Asset;

    /// Open the bytes of a stored object.
    fn open(&self, id: &AssetId) -> StoreResult<Box<dyn Read + Send>>;

    /// Resolve a reference name. Returns `AssetId::empty()` if unbound.
    fn resolve(&self, name: &str) -> StoreResult<AssetId>;

    /// Bind a new reference. Fails if `name` already resolves.
    fn create_reference(&self, name: &str, id: &AssetId) -> StoreResult<()> {
        if !self.resolve(name)?.is_empty() {
            return Err(StoreError::ReferenceAlreadyExists(name.to_string()));
        }
        self.update_reference(name, id)
    }

    /// Bind or rebind a reference. The target must already be stored.
    fn update_reference(&self, name: &str, id: &AssetId) -> StoreResult<()>;

    /// Remove a binding. Content is untouched. Returns `true` if it existed.
    fn destroy_reference(&self, name: &str) -> StoreResult<bool>;

    /// All `(name, id)` pairs. Order is unspecified.
    fn list_references(&self) -> StoreResult<Vec<(String, AssetId)>>;
}
