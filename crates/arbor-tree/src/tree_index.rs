use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, OnceLock};

use arbor_store::{Asset, AssetId, AssetRecord, ObjectsStorage};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::attributes::EntryAttributes;
use crate::error::{TreeError, TreeResult};

pub const MESSAGE: &str = "message";
pub const AUTHOR: &str = "author";
pub const EMAIL: &str = "email";
pub const COMMITER: &str = "commiter";
pub const COMMITER_EMAIL: &str = "commiter_email";
pub const INITIAL_FOR: &str = "initial_for";

/// One path of a tree: the content asset and its attributes.
#[derive(Clone, Debug)]
pub struct TreeEntry {
    pub id: AssetId,
    pub asset: Asset,
    pub attributes: BTreeMap<String, String>,
}

impl PartialEq for TreeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.attributes == other.attributes
    }
}

impl Eq for TreeEntry {}

/// On-disk form of a tree. Field order is the serialization order.
#[derive(Serialize, Deserialize)]
struct TreeRecord {
    parent: AssetRecord,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    content: BTreeMap<String, AssetRecord>,
    #[serde(default)]
    content_attributes: BTreeMap<String, BTreeMap<String, String>>,
}

/// A named, content-addressed snapshot of a path to content mapping.
///
/// Paths are `/`-separated and relative. Entries are kept path-sorted so
/// the serialization, and hence the tree id, is canonical. The serialized
/// self asset is cached and dropped on every mutation.
#[derive(Clone, Debug, Default)]
pub struct TreeIndex {
    parent: AssetId,
    attributes: BTreeMap<String, String>,
    entries: BTreeMap<String, TreeEntry>,
    serialized: OnceLock<Asset>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty tree marking the start of the history of `reference`.
    pub fn initial_for(reference: &str) -> Self {
        let mut tree = Self::new();
        tree.set_attribute(INITIAL_FOR, reference);
        tree
    }

    /// Returns `true` if the tree carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty() && self.attributes.is_empty() && self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn touch(&mut self) {
        self.serialized = OnceLock::new();
    }

    // -- content ---------------------------------------------------------

    /// Insert or replace the entry at `path`.
    ///
    /// The asset id is computed here, so a file-backed asset is read once
    /// unless its id is already known.
    pub fn put(
        &mut self,
        path: &str,
        asset: Asset,
        attributes: BTreeMap<String, String>,
    ) -> TreeResult<()> {
        validate_path(path)?;
        let id = asset.id()?;
        if id.is_empty() {
            return Err(TreeError::EmptyAsset(path.to_string()));
        }
        self.entries.insert(
            path.to_string(),
            TreeEntry {
                id,
                asset,
                attributes,
            },
        );
        self.touch();
        Ok(())
    }

    /// Insert or replace an entry that was taken from another tree.
    pub fn put_entry(&mut self, path: &str, entry: TreeEntry) -> TreeResult<()> {
        validate_path(path)?;
        if entry.id.is_empty() {
            return Err(TreeError::EmptyAsset(path.to_string()));
        }
        self.entries.insert(path.to_string(), entry);
        self.touch();
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Option<TreeEntry> {
        let removed = self.entries.remove(path);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &TreeEntry)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Typed predefined attributes of the entry at `path`.
    pub fn entry_attributes(&self, path: &str) -> TreeResult<EntryAttributes> {
        match self.entries.get(path) {
            Some(entry) => EntryAttributes::from_map(path, &entry.attributes),
            None => Ok(EntryAttributes::default()),
        }
    }

    pub fn set_entry_attributes(
        &mut self,
        path: &str,
        attributes: BTreeMap<String, String>,
    ) -> bool {
        match self.entries.get_mut(path) {
            Some(entry) => {
                entry.attributes = attributes;
                self.touch();
                true
            }
            None => false,
        }
    }

    // -- tree attributes -------------------------------------------------

    pub fn parent(&self) -> &AssetId {
        &self.parent
    }

    pub fn set_parent(&mut self, parent: AssetId) {
        self.parent = parent;
        self.touch();
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
        self.touch();
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let removed = self.attributes.remove(name);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn message(&self) -> Option<&str> {
        self.attribute(MESSAGE)
    }

    pub fn author(&self) -> Option<&str> {
        self.attribute(AUTHOR)
    }

    pub fn email(&self) -> Option<&str> {
        self.attribute(EMAIL)
    }

    pub fn commiter(&self) -> Option<&str> {
        self.attribute(COMMITER)
    }

    pub fn commiter_email(&self) -> Option<&str> {
        self.attribute(COMMITER_EMAIL)
    }

    /// The reference this tree was created for, if it is an initial tree.
    pub fn initial_reference(&self) -> Option<&str> {
        self.attribute(INITIAL_FOR)
    }

    pub fn is_initial(&self) -> bool {
        self.attributes.contains_key(INITIAL_FOR)
    }

    // -- identity and serialization --------------------------------------

    /// Canonical serialization: compact JSON, keys sorted.
    pub fn to_bytes(&self) -> TreeResult<Vec<u8>> {
        let record = TreeRecord {
            parent: AssetRecord {
                id: self.parent.clone(),
            },
            attributes: self.attributes.clone(),
            content: self
                .entries
                .iter()
                .map(|(path, entry)| (path.clone(), AssetRecord { id: entry.id.clone() }))
                .collect(),
            content_attributes: self
                .entries
                .iter()
                .filter(|(_, entry)| !entry.attributes.is_empty())
                .map(|(path, entry)| (path.clone(), entry.attributes.clone()))
                .collect(),
        };
        Ok(serde_json::to_vec(&record)?)
    }

    /// The tree's own serialized form as an asset.
    pub fn self_asset(&self) -> TreeResult<Asset> {
        if let Some(asset) = self.serialized.get() {
            return Ok(asset.clone());
        }
        let asset = Asset::for_bytes(self.to_bytes()?);
        asset.id()?;
        Ok(self.serialized.get_or_init(|| asset).clone())
    }

    /// The tree's identity: the id of its serialized form.
    pub fn id(&self) -> TreeResult<AssetId> {
        Ok(self.self_asset()?.id()?)
    }

    /// Every entry asset in path order, followed by the self asset.
    ///
    /// Storing them in this order before updating any reference means an
    /// interrupted commit leaves only unreferenced objects behind.
    pub fn all_assets(&self) -> TreeResult<Vec<Asset>> {
        let mut assets: Vec<Asset> = self.entries.values().map(|e| e.asset.clone()).collect();
        assets.push(self.self_asset()?);
        Ok(assets)
    }

    /// Parse a serialized tree. With a storage, entry assets read from it.
    pub fn load(
        id: &AssetId,
        reader: &mut dyn Read,
        storage: Option<&Arc<dyn ObjectsStorage>>,
    ) -> TreeResult<Self> {
        let malformed = |reason: String| TreeError::Malformed {
            id: id.clone(),
            reason,
        };

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let record: TreeRecord =
            serde_json::from_slice(&bytes).map_err(|e| malformed(e.to_string()))?;

        let mut content_attributes = record.content_attributes;
        let mut entries = BTreeMap::new();
        for (path, asset) in record.content {
            validate_path(&path).map_err(|e| malformed(e.to_string()))?;
            if asset.id.is_empty() {
                return Err(malformed(format!("empty id at {path}")));
            }
            let attributes = content_attributes.remove(&path).unwrap_or_default();
            entries.insert(
                path,
                TreeEntry {
                    id: asset.id.clone(),
                    asset: Asset::load(&asset, storage),
                    attributes,
                },
            );
        }
        for path in content_attributes.keys() {
            warn!(tree = %id, %path, "ignoring attributes for path not in content");
        }

        let tree = Self {
            parent: record.parent.id,
            attributes: record.attributes,
            entries,
            serialized: OnceLock::new(),
        };
        trace!(tree = %id, entries = tree.len(), "loaded tree");
        Ok(tree)
    }

    /// Load the tree object `id` from `storage`.
    pub fn from_id(storage: &Arc<dyn ObjectsStorage>, id: &AssetId) -> TreeResult<Self> {
        if !storage.contains(id) {
            return Err(TreeError::ObjectNotFound(id.clone()));
        }
        let mut reader = storage.open(id)?;
        Self::load(id, &mut reader, Some(storage))
    }

    /// Resolve `name` and load the tree it points at.
    pub fn from_ref(storage: &Arc<dyn ObjectsStorage>, name: &str) -> TreeResult<Self> {
        let id = storage.resolve(name)?;
        if id.is_empty() {
            return Err(TreeError::ReferenceNotFound(name.to_string()));
        }
        Self::from_id(storage, &id)
    }
}

impl PartialEq for TreeIndex {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent
            && self.attributes == other.attributes
            && self.entries == other.entries
    }
}

impl Eq for TreeIndex {}

/// Check that `path` is a normalized relative `/`-separated path.
pub fn validate_path(path: &str) -> TreeResult<()> {
    let invalid = |reason: &str| TreeError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(invalid("contains a backslash or NUL"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid("empty component")),
            "." | ".." => return Err(invalid("relative component")),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_store::InMemoryObjectsStorage;

    fn attrs() -> BTreeMap<String, String> {
        EntryAttributes::default().to_map()
    }

    fn sample() -> TreeIndex {
        let mut tree = TreeIndex::new();
        tree.put("b.txt", Asset::for_string("bee"), attrs()).unwrap();
        tree.put("a/x.txt", Asset::for_string("ex"), BTreeMap::new())
            .unwrap();
        tree.set_attribute(MESSAGE, "sample");
        tree
    }

    #[test]
    fn empty_tree_has_stable_serialization() {
        let tree = TreeIndex::new();
        let bytes = tree.to_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            r#"{"parent":{"id":""},"attributes":{},"content":{},"content_attributes":{}}"#
        );
        assert_eq!(tree.id().unwrap(), AssetId::for_bytes(&bytes));
    }

    #[test]
    fn serialization_is_sorted_and_compact() {
        let text = String::from_utf8(sample().to_bytes().unwrap()).unwrap();
        let a = text.find("a/x.txt").unwrap();
        let b = text.find("b.txt").unwrap();
        assert!(a < b);
        assert!(!text.contains('\n'));
        assert!(text.contains(r#""content_attributes":{"b.txt":{"amode":"0644","atype":"file"}}"#));
    }

    #[test]
    fn id_changes_after_mutation() {
        let mut tree = sample();
        let before = tree.id().unwrap();
        tree.put("c.txt", Asset::for_string("sea"), BTreeMap::new())
            .unwrap();
        let after = tree.id().unwrap();
        assert_ne!(before, after);

        tree.remove("c.txt");
        assert_eq!(tree.id().unwrap(), before);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut a = TreeIndex::new();
        a.put("1", Asset::for_string("one"), BTreeMap::new()).unwrap();
        a.put("2", Asset::for_string("two"), BTreeMap::new()).unwrap();
        let mut b = TreeIndex::new();
        b.put("2", Asset::for_string("two"), BTreeMap::new()).unwrap();
        b.put("1", Asset::for_string("one"), BTreeMap::new()).unwrap();
        assert_eq!(a.id().unwrap(), b.id().unwrap());
    }

    #[test]
    fn put_rejects_empty_asset_and_bad_paths() {
        let mut tree = TreeIndex::new();
        assert!(matches!(
            tree.put("x", Asset::invalid(), BTreeMap::new()),
            Err(TreeError::EmptyAsset(_))
        ));
        for path in ["", "/abs", "a//b", "../up", "a/./b"] {
            assert!(
                tree.put(path, Asset::for_string("x"), BTreeMap::new()).is_err(),
                "{path:?}"
            );
        }
    }

    #[test]
    fn all_assets_ends_with_self() {
        let tree = sample();
        let assets = tree.all_assets().unwrap();
        assert_eq!(assets.len(), 3);
        assert_eq!(assets[2].id().unwrap(), tree.id().unwrap());
    }

    #[test]
    fn stored_tree_loads_back_from_reference() {
        let storage: Arc<dyn ObjectsStorage> = Arc::new(InMemoryObjectsStorage::new());
        let mut tree = sample();
        tree.set_parent(AssetId::for_bytes(b"parent"));
        storage.put_all(&tree.all_assets().unwrap()).unwrap();
        let id = tree.id().unwrap();
        storage.create_reference("main", &id).unwrap();

        let loaded = TreeIndex::from_ref(&storage, "main").unwrap();
        assert_eq!(loaded, tree);
        assert_eq!(loaded.id().unwrap(), id);
        assert_eq!(loaded.message(), Some("sample"));
        assert_eq!(
            loaded.get("b.txt").unwrap().asset.read_to_vec().unwrap(),
            b"bee"
        );
    }

    #[test]
    fn from_ref_reports_missing_pieces() {
        let storage: Arc<dyn ObjectsStorage> = Arc::new(InMemoryObjectsStorage::new());
        assert!(matches!(
            TreeIndex::from_ref(&storage, "nope"),
            Err(TreeError::ReferenceNotFound(_))
        ));
        assert!(matches!(
            TreeIndex::from_id(&storage, &AssetId::for_bytes(b"gone")),
            Err(TreeError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn malformed_object_is_reported() {
        let storage: Arc<dyn ObjectsStorage> = Arc::new(InMemoryObjectsStorage::new());
        let junk = Asset::for_string("not a tree");
        storage.put(&junk).unwrap();
        let id = junk.id().unwrap();
        assert!(matches!(
            TreeIndex::from_id(&storage, &id),
            Err(TreeError::Malformed { .. })
        ));
    }

    #[test]
    fn non_digest_ids_in_stored_tree_are_malformed() {
        let storage: Arc<dyn ObjectsStorage> = Arc::new(InMemoryObjectsStorage::new());
        for text in [
            r#"{"parent":{"id":""},"content":{"a":{"id":"../../secret"}}}"#,
            r#"{"parent":{"id":"éééééééééé"},"content":{}}"#,
        ] {
            let object = Asset::for_string(text);
            storage.put(&object).unwrap();
            assert!(matches!(
                TreeIndex::from_id(&storage, &object.id().unwrap()),
                Err(TreeError::Malformed { .. })
            ));
        }
    }

    #[test]
    fn initial_tree_is_marked() {
        let tree = TreeIndex::initial_for("main");
        assert!(tree.is_initial());
        assert_eq!(tree.initial_reference(), Some("main"));
        assert!(!tree.is_empty());
        assert!(TreeIndex::new().is_empty());
    }
}
