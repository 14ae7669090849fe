use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use arbor_types::{AssetId, DigestReader};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::asset::Asset;
use crate::error::{StoreError, StoreResult};
use crate::names::validate_reference_name;
use crate::properties::Properties;
use crate::traits::ObjectsStorage;

const OBJECTS_DIR: &str = "objects";
const REFERENCES_FILE: &str = "references";

/// Directory-backed objects storage.
///
/// Layout under the root:
///
/// ```text
/// objects/<hex id>   one raw content file per object
/// references         name=<hex id> property file
/// ```
///
/// Every file is written to a temporary file in its target directory and
/// renamed into place, so readers never observe a partial object or a
/// truncated reference table. The reference table is re-read on every call;
/// there is no in-process cache to go stale.
#[derive(Debug, Clone)]
pub struct LocalDirectoryStorage {
    root: PathBuf,
}

impl LocalDirectoryStorage {
    /// Open a storage rooted at `root`, creating the layout if missing.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(OBJECTS_DIR))?;
        debug!(root = %root.display(), "opened local storage");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the object file. `None` unless `id` is a hex digest, so no
    /// id can name a file outside `objects/`.
    fn object_path(&self, id: &AssetId) -> Option<PathBuf> {
        id.is_digest()
            .then(|| self.root.join(OBJECTS_DIR).join(id.as_str()))
    }

    /// Read the reference table. Every bound id must be a hex digest.
    fn read_references(&self) -> StoreResult<Properties> {
        match fs::read_to_string(self.root.join(REFERENCES_FILE)) {
            Ok(text) => Properties::parse_with(&text, |_, value| {
                AssetId::parse(value).map(drop).map_err(|e| e.to_string())
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Properties::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_references(&self, refs: &Properties) -> StoreResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(refs.render().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.root.join(REFERENCES_FILE))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl ObjectsStorage for LocalDirectoryStorage {
    fn put(&self, asset: &Asset) -> StoreResult<()> {
        let id = asset.id()?;
        if id.is_empty() || self.contains(&id) {
            return Ok(());
        }

        let mut reader = DigestReader::new(asset.open()?);
        let mut tmp = NamedTempFile::new_in(self.root.join(OBJECTS_DIR))?;
        io::copy(&mut reader, &mut tmp)?;
        let computed = reader.finish();
        let path = match self.object_path(&id) {
            Some(path) if computed == id => path,
            _ => return Err(StoreError::HashMismatch { id, computed }),
        };
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        trace!(%id, "stored object");
        Ok(())
    }

    fn contains(&self, id: &AssetId) -> bool {
        self.object_path(id).is_some_and(|path| path.is_file())
    }

    fn get(&self, id: &AssetId) -> Asset {
        match self.object_path(id) {
            Some(path) if path.is_file() => Asset::for_file_with_id(path, id.clone()),
            _ => Asset::invalid(),
        }
    }

    fn open(&self, id: &AssetId) -> StoreResult<Box<dyn Read + Send>> {
        if id.is_empty() {
            return Err(StoreError::EmptyAssetId);
        }
        let path = self
            .object_path(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        match File::open(path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, name: &str) -> StoreResult<AssetId> {
        let refs = self.read_references()?;
        // Values were checked by `read_references`.
        Ok(refs.get(name).map(AssetId::create).unwrap_or_default())
    }

    fn update_reference(&self, name: &str, id: &AssetId) -> StoreResult<()> {
        validate_reference_name(name)?;
        if !self.contains(id) {
            return Err(StoreError::DanglingReference {
                name: name.to_string(),
                id: id.clone(),
            });
        }
        let mut refs = self.read_references()?;
        refs.set(name, id.as_str());
        self.write_references(&refs)?;
        debug!(reference = name, %id, "updated reference");
        Ok(())
    }

    fn destroy_reference(&self, name: &str) -> StoreResult<bool> {
        let mut refs = self.read_references()?;
        if refs.remove(name).is_none() {
            return Ok(false);
        }
        self.write_references(&refs)?;
        debug!(reference = name, "destroyed reference");
        Ok(true)
    }

    fn list_references(&self) -> StoreResult<Vec<(String, AssetId)>> {
        let refs = self.read_references()?;
        Ok(refs
            .iter()
            .map(|(name, id)| (name.to_string(), AssetId::create(id)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, LocalDirectoryStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDirectoryStorage::open(dir.path().join("storage")).unwrap();
        (dir, storage)
    }

    #[test]
    fn put_writes_object_file_named_by_id() {
        let (_dir, storage) = storage();
        let asset = Asset::for_string("hello");
        storage.put(&asset).unwrap();

        let id = asset.id().unwrap();
        let path = storage.root().join("objects").join(id.as_str());
        assert_eq!(fs::read(path).unwrap(), b"hello");
        assert_eq!(storage.get(&id).read_to_vec().unwrap(), b"hello");
    }

    #[test]
    fn put_is_idempotent_and_leaves_no_temp_files() {
        let (_dir, storage) = storage();
        storage.put(&Asset::for_string("x")).unwrap();
        storage.put(&Asset::for_string("x")).unwrap();
        let count = fs::read_dir(storage.root().join("objects")).unwrap().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn put_rejects_hash_mismatch() {
        let (dir, storage) = storage();
        let path = dir.path().join("input");
        fs::write(&path, b"real bytes").unwrap();
        let claimed = AssetId::for_bytes(b"other bytes");
        let asset = Asset::for_file_with_id(&path, claimed.clone());

        assert!(matches!(
            storage.put(&asset),
            Err(StoreError::HashMismatch { .. })
        ));
        assert!(!storage.contains(&claimed));
    }

    #[test]
    fn open_missing_object_is_not_found() {
        let (_dir, storage) = storage();
        let id = AssetId::for_bytes(b"absent");
        assert!(matches!(storage.open(&id), Err(StoreError::NotFound(_))));
        assert!(!storage.get(&id).is_valid());
    }

    #[test]
    fn references_persist_as_property_file() {
        let (_dir, storage) = storage();
        let asset = Asset::for_string("tree");
        storage.put(&asset).unwrap();
        let id = asset.id().unwrap();

        storage.create_reference("main", &id).unwrap();
        storage.create_reference("dev", &id).unwrap();

        let text = fs::read_to_string(storage.root().join("references")).unwrap();
        assert_eq!(text, format!("dev={id}\nmain={id}\n"));

        let reopened = LocalDirectoryStorage::open(storage.root()).unwrap();
        assert_eq!(reopened.resolve("main").unwrap(), id);
        let mut refs = reopened.list_references().unwrap();
        refs.sort();
        assert_eq!(refs, vec![("dev".into(), id.clone()), ("main".into(), id)]);
    }

    #[test]
    fn references_tolerate_hand_edited_file() {
        let (_dir, storage) = storage();
        let asset = Asset::for_string("tree");
        storage.put(&asset).unwrap();
        let id = asset.id().unwrap();
        fs::write(
            storage.root().join("references"),
            format!("# edited by hand\n\n  main = {id}  \n"),
        )
        .unwrap();
        assert_eq!(storage.resolve("main").unwrap(), id);
    }

    #[test]
    fn reference_to_non_digest_is_malformed() {
        let (dir, storage) = storage();
        fs::write(dir.path().join("secret"), "outside").unwrap();
        fs::write(storage.root().join("references"), "main=../secret\n").unwrap();

        assert!(matches!(
            storage.resolve("main"),
            Err(StoreError::MalformedReferences { line: 1, .. })
        ));
        assert!(matches!(
            storage.list_references(),
            Err(StoreError::MalformedReferences { .. })
        ));
    }

    #[test]
    fn non_digest_ids_never_leave_objects_dir() {
        let (dir, storage) = storage();
        fs::write(dir.path().join("secret"), "outside").unwrap();
        let escape = AssetId::create("../../secret");

        assert!(!storage.contains(&escape));
        assert!(!storage.get(&escape).is_valid());
        assert!(matches!(storage.open(&escape), Err(StoreError::NotFound(_))));

        let asset = Asset::for_file_with_id(dir.path().join("secret"), escape);
        assert!(matches!(
            storage.put(&asset),
            Err(StoreError::HashMismatch { .. })
        ));
    }

    #[test]
    fn update_reference_is_last_writer_wins() {
        let (_dir, storage) = storage();
        let a = Asset::for_string("a");
        let b = Asset::for_string("b");
        storage.put_all(&[a.clone(), b.clone()]).unwrap();

        storage.update_reference("main", &a.id().unwrap()).unwrap();
        storage.update_reference("main", &b.id().unwrap()).unwrap();
        assert_eq!(storage.resolve("main").unwrap(), b.id().unwrap());
    }

    #[test]
    fn destroy_keeps_content() {
        let (_dir, storage) = storage();
        let asset = Asset::for_string("kept");
        storage.put(&asset).unwrap();
        let id = asset.id().unwrap();
        storage.create_reference("gone", &id).unwrap();

        assert!(storage.destroy_reference("gone").unwrap());
        assert!(storage.resolve("gone").unwrap().is_empty());
        assert!(storage.contains(&id));
    }

    #[test]
    fn invalid_reference_name_is_rejected() {
        let (_dir, storage) = storage();
        let asset = Asset::for_string("t");
        storage.put(&asset).unwrap();
        assert!(matches!(
            storage.create_reference("bad name", &asset.id().unwrap()),
            Err(StoreError::InvalidReferenceName { .. })
        ));
    }
}
