//! Asset handles: references to content living in exactly one backing source.
//!
//! An [`Asset`] owns no bytes itself (the in-memory variant shares an
//! immutable buffer). Its identity is computed lazily on first use and cached
//! across clones, so an indexer that already knows the digest can hand it
//! over and the bytes are never read twice.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use arbor_types::AssetId;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectsStorage;

/// Where an asset's bytes come from.
#[derive(Clone)]
pub enum AssetSource {
    /// Identity only; there is nothing to read.
    Id,
    /// An object held by a store.
    Stored(Arc<dyn ObjectsStorage>),
    /// An immutable in-memory buffer.
    Memory(Arc<[u8]>),
    /// A file on the local filesystem.
    File(PathBuf),
    /// A one-shot reader, spooled into memory on first use.
    Stream(Arc<Mutex<StreamState>>),
    /// A named entry inside a zip archive.
    ArchiveEntry { archive: PathBuf, name: String },
}

/// State of a [`AssetSource::Stream`] source.
pub enum StreamState {
    Pending(Box<dyn Read + Send>),
    Spooled(Arc<[u8]>),
}

/// A lazily-read handle to content.
///
/// Equality and ordering proxy to the [`AssetId`]. Two assets whose ids
/// cannot be computed are never equal.
#[derive(Clone)]
pub struct Asset {
    source: AssetSource,
    id: Arc<OnceLock<AssetId>>,
}

/// Compact serialized form of an asset, embedded in tree objects.
///
/// Only the identity is recorded; raw bytes are never inlined. On the way
/// in the id must be a hex digest or the empty sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    #[serde(deserialize_with = "deserialize_record_id")]
    pub id: AssetId,
}

fn deserialize_record_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AssetId, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if raw.is_empty() {
        return Ok(AssetId::empty());
    }
    AssetId::parse(&raw).map_err(serde::de::Error::custom)
}

impl Asset {
    fn new(source: AssetSource, id: Option<AssetId>) -> Self {
        let cell = OnceLock::new();
        if let Some(id) = id {
            let _ = cell.set(id);
        }
        Self {
            source,
            id: Arc::new(cell),
        }
    }

    /// A non-readable asset carrying only an identity.
    pub fn from_id(id: AssetId) -> Self {
        Self::new(AssetSource::Id, Some(id))
    }

    /// The invalid sentinel returned on storage misses.
    pub fn invalid() -> Self {
        Self::from_id(AssetId::empty())
    }

    /// An object resident in `storage`. Nothing is read until `open`.
    pub fn for_stored(storage: Arc<dyn ObjectsStorage>, id: AssetId) -> Self {
        Self::new(AssetSource::Stored(storage), Some(id))
    }

    /// An in-memory buffer.
    pub fn for_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        Self::new(AssetSource::Memory(data.into()), None)
    }

    pub(crate) fn for_shared(data: Arc<[u8]>, id: AssetId) -> Self {
        Self::new(AssetSource::Memory(data), Some(id))
    }

    /// An in-memory string.
    pub fn for_string(data: &str) -> Self {
        Self::for_bytes(data.as_bytes())
    }

    /// A file on disk. The file is hashed on first `id()` call.
    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        Self::new(AssetSource::File(path.into()), None)
    }

    /// A file on disk whose digest is already known.
    pub fn for_file_with_id(path: impl Into<PathBuf>, id: AssetId) -> Self {
        Self::new(AssetSource::File(path.into()), Some(id))
    }

    /// A one-shot reader. The stream is consumed once and kept in memory
    /// so that hashing and storing do not compete for it.
    pub fn for_reader(reader: impl Read + Send + 'static) -> Self {
        let state = StreamState::Pending(Box::new(reader));
        Self::new(AssetSource::Stream(Arc::new(Mutex::new(state))), None)
    }

    /// An entry of a zip archive.
    pub fn for_archive_entry(archive: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::new(
            AssetSource::ArchiveEntry {
                archive: archive.into(),
                name: name.into(),
            },
            None,
        )
    }

    /// An entry of a zip archive whose digest is already known.
    pub fn for_archive_entry_with_id(
        archive: impl Into<PathBuf>,
        name: impl Into<String>,
        id: AssetId,
    ) -> Self {
        let asset = Self::for_archive_entry(archive, name);
        let _ = asset.id.set(id);
        asset
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    /// The id if it has already been computed or was supplied.
    pub fn known_id(&self) -> Option<&AssetId> {
        self.id.get()
    }

    /// The content id, computing and caching it on first call.
    pub fn id(&self) -> StoreResult<AssetId> {
        if let Some(id) = self.id.get() {
            return Ok(id.clone());
        }
        let mut reader = self.open()?;
        let id = AssetId::create_for(&mut reader)?;
        trace!(%id, "calculated asset id");
        Ok(self.id.get_or_init(|| id).clone())
    }

    /// Returns `true` unless this is an id-only handle.
    pub fn is_readable(&self) -> bool {
        !matches!(self.source, AssetSource::Id)
    }

    /// Returns `false` for the invalid sentinel.
    pub fn is_valid(&self) -> bool {
        self.known_id().map_or(true, |id| !id.is_empty())
    }

    /// Open a fresh reader positioned at the start of the content.
    pub fn open(&self) -> StoreResult<Box<dyn Read + Send>> {
        match &self.source {
            AssetSource::Id => Err(StoreError::NonReadableAsset(
                self.known_id().cloned().unwrap_or_default(),
            )),
            AssetSource::Stored(storage) => {
                let id = self.known_id().cloned().unwrap_or_default();
                storage.open(&id)
            }
            AssetSource::Memory(data) => Ok(Box::new(Cursor::new(Arc::clone(data)))),
            AssetSource::File(path) => Ok(Box::new(File::open(path)?)),
            AssetSource::Stream(state) => {
                let mut state = state
                    .lock()
                    .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
                let data = match &mut *state {
                    StreamState::Spooled(data) => Arc::clone(data),
                    StreamState::Pending(reader) => {
                        let mut buf = Vec::new();
                        reader.read_to_end(&mut buf)?;
                        let data: Arc<[u8]> = buf.into();
                        *state = StreamState::Spooled(Arc::clone(&data));
                        data
                    }
                };
                Ok(Box::new(Cursor::new(data)))
            }
            AssetSource::ArchiveEntry { archive, name } => {
                Ok(Box::new(Cursor::new(read_archive_entry(archive, name)?)))
            }
        }
    }

    /// Read the whole content into memory.
    pub fn read_to_vec(&self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Convert into the compact record embedded in tree objects.
    pub fn store(&self) -> StoreResult<AssetRecord> {
        Ok(AssetRecord { id: self.id()? })
    }

    /// Rebuild an asset from its record. With a storage the asset is
    /// readable from it, otherwise it only carries the identity.
    pub fn load(record: &AssetRecord, storage: Option<&Arc<dyn ObjectsStorage>>) -> Self {
        match storage {
            Some(storage) if !record.id.is_empty() => {
                Self::for_stored(Arc::clone(storage), record.id.clone())
            }
            _ => Self::from_id(record.id.clone()),
        }
    }
}

fn read_archive_entry(archive: &Path, name: &str) -> StoreResult<Vec<u8>> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| StoreError::Archive(e.to_string()))?;
    let mut entry = zip
        .by_name(name)
        .map_err(|e| StoreError::Archive(format!("{}: {name}: {e}", archive.display())))?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        match (self.id(), other.id()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Asset {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self.id(), other.id()) {
            (Ok(a), Ok(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }
}

impl fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => write!(f, "Id"),
            Self::Stored(_) => write!(f, "Stored"),
            Self::Memory(data) => write!(f, "Memory({} bytes)", data.len()),
            Self::File(path) => write!(f, "File({})", path.display()),
            Self::Stream(_) => write!(f, "Stream"),
            Self::ArchiveEntry { archive, name } => {
                write!(f, "ArchiveEntry({}!{name})", archive.display())
            }
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("source", &self.source)
            .field("id", &self.known_id())
            .finish()
    }
}
