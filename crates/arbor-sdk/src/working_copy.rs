use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arbor_diff::IndexesDiff;
use arbor_store::{validate_reference_name, LocalDirectoryStorage, ObjectsStorage};
use arbor_tree::{FsIndexer, Indexer, TreeIndex};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{SdkError, SdkResult};
use crate::lock::WorkingCopyLock;

/// Name of the metadata directory at the root of every working copy.
pub const METADATA_DIR: &str = ".arbor";

const REFERENCE_FILE: &str = "reference";
const CONFIG_FILE: &str = "config.toml";
const LOCK_FILE: &str = "lock";
const STORAGE_DIR: &str = "storage";

/// Observable state of a directory with respect to working copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkingCopyState {
    /// No metadata directory here or in any ancestor.
    Uninitialized,
    /// Metadata present and the active reference resolves to a tree.
    Attached { root: PathBuf, reference: String },
    /// Metadata present but unusable. Never repaired automatically.
    Invalid { root: PathBuf, reason: String },
}

/// A live directory bound to a storage and an active reference.
///
/// Holds an exclusive advisory lock on the metadata directory for its whole
/// lifetime. Storage writes happen synchronously inside each call.
pub struct WorkingCopy {
    root: PathBuf,
    metadata_dir: PathBuf,
    storage: Arc<dyn ObjectsStorage>,
    reference: String,
    committed: TreeIndex,
    config: Config,
    _lock: WorkingCopyLock,
}

impl WorkingCopy {
    /// Initialize a working copy at `root` with an empty tree bound to
    /// `reference`.
    pub fn init(root: &Path, reference: &str) -> SdkResult<Self> {
        validate_reference_name(reference)?;
        fs::create_dir_all(root)?;
        let root = &fs::canonicalize(root)?;
        let metadata_dir = root.join(METADATA_DIR);
        if fs::symlink_metadata(&metadata_dir).is_ok() {
            return Err(SdkError::InitExistingWorkingCopy(root.display().to_string()));
        }
        fs::create_dir_all(&metadata_dir)?;
        let lock = WorkingCopyLock::acquire(&metadata_dir.join(LOCK_FILE))?;

        let storage: Arc<dyn ObjectsStorage> =
            Arc::new(LocalDirectoryStorage::open(metadata_dir.join(STORAGE_DIR))?);
        let tree = TreeIndex::initial_for(reference);
        storage.put_all(&tree.all_assets()?)?;
        storage.create_reference(reference, &tree.id()?)?;
        write_reference_file(&metadata_dir, reference)?;

        info!(root = %root.display(), reference, "initialized working copy");
        Ok(Self {
            root: root.to_path_buf(),
            metadata_dir,
            storage,
            reference: reference.to_string(),
            committed: tree,
            config: Config::default(),
            _lock: lock,
        })
    }

    /// Attach to the working copy containing `start`, searching ancestors.
    pub fn attach(start: &Path) -> SdkResult<Self> {
        let root = find_root(start)
            .ok_or_else(|| SdkError::AttachToNonWorkingCopy(start.display().to_string()))?;
        let metadata_dir = root.join(METADATA_DIR);
        let lock = WorkingCopyLock::acquire(&metadata_dir.join(LOCK_FILE))?;

        let storage_dir = metadata_dir.join(STORAGE_DIR);
        if !storage_dir.is_dir() {
            return Err(SdkError::InvalidWorkingCopy(format!(
                "missing storage directory {}",
                storage_dir.display()
            )));
        }
        let storage: Arc<dyn ObjectsStorage> = Arc::new(LocalDirectoryStorage::open(storage_dir)?);
        let reference = read_reference_file(&metadata_dir)?;
        let committed = TreeIndex::from_ref(&storage, &reference)
            .map_err(|e| SdkError::InvalidWorkingCopy(format!("{reference}: {e}")))?;
        let config = Config::load(&metadata_dir.join(CONFIG_FILE))?;

        debug!(root = %root.display(), %reference, "attached to working copy");
        Ok(Self {
            root,
            metadata_dir,
            storage,
            reference,
            committed,
            config,
            _lock: lock,
        })
    }

    /// Report the state of the working copy containing `start`. Never fails
    /// and takes no lock.
    pub fn state(start: &Path) -> WorkingCopyState {
        let Some(root) = find_root(start) else {
            return WorkingCopyState::Uninitialized;
        };
        match probe(&root) {
            Ok(reference) => WorkingCopyState::Attached { root, reference },
            Err(reason) => WorkingCopyState::Invalid { root, reason },
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn storage(&self) -> &Arc<dyn ObjectsStorage> {
        &self.storage
    }

    pub fn active_reference_name(&self) -> &str {
        &self.reference
    }

    /// The tree the active reference was bound to when last (re)bound.
    pub fn committed_tree(&self) -> &TreeIndex {
        &self.committed
    }

    /// A fresh index of the live directory. Never cached.
    pub fn working_dir_tree(&self) -> SdkResult<TreeIndex> {
        Ok(FsIndexer::new().skip(METADATA_DIR).build(&self.root)?)
    }

    /// Diff from the committed tree to the live directory.
    pub fn uncommitted_changes(&self) -> SdkResult<IndexesDiff> {
        let working = self.working_dir_tree()?;
        Ok(IndexesDiff::diff(&self.committed, &working))
    }

    /// Switch the active reference and cached committed tree.
    pub fn rebind(&mut self, reference: &str, tree: TreeIndex) -> SdkResult<()> {
        write_reference_file(&self.metadata_dir, reference)?;
        debug!(from = %self.reference, to = reference, "rebound working copy");
        self.reference = reference.to_string();
        self.committed = tree;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set and persist one configuration value.
    pub fn set_config(&mut self, key: &str, value: &str) -> SdkResult<()> {
        let mut config = self.config.clone();
        config.set(key, value)?;
        config.save(&self.metadata_dir.join(CONFIG_FILE))?;
        self.config = config;
        Ok(())
    }
}

impl std::fmt::Debug for WorkingCopy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingCopy")
            .field("root", &self.root)
            .field("reference", &self.reference)
            .finish()
    }
}

fn find_root(start: &Path) -> Option<PathBuf> {
    let start = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| dir.join(METADATA_DIR).is_dir())
        .map(Path::to_path_buf)
}

fn probe(root: &Path) -> Result<String, String> {
    let metadata_dir = root.join(METADATA_DIR);
    let storage_dir = metadata_dir.join(STORAGE_DIR);
    if !storage_dir.is_dir() {
        return Err("missing storage directory".into());
    }
    let reference = read_reference_file(&metadata_dir).map_err(|e| e.to_string())?;
    let storage: Arc<dyn ObjectsStorage> =
        Arc::new(LocalDirectoryStorage::open(storage_dir).map_err(|e| e.to_string())?);
    TreeIndex::from_ref(&storage, &reference).map_err(|e| e.to_string())?;
    Ok(reference)
}

fn read_reference_file(metadata_dir: &Path) -> SdkResult<String> {
    let path = metadata_dir.join(REFERENCE_FILE);
    let reference = fs::read_to_string(&path)
        .map_err(|e| SdkError::InvalidWorkingCopy(format!("{}: {e}", path.display())))?;
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(SdkError::InvalidWorkingCopy("empty active reference".into()));
    }
    Ok(reference.to_string())
}

fn write_reference_file(metadata_dir: &Path, reference: &str) -> SdkResult<()> {
    let mut tmp = NamedTempFile::new_in(metadata_dir)?;
    writeln!(tmp, "{reference}")?;
    tmp.persist(metadata_dir.join(REFERENCE_FILE))
        .map_err(|e| SdkError::Io(e.error))?;
    Ok(())
}
