//! Materialization of a tree into a directory.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use arbor_store::AssetId;
use arbor_types::DigestWriter;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::attributes::AssetKind;
use crate::error::{TreeError, TreeResult};
use crate::tree_index::{TreeEntry, TreeIndex};

/// What to do when a path to extract already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractPolicy {
    /// Leave the existing item untouched.
    #[serde(rename = "keep")]
    KeepExisting,
    /// Remove the existing item and extract in its place.
    #[default]
    #[serde(rename = "replace")]
    ReplaceExisting,
    /// Move the existing item to `<path>.backup.<tree id>`, then extract.
    #[serde(rename = "backup")]
    BackupExisting,
    /// Keep the existing item and extract to `<path>.new.<tree id>`.
    #[serde(rename = "new")]
    AddNewWithSuffix,
}

impl ExtractPolicy {
    pub const ALL: [ExtractPolicy; 4] = [
        Self::KeepExisting,
        Self::ReplaceExisting,
        Self::BackupExisting,
        Self::AddNewWithSuffix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepExisting => "keep",
            Self::ReplaceExisting => "replace",
            Self::BackupExisting => "backup",
            Self::AddNewWithSuffix => "new",
        }
    }
}

impl fmt::Display for ExtractPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown extract policy {s:?} (expected keep, replace, backup or new)"))
    }
}

/// Writes every entry of a tree below a directory.
///
/// Content is hashed while it is written; a mismatch with the recorded id
/// aborts with [`TreeError::CorruptedData`] and leaves the target path
/// untouched. Files get their recorded permission bits, symlink entries
/// become symlinks.
pub struct AssetsExtractor<'a> {
    tree: &'a TreeIndex,
    policy: ExtractPolicy,
    only: Option<BTreeSet<String>>,
}

impl<'a> AssetsExtractor<'a> {
    pub fn new(tree: &'a TreeIndex, policy: ExtractPolicy) -> Self {
        Self {
            tree,
            policy,
            only: None,
        }
    }

    /// Restrict extraction to the given paths of the tree.
    pub fn only(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.only = Some(paths.into_iter().collect());
        self
    }

    /// Extract all entries. Returns the paths that were written.
    pub fn extract_into(&self, directory: &Path) -> TreeResult<Vec<PathBuf>> {
        if !directory.is_dir() {
            return Err(TreeError::NotADirectory(directory.display().to_string()));
        }
        let tree_id = self.tree.id()?;

        let mut written = Vec::new();
        for (path, entry) in self.tree.entries() {
            if self.only.as_ref().is_some_and(|only| !only.contains(path)) {
                continue;
            }
            let mut target = directory.join(path);
            if let Some(parent) = Path::new(path).parent() {
                create_parent(directory, parent)?;
            }
            if fs::symlink_metadata(&target).is_ok() {
                match self.policy {
                    ExtractPolicy::KeepExisting => {
                        trace!(%path, "keeping existing item");
                        continue;
                    }
                    ExtractPolicy::ReplaceExisting => remove_item(&target)?,
                    ExtractPolicy::BackupExisting => {
                        let backup = with_suffix(&target, "backup", &tree_id);
                        trace!(%path, backup = %backup.display(), "backing up existing item");
                        remove_item(&backup)?;
                        fs::rename(&target, &backup)?;
                    }
                    ExtractPolicy::AddNewWithSuffix => {
                        target = with_suffix(&target, "new", &tree_id);
                        remove_item(&target)?;
                    }
                }
            }
            self.extract_entry(path, entry, &target)?;
            written.push(target);
        }

        debug!(tree = %tree_id, policy = %self.policy, written = written.len(), "extracted tree");
        Ok(written)
    }

    fn extract_entry(&self, path: &str, entry: &TreeEntry, target: &Path) -> TreeResult<()> {
        let attributes = self.tree.entry_attributes(path)?;
        let parent = target.parent().unwrap_or(target);

        let mut reader = entry.asset.open()?;
        match attributes.kind {
            AssetKind::File => {
                let mut writer = DigestWriter::new(NamedTempFile::new_in(parent)?);
                io::copy(&mut reader, &mut writer)?;
                let (tmp, actual) = writer.finish()?;
                verify(path, &entry.id, actual)?;
                set_mode(tmp.path(), attributes.mode)?;
                tmp.persist(target).map_err(|e| TreeError::Io(e.error))?;
            }
            AssetKind::Symlink => {
                let mut link = Vec::new();
                reader.read_to_end(&mut link)?;
                verify(path, &entry.id, AssetId::for_bytes(&link))?;
                let link = String::from_utf8(link).map_err(|_| TreeError::InvalidAttribute {
                    path: path.to_string(),
                    name: "symlink target".into(),
                    value: "<non UTF-8>".into(),
                })?;
                create_symlink(&link, target)?;
            }
        }
        trace!(%path, "extracted entry");
        Ok(())
    }
}

fn verify(path: &str, expected: &AssetId, actual: AssetId) -> TreeResult<()> {
    if *expected != actual {
        return Err(TreeError::CorruptedData {
            path: path.to_string(),
            expected: expected.clone(),
            actual,
        });
    }
    Ok(())
}

fn with_suffix(path: &Path, kind: &str, tree_id: &AssetId) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{kind}.{tree_id}"));
    PathBuf::from(name)
}

/// Remove a file, symlink or directory if it exists.
fn remove_item(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Create `relative` below `root` one component at a time. Anything in the
/// way that is not a real directory, symlinks included, is replaced.
fn create_parent(root: &Path, relative: &Path) -> io::Result<()> {
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => {
                trace!(path = %current.display(), "replacing non-directory with directory");
                fs::remove_file(&current)?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::create_dir(&current)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, perms)
}

#[cfg(unix)]
fn create_symlink(link: &str, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

#[cfg(not(unix))]
fn create_symlink(link: &str, target: &Path) -> io::Result<()> {
    fs::write(target, link)
}
