//! Builders that seed a [`TreeIndex`] from a source.
//!
//! Every entry produced by an indexer carries a readable asset pointing back
//! at its source (a file or an archive entry) with the id already computed,
//! so storing the tree later reads each source once more and no more.

use std::ffi::OsStr;
use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;

use arbor_store::Asset;
use arbor_types::DigestReader;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::attributes::{EntryAttributes, DEFAULT_ASSET_MODE};
use crate::error::{TreeError, TreeResult};
use crate::tree_index::TreeIndex;

/// Builds a tree from a source location.
pub trait Indexer {
    fn build(&self, source: &Path) -> TreeResult<TreeIndex>;
}

/// Indexes a directory recursively.
///
/// Regular files become file entries with their permission bits, symlinks
/// become symlink entries whose content is the link target. Directories are
/// not recorded. Top-level names in the skip list are ignored entirely.
#[derive(Debug, Clone, Default)]
pub struct FsIndexer {
    skip: Vec<String>,
}

impl FsIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore the top-level entry `name` (and everything below it).
    pub fn skip(mut self, name: impl Into<String>) -> Self {
        self.skip.push(name.into());
        self
    }
}

impl Indexer for FsIndexer {
    fn build(&self, source: &Path) -> TreeResult<TreeIndex> {
        if !source.is_dir() {
            return Err(TreeError::NotADirectory(source.display().to_string()));
        }

        let mut tree = TreeIndex::new();
        let walker = WalkDir::new(source)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() != 1 || !self.skip.iter().any(|s| e.file_name() == OsStr::new(s))
            });

        for entry in walker {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            let path = relative_path(source, entry.path())?;

            if file_type.is_symlink() {
                let target = fs::read_link(entry.path())?;
                let target = target.to_str().ok_or_else(|| TreeError::InvalidPath {
                    path: path.clone(),
                    reason: "symlink target is not UTF-8".into(),
                })?;
                trace!(%path, %target, "indexed symlink");
                tree.put(
                    &path,
                    Asset::for_string(target),
                    EntryAttributes::symlink().to_map(),
                )?;
            } else if file_type.is_file() {
                let mode = file_mode(&entry.metadata()?);
                tree.put(
                    &path,
                    Asset::for_file(entry.path()),
                    EntryAttributes::file(mode).to_map(),
                )?;
                trace!(%path, "indexed file");
            }
        }

        debug!(source = %source.display(), entries = tree.len(), "indexed directory");
        Ok(tree)
    }
}

/// Indexes the file entries of a zip archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipIndexer;

impl ZipIndexer {
    pub fn new() -> Self {
        Self
    }
}

impl Indexer for ZipIndexer {
    fn build(&self, source: &Path) -> TreeResult<TreeIndex> {
        let archive_err = |e: zip::result::ZipError| TreeError::Archive(e.to_string());
        let mut archive = zip::ZipArchive::new(File::open(source)?).map_err(archive_err)?;

        let mut tree = TreeIndex::new();
        for index in 0..archive.len() {
            let entry = archive.by_index(index).map_err(archive_err)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mode = entry.unix_mode().unwrap_or(DEFAULT_ASSET_MODE);

            let mut reader = DigestReader::new(entry);
            io::copy(&mut reader, &mut io::sink())?;
            let id = reader.finish();

            trace!(%name, %id, "indexed archive entry");
            tree.put(
                &name,
                Asset::for_archive_entry_with_id(source, name.clone(), id),
                EntryAttributes::file(mode).to_map(),
            )?;
        }

        debug!(source = %source.display(), entries = tree.len(), "indexed archive");
        Ok(tree)
    }
}

fn relative_path(root: &Path, path: &Path) -> TreeResult<String> {
    let relative = path.strip_prefix(root).map_err(|_| TreeError::InvalidPath {
        path: path.display().to_string(),
        reason: "outside of indexed root".into(),
    })?;
    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().ok_or_else(|| TreeError::InvalidPath {
                path: relative.display().to_string(),
                reason: "not UTF-8".into(),
            })
        })
        .collect::<TreeResult<Vec<_>>>()?;
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        DEFAULT_ASSET_MODE
    }
}
