//! User-visible operations on a [`WorkingCopy`](crate::WorkingCopy).
//!
//! Each command borrows the working copy, checks its preconditions, and
//! performs its storage writes in put-children, put-tree, swing-reference
//! order before returning.

mod checkout;
mod commit;
mod create;
mod destroy;
mod diff;
mod log;
mod reset;
mod set_config;
mod status;
mod tree;

pub use checkout::Checkout;
pub use commit::Commit;
pub use create::Create;
pub use destroy::Destroy;
pub use diff::{parse_range, Diff, DiffReport};
pub use log::{Log, LogEntry};
pub use reset::{Reset, ResetSummary};
pub use set_config::SetConfig;
pub use status::{Status, StatusReport};
pub use tree::{Tree, TreeListing};

use std::fs;
use std::io;
use std::path::Path;

/// Delete a tracked file and any directories left empty by it, stopping at
/// `root`.
pub(crate) fn remove_tracked(root: &Path, path: &str) -> io::Result<()> {
    let target = root.join(path);
    match fs::remove_file(&target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    }
    let mut dir = target.parent();
    while let Some(current) = dir {
        if current == root || fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;

    use tempfile::TempDir;

    use crate::WorkingCopy;

    pub fn fixture() -> (TempDir, WorkingCopy) {
        let dir = tempfile::tempdir().unwrap();
        let wc = WorkingCopy::init(dir.path(), "main").unwrap();
        (dir, wc)
    }

    pub fn write(wc: &WorkingCopy, path: &str, content: &str) {
        let target = wc.root().join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(target, content).unwrap();
    }

    pub fn read(wc: &WorkingCopy, path: &str) -> Option<String> {
        fs::read_to_string(wc.root().join(path)).ok()
    }
}
