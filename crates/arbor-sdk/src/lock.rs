use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs4::FileExt;
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Exclusive advisory lock on a working copy, released on drop.
#[derive(Debug)]
pub struct WorkingCopyLock {
    file: File,
    path: PathBuf,
}

impl WorkingCopyLock {
    /// Take the lock without blocking. Fails with [`SdkError::Locked`] if
    /// another holder has it.
    pub fn acquire(path: &Path) -> SdkResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "acquired working copy lock");
                Ok(Self {
                    file,
                    path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                Err(SdkError::Locked(path.display().to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopyLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_holder_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");

        let first = WorkingCopyLock::acquire(&path).unwrap();
        assert!(matches!(
            WorkingCopyLock::acquire(&path),
            Err(SdkError::Locked(_))
        ));

        drop(first);
        assert!(WorkingCopyLock::acquire(&path).is_ok());
    }
}
