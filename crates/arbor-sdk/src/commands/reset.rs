use arbor_tree::{AssetsExtractor, ExtractPolicy};
use tracing::{debug, info};

use crate::commands::remove_tracked;
use crate::error::SdkResult;
use crate::working_copy::WorkingCopy;

/// Paths touched by [`Reset::run`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Committed paths that were missing and have been written back.
    pub restored: Vec<String>,
    /// Uncommitted new paths that have been deleted.
    pub removed: Vec<String>,
}

/// Bring the set of paths back to the committed tree.
///
/// Missing files are restored and new files deleted. Modified files are
/// left untouched.
pub struct Reset<'a> {
    wc: &'a WorkingCopy,
}

impl<'a> Reset<'a> {
    pub fn new(wc: &'a WorkingCopy) -> Self {
        Self { wc }
    }

    pub fn run(self) -> SdkResult<ResetSummary> {
        let diff = self.wc.uncommitted_changes()?;
        let root = self.wc.root();

        for path in diff.added.keys() {
            debug!(%path, "removing uncommitted path");
            remove_tracked(root, path)?;
        }

        let restored: Vec<String> = diff.removed.keys().cloned().collect();
        if !restored.is_empty() {
            AssetsExtractor::new(self.wc.committed_tree(), ExtractPolicy::ReplaceExisting)
                .only(restored.iter().cloned())
                .extract_into(root)?;
        }

        let summary = ResetSummary {
            restored,
            removed: diff.added.into_keys().collect(),
        };
        info!(
            restored = summary.restored.len(),
            removed = summary.removed.len(),
            kept = diff.modified.len(),
            "reset working copy"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{fixture, read, write};
    use crate::commands::Commit;

    #[test]
    fn restores_removed_and_deletes_added() {
        let (_dir, mut wc) = fixture();
        write(&wc, "keep.txt", "keep");
        write(&wc, "dir/lost.txt", "lost");
        Commit::new(&mut wc, "first").run().unwrap();

        std::fs::remove_dir_all(wc.root().join("dir")).unwrap();
        write(&wc, "keep.txt", "edited");
        write(&wc, "extra/new.txt", "new");

        let summary = Reset::new(&wc).run().unwrap();
        assert_eq!(summary.restored, vec!["dir/lost.txt"]);
        assert_eq!(summary.removed, vec!["extra/new.txt"]);

        assert_eq!(read(&wc, "dir/lost.txt").as_deref(), Some("lost"));
        assert_eq!(read(&wc, "keep.txt").as_deref(), Some("edited"));
        assert!(!wc.root().join("extra").exists());

        let diff = wc.uncommitted_changes().unwrap();
        assert!(diff.added.is_empty() && diff.removed.is_empty());
        assert_eq!(diff.modified.len(), 1);
    }

    #[test]
    fn clean_working_copy_is_untouched() {
        let (_dir, wc) = fixture();
        assert_eq!(Reset::new(&wc).run().unwrap(), ResetSummary::default());
    }
}
