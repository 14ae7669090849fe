use arbor_diff::IndexesDiff;
use arbor_store::AssetId;
use arbor_tree::{tree_index, TreeIndex};
use tracing::info;

use crate::error::{SdkError, SdkResult};
use crate::working_copy::WorkingCopy;

/// Snapshot the working directory onto the active reference.
pub struct Commit<'a> {
    wc: &'a mut WorkingCopy,
    message: String,
}

impl<'a> Commit<'a> {
    pub fn new(wc: &'a mut WorkingCopy, message: impl Into<String>) -> Self {
        Self {
            wc,
            message: message.into(),
        }
    }

    /// Returns the id of the new tree.
    pub fn run(self) -> SdkResult<AssetId> {
        let mut tree = self.wc.working_dir_tree()?;
        let diff = IndexesDiff::diff(self.wc.committed_tree(), &tree);
        // A permission change alone is still worth a snapshot.
        if diff.is_empty() && diff.attributes_changed.is_empty() {
            return Err(SdkError::NothingToCommit);
        }

        let config = self.wc.config();
        tree.set_parent(self.wc.committed_tree().id()?);
        tree.set_attribute(tree_index::AUTHOR, config.author());
        tree.set_attribute(tree_index::EMAIL, config.email());
        tree.set_attribute(tree_index::COMMITER, config.commiter());
        tree.set_attribute(tree_index::COMMITER_EMAIL, config.commiter_email());
        tree.set_attribute(tree_index::MESSAGE, self.message);

        let storage = self.wc.storage().clone();
        let id = tree.id()?;
        storage.put_all(&tree.all_assets()?)?;
        let reference = self.wc.active_reference_name().to_string();
        storage.update_reference(&reference, &id)?;
        self.wc.rebind(&reference, TreeIndex::from_id(&storage, &id)?)?;

        info!(
            %reference,
            %id,
            changes = diff.len(),
            attribute_changes = diff.attributes_changed.len(),
            "committed"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{fixture, write};
    use std::fs;

    #[test]
    fn clean_working_copy_has_nothing_to_commit() {
        let (_dir, mut wc) = fixture();
        assert!(matches!(
            Commit::new(&mut wc, "empty").run(),
            Err(SdkError::NothingToCommit)
        ));
    }

    #[test]
    fn commit_advances_reference_and_links_parent() {
        let (_dir, mut wc) = fixture();
        let initial = wc.storage().resolve("main").unwrap();

        write(&wc, "f.txt", "content");
        let diff = wc.uncommitted_changes().unwrap();
        assert!(diff.added.contains_key("f.txt"));

        let id = Commit::new(&mut wc, "add f").run().unwrap();
        assert_ne!(id, initial);
        assert_eq!(wc.storage().resolve("main").unwrap(), id);

        let tree = wc.committed_tree();
        assert_eq!(tree.parent(), &initial);
        assert_eq!(tree.message(), Some("add f"));
        assert!(!tree.is_initial());
        assert!(tree.author().is_some());
        assert!(wc.uncommitted_changes().unwrap().is_empty());
    }

    #[test]
    fn author_comes_from_config() {
        let (_dir, mut wc) = fixture();
        wc.set_config("author", "Ada").unwrap();
        wc.set_config("email", "ada@example.com").unwrap();
        write(&wc, "f.txt", "x");
        Commit::new(&mut wc, "m").run().unwrap();
        assert_eq!(wc.committed_tree().author(), Some("Ada"));
        assert_eq!(wc.committed_tree().email(), Some("ada@example.com"));
    }

    #[test]
    fn committed_content_is_stored() {
        let (_dir, mut wc) = fixture();
        write(&wc, "dir/f.txt", "kept");
        Commit::new(&mut wc, "m").run().unwrap();
        fs::remove_file(wc.root().join("dir/f.txt")).unwrap();

        let entry = wc.committed_tree().get("dir/f.txt").unwrap();
        assert!(wc.storage().contains(&entry.id));
        assert_eq!(entry.asset.read_to_vec().unwrap(), b"kept");
    }

    #[test]
    fn deletion_is_a_change() {
        let (_dir, mut wc) = fixture();
        write(&wc, "f.txt", "x");
        Commit::new(&mut wc, "add").run().unwrap();
        fs::remove_file(wc.root().join("f.txt")).unwrap();
        Commit::new(&mut wc, "remove").run().unwrap();
        assert_eq!(wc.committed_tree().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn mode_only_change_is_committed() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, mut wc) = fixture();
        write(&wc, "run.sh", "echo hi\n");
        let path = wc.root().join("run.sh");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        let first = Commit::new(&mut wc, "first").run().unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let second = Commit::new(&mut wc, "make executable").run().unwrap();
        assert_ne!(first, second);
        let tree = wc.committed_tree();
        assert_eq!(tree.parent(), &first);
        assert_eq!(tree.entry_attributes("run.sh").unwrap().mode, 0o755);
        assert!(wc.uncommitted_changes().unwrap().attributes_changed.is_empty());
        assert!(matches!(
            Commit::new(&mut wc, "again").run(),
            Err(SdkError::NothingToCommit)
        ));
    }
}
