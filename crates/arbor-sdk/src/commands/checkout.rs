use std::path::PathBuf;

use arbor_diff::IndexesDiff;
use arbor_tree::{AssetsExtractor, ExtractPolicy, TreeIndex};
use tracing::{debug, info};

use crate::commands::{remove_tracked, Create};
use crate::error::{SdkError, SdkResult};
use crate::working_copy::WorkingCopy;

/// Switch the working copy to another reference.
pub struct Checkout<'a> {
    wc: &'a mut WorkingCopy,
    reference: String,
    force: bool,
    create: bool,
    policy: Option<ExtractPolicy>,
}

impl<'a> Checkout<'a> {
    pub fn new(wc: &'a mut WorkingCopy, reference: impl Into<String>) -> Self {
        Self {
            wc,
            reference: reference.into(),
            force: false,
            create: false,
            policy: None,
        }
    }

    /// Proceed even with uncommitted changes.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Create the reference if it does not exist.
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Override the configured extraction policy.
    pub fn policy(mut self, policy: Option<ExtractPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the paths written into the working directory.
    pub fn run(self) -> SdkResult<Vec<PathBuf>> {
        let storage = self.wc.storage().clone();
        let id = storage.resolve(&self.reference)?;
        if id.is_empty() {
            if !self.create {
                return Err(SdkError::NoSuchReference(self.reference));
            }
            Create::new(self.wc, self.reference).run()?;
            return Ok(Vec::new());
        }

        let working = self.wc.working_dir_tree()?;
        let pending = IndexesDiff::diff(self.wc.committed_tree(), &working);
        if !pending.is_empty() && !self.force {
            return Err(SdkError::NonCommitedChanges);
        }

        let target = TreeIndex::from_id(&storage, &id)?;
        let root = self.wc.root().to_path_buf();

        // Tracked paths the target drops are deleted unless locally modified.
        for (path, entry) in self.wc.committed_tree().entries() {
            if target.contains(path) {
                continue;
            }
            if working.get(path).is_some_and(|w| w.id == entry.id) {
                debug!(%path, "removing path absent from target");
                remove_tracked(&root, path)?;
            }
        }

        // Paths the user left as committed are always replaced. Only local
        // edits and untracked collisions go through the extraction policy.
        let committed = self.wc.committed_tree();
        let (clean, touched): (Vec<String>, Vec<String>) = target
            .entries()
            .filter(|(path, entry)| working.get(path).map_or(true, |w| *w != **entry))
            .map(|(path, _)| path.clone())
            .partition(|path| working.get(path) == committed.get(path));
        let policy = self.policy.unwrap_or_else(|| self.wc.config().extract_policy());
        let mut written = AssetsExtractor::new(&target, ExtractPolicy::ReplaceExisting)
            .only(clean)
            .extract_into(&root)?;
        if !touched.is_empty() {
            debug!(paths = touched.len(), %policy, "extracting over local changes");
            written.extend(
                AssetsExtractor::new(&target, policy)
                    .only(touched)
                    .extract_into(&root)?,
            );
        }

        self.wc.rebind(&self.reference, target)?;
        info!(reference = %self.reference, %id, %policy, "checked out");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{fixture, read, write};
    use crate::commands::Commit;

    /// `main` has a.txt=main, `dev` has a.txt=dev and d.txt; active is `main`.
    fn two_branches() -> (tempfile::TempDir, WorkingCopy) {
        let (dir, mut wc) = fixture();
        write(&wc, "a.txt", "main");
        Commit::new(&mut wc, "main work").run().unwrap();

        Create::new(&mut wc, "dev").run().unwrap();
        write(&wc, "a.txt", "dev");
        write(&wc, "sub/d.txt", "only on dev");
        Commit::new(&mut wc, "dev work").run().unwrap();

        Checkout::new(&mut wc, "main").run().unwrap();
        (dir, wc)
    }

    #[test]
    fn switches_content_and_reference() {
        let (_dir, mut wc) = two_branches();
        assert_eq!(wc.active_reference_name(), "main");
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("main"));
        assert!(!wc.root().join("sub").exists());

        Checkout::new(&mut wc, "dev").run().unwrap();
        assert_eq!(wc.active_reference_name(), "dev");
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("dev"));
        assert_eq!(read(&wc, "sub/d.txt").as_deref(), Some("only on dev"));
        assert!(wc.uncommitted_changes().unwrap().is_empty());
    }

    #[test]
    fn uncommitted_changes_block_checkout() {
        let (_dir, mut wc) = two_branches();
        write(&wc, "a.txt", "local edit");
        assert!(matches!(
            Checkout::new(&mut wc, "dev").run(),
            Err(SdkError::NonCommitedChanges)
        ));
        assert_eq!(wc.active_reference_name(), "main");
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("local edit"));
    }

    #[test]
    fn force_applies_extraction_policy() {
        let (_dir, mut wc) = two_branches();
        write(&wc, "a.txt", "local edit");
        Checkout::new(&mut wc, "dev")
            .force(true)
            .policy(Some(ExtractPolicy::KeepExisting))
            .run()
            .unwrap();
        assert_eq!(wc.active_reference_name(), "dev");
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("local edit"));
        assert_eq!(read(&wc, "sub/d.txt").as_deref(), Some("only on dev"));
    }

    #[test]
    fn force_with_replace_discards_local_edit() {
        let (_dir, mut wc) = two_branches();
        write(&wc, "a.txt", "local edit");
        Checkout::new(&mut wc, "dev").force(true).run().unwrap();
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("dev"));
    }

    #[test]
    fn clean_checkout_ignores_keep_policy() {
        let (_dir, mut wc) = two_branches();
        Checkout::new(&mut wc, "dev").run().unwrap();
        wc.set_config("extract_policy", "keep").unwrap();
        assert!(wc.uncommitted_changes().unwrap().is_empty());

        Checkout::new(&mut wc, "main").run().unwrap();
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("main"));
        assert!(wc.uncommitted_changes().unwrap().is_empty());
        Checkout::new(&mut wc, "dev").run().unwrap();
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("dev"));
    }

    #[test]
    fn clean_checkout_writes_no_suffixed_copies() {
        let (_dir, mut wc) = two_branches();
        wc.set_config("extract_policy", "new").unwrap();
        Checkout::new(&mut wc, "dev").run().unwrap();

        assert_eq!(read(&wc, "a.txt").as_deref(), Some("dev"));
        let names: Vec<String> = std::fs::read_dir(wc.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.contains(".new.")), "{names:?}");
    }

    #[test]
    fn configured_policy_is_used() {
        let (_dir, mut wc) = two_branches();
        wc.set_config("extract_policy", "new").unwrap();
        write(&wc, "a.txt", "local edit");
        Checkout::new(&mut wc, "dev").force(true).run().unwrap();

        let id = wc.storage().resolve("dev").unwrap();
        assert_eq!(read(&wc, "a.txt").as_deref(), Some("local edit"));
        assert_eq!(read(&wc, &format!("a.txt.new.{id}")).as_deref(), Some("dev"));
    }

    #[test]
    fn unknown_reference_fails_unless_created() {
        let (_dir, mut wc) = fixture();
        assert!(matches!(
            Checkout::new(&mut wc, "nope").run(),
            Err(SdkError::NoSuchReference(_))
        ));

        Checkout::new(&mut wc, "nope").create(true).run().unwrap();
        assert_eq!(wc.active_reference_name(), "nope");
        assert!(!wc.storage().resolve("nope").unwrap().is_empty());
    }

    #[test]
    fn untracked_files_survive() {
        let (_dir, mut wc) = two_branches();
        Checkout::new(&mut wc, "dev").run().unwrap();
        write(&wc, "untracked.txt", "mine");
        Checkout::new(&mut wc, "main").force(true).run().unwrap();
        assert_eq!(read(&wc, "untracked.txt").as_deref(), Some("mine"));
        assert!(!wc.root().join("sub/d.txt").exists());
    }
}
