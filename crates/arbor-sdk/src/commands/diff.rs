use std::collections::BTreeMap;

use arbor_diff::{diff_assets, BlobDiff, IndexesDiff};
use arbor_tree::TreeIndex;
use tracing::debug;

use crate::error::{SdkError, SdkResult};
use crate::working_copy::WorkingCopy;

/// Split a `from..to` range into its optional sides.
///
/// Either side may be omitted. A string without `..` names the `from` side
/// only; an empty string leaves both sides to their defaults.
pub fn parse_range(range: &str) -> SdkResult<(Option<String>, Option<String>)> {
    let side = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    match range.split_once("..") {
        Some((_, to)) if to.contains("..") => Err(SdkError::InvalidRange(range.to_string())),
        Some((from, to)) => Ok((side(from), side(to))),
        None => Ok((side(range), None)),
    }
}

/// Result of [`Diff::run`].
#[derive(Debug, Default)]
pub struct DiffReport {
    pub diff: IndexesDiff,
    /// Line-level changes of modified paths, filled when content is requested.
    pub blobs: BTreeMap<String, BlobDiff>,
}

/// Compare two trees. The `from` side defaults to the committed tree and the
/// `to` side to the live directory.
pub struct Diff<'a> {
    wc: &'a WorkingCopy,
    range: Option<String>,
    content: bool,
}

impl<'a> Diff<'a> {
    pub fn new(wc: &'a WorkingCopy, range: Option<String>) -> Self {
        Self {
            wc,
            range,
            content: false,
        }
    }

    /// Also compute line-level diffs of modified entries.
    pub fn content(mut self, content: bool) -> Self {
        self.content = content;
        self
    }

    pub fn run(self) -> SdkResult<DiffReport> {
        let (from, to) = match self.range.as_deref() {
            Some(range) => parse_range(range)?,
            None => (None, None),
        };
        let from = match from {
            Some(name) => self.load(&name)?,
            None => self.wc.committed_tree().clone(),
        };
        let to = match to {
            Some(name) => self.load(&name)?,
            None => self.wc.working_dir_tree()?,
        };

        let diff = IndexesDiff::diff(&from, &to);
        let mut blobs = BTreeMap::new();
        if self.content {
            for (path, modification) in &diff.modified {
                let blob = diff_assets(&modification.from.asset, &modification.to.asset)?;
                blobs.insert(path.clone(), blob);
            }
        }
        debug!(changes = diff.len(), blobs = blobs.len(), "diff computed");
        Ok(DiffReport { diff, blobs })
    }

    fn load(&self, name: &str) -> SdkResult<TreeIndex> {
        let storage = self.wc.storage();
        let id = storage.resolve(name)?;
        if id.is_empty() {
            return Err(SdkError::NoSuchReference(name.to_string()));
        }
        Ok(TreeIndex::from_id(storage, &id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{fixture, write};
    use crate::commands::{Commit, Create};
    use arbor_diff::ChangeState;

    #[test]
    fn parses_ranges() {
        assert_eq!(
            parse_range("a..b").unwrap(),
            (Some("a".into()), Some("b".into()))
        );
        assert_eq!(parse_range("a..").unwrap(), (Some("a".into()), None));
        assert_eq!(parse_range("..b").unwrap(), (None, Some("b".into())));
        assert_eq!(parse_range("..").unwrap(), (None, None));
        assert_eq!(parse_range("a").unwrap(), (Some("a".into()), None));
        assert_eq!(parse_range("").unwrap(), (None, None));
        assert!(matches!(parse_range("a..b..c"), Err(SdkError::InvalidRange(_))));
    }

    #[test]
    fn default_sides_compare_committed_with_working_dir() {
        let (_dir, mut wc) = fixture();
        write(&wc, "a.txt", "hello");
        write(&wc, "b.txt", "gone soon");
        Commit::new(&mut wc, "first").run().unwrap();

        write(&wc, "a.txt", "world");
        std::fs::remove_file(wc.root().join("b.txt")).unwrap();
        write(&wc, "c.txt", "new");

        let report = Diff::new(&wc, None).run().unwrap();
        assert_eq!(
            report.diff.changes(),
            vec![
                ("a.txt", ChangeState::Modified),
                ("b.txt", ChangeState::Removed),
                ("c.txt", ChangeState::Added),
            ]
        );
        assert!(report.blobs.is_empty());
    }

    #[test]
    fn named_references_on_both_sides() {
        let (_dir, mut wc) = fixture();
        write(&wc, "a.txt", "one");
        Commit::new(&mut wc, "main").run().unwrap();
        Create::new(&mut wc, "other").run().unwrap();
        write(&wc, "a.txt", "two");
        Commit::new(&mut wc, "other").run().unwrap();

        let report = Diff::new(&wc, Some("main..other".into())).run().unwrap();
        assert_eq!(report.diff.modified.len(), 1);

        let report = Diff::new(&wc, Some("other..main".into())).run().unwrap();
        let (old, new) = report.diff.ids("a.txt").unwrap();
        assert_eq!(old, arbor_store::AssetId::for_bytes(b"two"));
        assert_eq!(new, arbor_store::AssetId::for_bytes(b"one"));
    }

    #[test]
    fn unknown_reference_is_reported() {
        let (_dir, wc) = fixture();
        assert!(matches!(
            Diff::new(&wc, Some("ghost..".into())).run(),
            Err(SdkError::NoSuchReference(name)) if name == "ghost"
        ));
    }

    #[test]
    fn content_renders_line_hunks() {
        let (_dir, mut wc) = fixture();
        write(&wc, "a.txt", "line one\nline two\n");
        Commit::new(&mut wc, "first").run().unwrap();
        write(&wc, "a.txt", "line one\nline 2\n");

        let report = Diff::new(&wc, None).content(true).run().unwrap();
        let blob = &report.blobs["a.txt"];
        assert_eq!(blob.additions(), 1);
        assert_eq!(blob.deletions(), 1);
        assert!(blob.render().contains("+line 2"));
    }
}
