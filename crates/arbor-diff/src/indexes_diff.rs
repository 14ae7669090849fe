//! Structural diff between two tree snapshots.
//!
//! Paths are joined through a hash map, so the cost is linear in the
//! combined number of entries. A path present only in `to` is added, only
//! in `from` is removed, in both with different ids is modified. Paths in
//! both with equal ids are unchanged unless their entry attributes differ,
//! which is reported separately and does not make the diff non-empty.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use arbor_store::AssetId;
use arbor_tree::{TreeEntry, TreeIndex, TreeResult};
use tracing::debug;

/// Classification of a changed path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeState {
    Added,
    Removed,
    Modified,
}

impl ChangeState {
    /// One-letter status code.
    pub fn symbol(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Removed => 'D',
            Self::Modified => 'M',
        }
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Both sides of a modified path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modification {
    pub from: TreeEntry,
    pub to: TreeEntry,
}

/// A single entry attribute that differs between the two sides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// The result of comparing two trees.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexesDiff {
    pub added: BTreeMap<String, TreeEntry>,
    pub removed: BTreeMap<String, TreeEntry>,
    pub modified: BTreeMap<String, Modification>,
    /// Attribute-only changes of paths with equal content.
    pub attributes_changed: BTreeMap<String, Vec<AttributeChange>>,
}

impl IndexesDiff {
    /// Compare `from` against `to`.
    pub fn diff(from: &TreeIndex, to: &TreeIndex) -> Self {
        let mut remaining: HashMap<&str, &TreeEntry> = from
            .entries()
            .map(|(path, entry)| (path.as_str(), entry))
            .collect();

        let mut diff = Self::default();
        for (path, to_entry) in to.entries() {
            match remaining.remove(path.as_str()) {
                None => {
                    diff.added.insert(path.clone(), to_entry.clone());
                }
                Some(from_entry) if from_entry.id != to_entry.id => {
                    diff.modified.insert(
                        path.clone(),
                        Modification {
                            from: from_entry.clone(),
                            to: to_entry.clone(),
                        },
                    );
                }
                Some(from_entry) => {
                    let changes = attribute_changes(&from_entry.attributes, &to_entry.attributes);
                    if !changes.is_empty() {
                        diff.attributes_changed.insert(path.clone(), changes);
                    }
                }
            }
        }
        diff.removed = remaining
            .into_iter()
            .map(|(path, entry)| (path.to_string(), entry.clone()))
            .collect();

        debug!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            modified = diff.modified.len(),
            "computed indexes diff"
        );
        diff
    }

    /// Returns `true` if no path was added, removed or modified.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of added, removed and modified paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// All changed paths in path order.
    pub fn changes(&self) -> Vec<(&str, ChangeState)> {
        let mut changes: Vec<(&str, ChangeState)> = self
            .added
            .keys()
            .map(|p| (p.as_str(), ChangeState::Added))
            .chain(self.removed.keys().map(|p| (p.as_str(), ChangeState::Removed)))
            .chain(self.modified.keys().map(|p| (p.as_str(), ChangeState::Modified)))
            .collect();
        changes.sort_by(|a, b| a.0.cmp(b.0));
        changes
    }

    /// The `(old, new)` ids of a changed path; the missing side is empty.
    pub fn ids(&self, path: &str) -> Option<(AssetId, AssetId)> {
        if let Some(entry) = self.added.get(path) {
            return Some((AssetId::empty(), entry.id.clone()));
        }
        if let Some(entry) = self.removed.get(path) {
            return Some((entry.id.clone(), AssetId::empty()));
        }
        self.modified
            .get(path)
            .map(|m| (m.from.id.clone(), m.to.id.clone()))
    }

    /// Apply this diff to `tree`, turning the `from` side into the `to` side.
    pub fn apply_to(&self, tree: &mut TreeIndex) -> TreeResult<()> {
        for path in self.removed.keys() {
            tree.remove(path);
        }
        for (path, entry) in &self.added {
            tree.put_entry(path, entry.clone())?;
        }
        for (path, modification) in &self.modified {
            tree.put_entry(path, modification.to.clone())?;
        }
        for (path, changes) in &self.attributes_changed {
            let Some(entry) = tree.get(path) else {
                continue;
            };
            let mut attributes = entry.attributes.clone();
            for change in changes {
                match &change.to {
                    Some(value) => attributes.insert(change.name.clone(), value.clone()),
                    None => attributes.remove(&change.name),
                };
            }
            tree.set_entry_attributes(path, attributes);
        }
        Ok(())
    }
}

fn attribute_changes(
    from: &BTreeMap<String, String>,
    to: &BTreeMap<String, String>,
) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    for (name, old) in from {
        match to.get(name) {
            Some(new) if new == old => {}
            new => changes.push(AttributeChange {
                name: name.clone(),
                from: Some(old.clone()),
                to: new.cloned(),
            }),
        }
    }
    for (name, new) in to {
        if !from.contains_key(name) {
            changes.push(AttributeChange {
                name: name.clone(),
                from: None,
                to: Some(new.clone()),
            });
        }
    }
    changes.sort_by(|a, b| a.name.cmp(&b.name));
    changes
}
