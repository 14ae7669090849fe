use std::sync::Arc;

use arbor_store::{AssetId, ObjectsStorage};

use crate::error::TreeResult;
use crate::tree_index::TreeIndex;

/// Iterator over a tree and its ancestors, newest first.
///
/// Follows `parent` links until a tree without a parent. A missing or
/// malformed ancestor is yielded as an error and ends the walk.
pub struct TreeHistory<'a> {
    storage: &'a Arc<dyn ObjectsStorage>,
    next: AssetId,
}

impl<'a> TreeHistory<'a> {
    pub fn new(storage: &'a Arc<dyn ObjectsStorage>, start: AssetId) -> Self {
        Self {
            storage,
            next: start,
        }
    }
}

impl Iterator for TreeHistory<'_> {
    type Item = TreeResult<(AssetId, TreeIndex)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_empty() {
            return None;
        }
        let id = std::mem::take(&mut self.next);
        match TreeIndex::from_id(self.storage, &id) {
            Ok(tree) => {
                self.next = tree.parent().clone();
                Some(Ok((id, tree)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use crate::tree_index::MESSAGE;
    use arbor_store::{Asset, InMemoryObjectsStorage};
    use std::collections::BTreeMap;

    fn commit(storage: &Arc<dyn ObjectsStorage>, parent: &AssetId, message: &str) -> AssetId {
        let mut tree = if parent.is_empty() {
            TreeIndex::initial_for("main")
        } else {
            TreeIndex::from_id(storage, parent).unwrap()
        };
        if !parent.is_empty() {
            tree.remove_attribute(crate::tree_index::INITIAL_FOR);
            tree.set_parent(parent.clone());
        }
        tree.set_attribute(MESSAGE, message);
        tree.put(message, Asset::for_string(message), BTreeMap::new())
            .unwrap();
        storage.put_all(&tree.all_assets().unwrap()).unwrap();
        tree.id().unwrap()
    }

    #[test]
    fn walks_back_to_the_root() {
        let storage: Arc<dyn ObjectsStorage> = Arc::new(InMemoryObjectsStorage::new());
        let first = commit(&storage, &AssetId::empty(), "first");
        let second = commit(&storage, &first, "second");
        let third = commit(&storage, &second, "third");

        let messages: Vec<String> = TreeHistory::new(&storage, third)
            .map(|r| r.unwrap().1.message().unwrap().to_string())
            .collect();
        assert_eq!(messages, vec!["third", "second", "first"]);
    }

    #[test]
    fn missing_ancestor_is_an_error() {
        let storage: Arc<dyn ObjectsStorage> = Arc::new(InMemoryObjectsStorage::new());
        let mut tree = TreeIndex::new();
        tree.set_parent(AssetId::for_bytes(b"lost"));
        storage.put_all(&tree.all_assets().unwrap()).unwrap();

        let mut history = TreeHistory::new(&storage, tree.id().unwrap());
        assert!(history.next().unwrap().is_ok());
        assert!(matches!(
            history.next(),
            Some(Err(TreeError::ObjectNotFound(_)))
        ));
        assert!(history.next().is_none());
    }
}
