use std::fmt;

use arbor_store::AssetId;

use crate::error::SdkResult;
use crate::working_copy::WorkingCopy;

/// One line of [`Tree`] output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeListing {
    pub name: String,
    pub id: AssetId,
    /// `true` for the active reference.
    pub current: bool,
}

impl TreeListing {
    /// `name`, or `name:id` when `verbose`. With `marked`, the active
    /// reference is prefixed by `*` and the others by a space.
    pub fn render(&self, verbose: bool, marked: bool) -> String {
        let mut line = String::new();
        if marked {
            line.push(if self.current { '*' } else { ' ' });
        }
        line.push_str(&self.name);
        if verbose {
            line.push(':');
            line.push_str(self.id.as_str());
        }
        line
    }
}

impl fmt::Display for TreeListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false, false))
    }
}

/// Enumerate the active reference, or every reference.
pub struct Tree<'a> {
    wc: &'a WorkingCopy,
    show_all: bool,
}

impl<'a> Tree<'a> {
    pub fn new(wc: &'a WorkingCopy) -> Self {
        Self {
            wc,
            show_all: false,
        }
    }

    pub fn show_all(mut self, show_all: bool) -> Self {
        self.show_all = show_all;
        self
    }

    /// Listings sorted by name.
    pub fn run(self) -> SdkResult<Vec<TreeListing>> {
        let active = self.wc.active_reference_name();
        let storage = self.wc.storage();
        if !self.show_all {
            return Ok(vec![TreeListing {
                name: active.to_string(),
                id: storage.resolve(active)?,
                current: true,
            }]);
        }

        let mut listings: Vec<TreeListing> = storage
            .list_references()?
            .into_iter()
            .map(|(name, id)| TreeListing {
                current: name == active,
                name,
                id,
            })
            .collect();
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Create;
    use crate::commands::testing::fixture;

    #[test]
    fn active_reference_only() {
        let (_dir, wc) = fixture();
        let listings = Tree::new(&wc).run().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "main");
        assert!(listings[0].current);
        assert_eq!(listings[0].id, wc.committed_tree().id().unwrap());
        assert_eq!(listings[0].render(false, false), "main");
        assert_eq!(
            listings[0].render(true, false),
            format!("main:{}", listings[0].id)
        );
    }

    #[test]
    fn all_references_sorted_and_marked() {
        let (_dir, mut wc) = fixture();
        Create::new(&mut wc, "zeta").run().unwrap();
        Create::new(&mut wc, "alpha").run().unwrap();

        let listings = Tree::new(&wc).show_all(true).run().unwrap();
        let rendered: Vec<String> = listings.iter().map(|l| l.render(false, true)).collect();
        assert_eq!(rendered, vec!["*alpha", " main", " zeta"]);
    }
}
