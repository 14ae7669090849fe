use tracing::info;

use crate::error::{SdkError, SdkResult};
use crate::working_copy::WorkingCopy;

/// Remove a reference. Its objects stay in storage.
pub struct Destroy<'a> {
    wc: &'a WorkingCopy,
    reference: String,
}

impl<'a> Destroy<'a> {
    pub fn new(wc: &'a WorkingCopy, reference: impl Into<String>) -> Self {
        Self {
            wc,
            reference: reference.into(),
        }
    }

    pub fn run(self) -> SdkResult<()> {
        if self.reference == self.wc.active_reference_name() {
            return Err(SdkError::AttemptToDestroyCurrentTree(self.reference));
        }
        if !self.wc.storage().destroy_reference(&self.reference)? {
            return Err(SdkError::NoSuchReference(self.reference));
        }
        info!(reference = %self.reference, "destroyed reference");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::commands::{Checkout, Create};

    #[test]
    fn active_reference_cannot_be_destroyed() {
        let (_dir, wc) = fixture();
        assert!(matches!(
            Destroy::new(&wc, "main").run(),
            Err(SdkError::AttemptToDestroyCurrentTree(name)) if name == "main"
        ));
        assert!(!wc.storage().resolve("main").unwrap().is_empty());
    }

    #[test]
    fn other_reference_is_removed_but_objects_remain() {
        let (_dir, mut wc) = fixture();
        let id = Create::new(&mut wc, "scratch").run().unwrap();
        Checkout::new(&mut wc, "main").run().unwrap();

        Destroy::new(&wc, "scratch").run().unwrap();
        let names: Vec<String> = wc
            .storage()
            .list_references()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["main".to_string()]);
        assert!(wc.storage().contains(&id));
    }

    #[test]
    fn unknown_reference_is_reported() {
        let (_dir, wc) = fixture();
        assert!(matches!(
            Destroy::new(&wc, "ghost").run(),
            Err(SdkError::NoSuchReference(_))
        ));
    }
}
