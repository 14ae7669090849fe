use arbor_store::{validate_reference_name, AssetId};
use arbor_tree::TreeIndex;
use tracing::info;

use crate::error::{SdkError, SdkResult};
use crate::working_copy::WorkingCopy;

/// Create a new reference bound to an empty tree and make it active.
///
/// The working directory is left as it is.
pub struct Create<'a> {
    wc: &'a mut WorkingCopy,
    reference: String,
}

impl<'a> Create<'a> {
    pub fn new(wc: &'a mut WorkingCopy, reference: impl Into<String>) -> Self {
        Self {
            wc,
            reference: reference.into(),
        }
    }

    pub fn run(self) -> SdkResult<AssetId> {
        validate_reference_name(&self.reference)?;
        let storage = self.wc.storage().clone();
        if !storage.resolve(&self.reference)?.is_empty() {
            return Err(SdkError::ReferenceAlreadyExists(self.reference));
        }

        let tree = TreeIndex::initial_for(&self.reference);
        let id = tree.id()?;
        storage.put_all(&tree.all_assets()?)?;
        storage.create_reference(&self.reference, &id)?;
        self.wc.rebind(&self.reference, tree)?;

        info!(reference = %self.reference, %id, "created reference");
        Ok(id)
    }
}
