use tracing::info;

use crate::error::SdkResult;
use crate::working_copy::WorkingCopy;

/// Persist one configuration value of the working copy.
pub struct SetConfig<'a> {
    wc: &'a mut WorkingCopy,
    key: String,
    value: String,
}

impl<'a> SetConfig<'a> {
    pub fn new(wc: &'a mut WorkingCopy, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            wc,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn run(self) -> SdkResult<()> {
        self.wc.set_config(&self.key, &self.value)?;
        info!(key = %self.key, "configuration updated");
        Ok(())
    }
}
