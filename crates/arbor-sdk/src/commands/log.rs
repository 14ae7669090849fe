use arbor_store::AssetId;
use arbor_tree::TreeHistory;

use crate::commands::parse_range;
use crate::error::{SdkError, SdkResult};
use crate::working_copy::WorkingCopy;

/// One commit of [`Log`] output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub id: AssetId,
    pub author: String,
    pub email: String,
    pub message: String,
}

/// Walk the history of a reference, newest first.
///
/// Starts at the `to` side of the range (the active reference by default)
/// and stops before the `from` tree or the initial empty tree.
pub struct Log<'a> {
    wc: &'a WorkingCopy,
    range: Option<String>,
}

impl<'a> Log<'a> {
    pub fn new(wc: &'a WorkingCopy, range: Option<String>) -> Self {
        Self { wc, range }
    }

    pub fn run(self) -> SdkResult<Vec<LogEntry>> {
        let (from, to) = match self.range.as_deref() {
            Some(range) => parse_range(range)?,
            None => (None, None),
        };
        let stop = match from {
            Some(name) => Some(self.resolve(&name)?),
            None => None,
        };
        let start = match to {
            Some(name) => self.resolve(&name)?,
            None => self.wc.storage().resolve(self.wc.active_reference_name())?,
        };

        let mut entries = Vec::new();
        for step in TreeHistory::new(self.wc.storage(), start) {
            let (id, tree) = step?;
            if stop.as_ref() == Some(&id) || tree.is_initial() {
                break;
            }
            entries.push(LogEntry {
                author: tree.author().unwrap_or_default().to_string(),
                email: tree.email().unwrap_or_default().to_string(),
                message: tree.message().unwrap_or_default().to_string(),
                id,
            });
        }
        Ok(entries)
    }

    fn resolve(&self, name: &str) -> SdkResult<AssetId> {
        let id = self.wc.storage().resolve(name)?;
        if id.is_empty() {
            return Err(SdkError::NoSuchReference(name.to_string()));
        }
        Ok(id)
    }
}
