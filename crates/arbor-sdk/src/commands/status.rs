use arbor_diff::{AttributeChange, ChangeState, IndexesDiff};

use crate::error::SdkResult;
use crate::working_copy::WorkingCopy;

/// Result of [`Status::run`].
#[derive(Debug)]
pub struct StatusReport {
    pub reference: String,
    pub diff: IndexesDiff,
}

impl StatusReport {
    /// No path added, removed or modified. Attribute-only changes do not
    /// make a working copy dirty.
    pub fn is_clean(&self) -> bool {
        self.diff.is_empty()
    }

    /// `clean` or `dirty`.
    pub fn summary(&self) -> &'static str {
        if self.is_clean() {
            "clean"
        } else {
            "dirty"
        }
    }

    /// One `<state> <path>` line per changed path in path order. Paths with
    /// attribute changes only get a blank state, followed by one indented
    /// line per changed attribute.
    pub fn lines(&self) -> Vec<String> {
        let mut rows: Vec<(&str, Option<ChangeState>)> = self
            .diff
            .changes()
            .into_iter()
            .map(|(path, state)| (path, Some(state)))
            .chain(self.diff.attributes_changed.keys().map(|p| (p.as_str(), None)))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));

        let mut lines = Vec::new();
        for (path, state) in rows {
            let symbol = state.map_or(' ', |s| s.symbol());
            lines.push(format!("{symbol} {path}"));
            for change in self.diff.attributes_changed.get(path).into_iter().flatten() {
                lines.push(attribute_line(change));
            }
        }
        lines
    }
}

fn attribute_line(change: &AttributeChange) -> String {
    let state = match (&change.from, &change.to) {
        (None, _) => ChangeState::Added,
        (_, None) => ChangeState::Removed,
        _ => ChangeState::Modified,
    };
    format!(
        "\t{} attribute: {} {} -> {}",
        state.symbol(),
        change.name,
        change.from.as_deref().unwrap_or("-"),
        change.to.as_deref().unwrap_or("-"),
    )
}

/// Report uncommitted changes of the working copy.
pub struct Status<'a> {
    wc: &'a WorkingCopy,
}

impl<'a> Status<'a> {
    pub fn new(wc: &'a WorkingCopy) -> Self {
        Self { wc }
    }

    pub fn run(self) -> SdkResult<StatusReport> {
        Ok(StatusReport {
            reference: self.wc.active_reference_name().to_string(),
            diff: self.wc.uncommitted_changes()?,
        })
    }
}
