//! Line-level diff of entry contents.
//!
//! Uses `similar` (Myers) to group changes into hunks with three lines of
//! context. Content that is not UTF-8 on either side is reported as binary.

use std::fmt::Write as _;

use arbor_store::Asset;
use similar::{ChangeTag, TextDiff};

use crate::error::DiffResult;

const CONTEXT_LINES: usize = 3;

/// The result of diffing two contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlobDiff {
    Text(Vec<DiffHunk>),
    Binary { old_len: usize, new_len: usize },
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// 1-based start line in the old content.
    pub old_start: usize,
    pub old_count: usize,
    /// 1-based start line in the new content.
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl BlobDiff {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(hunks) if hunks.is_empty())
    }

    pub fn hunks(&self) -> &[DiffHunk] {
        match self {
            Self::Text(hunks) => hunks,
            Self::Binary { .. } => &[],
        }
    }

    pub fn additions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Added(_)))
    }

    pub fn deletions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks()
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| pred(l))
            .count()
    }

    /// Render in unified format, without file headers.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Binary { old_len, new_len } => {
                let _ = writeln!(out, "binary content differs ({old_len} -> {new_len} bytes)");
            }
            Self::Text(hunks) => {
                for hunk in hunks {
                    let _ = writeln!(
                        out,
                        "@@ -{},{} +{},{} @@",
                        hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
                    );
                    for line in &hunk.lines {
                        let _ = match line {
                            DiffLine::Context(text) => writeln!(out, " {text}"),
                            DiffLine::Added(text) => writeln!(out, "+{text}"),
                            DiffLine::Removed(text) => writeln!(out, "-{text}"),
                        };
                    }
                }
            }
        }
        out
    }
}

/// Diff two byte slices.
pub fn diff_blobs(old: &[u8], new: &[u8]) -> BlobDiff {
    let (Ok(old_text), Ok(new_text)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return BlobDiff::Binary {
            old_len: old.len(),
            new_len: new.len(),
        };
    };
    if old_text == new_text {
        return BlobDiff::Text(Vec::new());
    }

    let text_diff = TextDiff::from_lines(old_text, new_text);
    let hunks = text_diff
        .grouped_ops(CONTEXT_LINES)
        .iter()
        .map(|group| {
            let mut hunk = DiffHunk {
                old_start: group.first().map_or(0, |op| op.old_range().start) + 1,
                old_count: 0,
                new_start: group.first().map_or(0, |op| op.new_range().start) + 1,
                new_count: 0,
                lines: Vec::new(),
            };
            for op in group {
                for change in text_diff.iter_changes(op) {
                    let text = change.value().trim_end_matches('\n').to_string();
                    match change.tag() {
                        ChangeTag::Equal => {
                            hunk.old_count += 1;
                            hunk.new_count += 1;
                            hunk.lines.push(DiffLine::Context(text));
                        }
                        ChangeTag::Delete => {
                            hunk.old_count += 1;
                            hunk.lines.push(DiffLine::Removed(text));
                        }
                        ChangeTag::Insert => {
                            hunk.new_count += 1;
                            hunk.lines.push(DiffLine::Added(text));
                        }
                    }
                }
            }
            hunk
        })
        .collect();
    BlobDiff::Text(hunks)
}

/// Read both assets and diff their contents.
pub fn diff_assets(old: &Asset, new: &Asset) -> DiffResult<BlobDiff> {
    Ok(diff_blobs(&old.read_to_vec()?, &new.read_to_vec()?))
}
