//! Diff engine for arbor.
//!
//! Compares two [`TreeIndex`](arbor_tree::TreeIndex) snapshots path by path
//! and, for modified text entries, line by line.
//!
//! # Key Types
//!
//! - [`IndexesDiff`] / [`ChangeState`] -- added/removed/modified path partitions
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- line-level content diff

pub mod blob_diff;
pub mod error;
pub mod indexes_diff;

pub use blob_diff::{diff_assets, diff_blobs, BlobDiff, DiffHunk, DiffLine};
pub use error::{DiffError, DiffResult};
pub use indexes_diff::{AttributeChange, ChangeState, IndexesDiff, Modification};
