//! Error types for the tree crate.

use arbor_store::{AssetId, StoreError};

/// Errors that can occur while building, loading or extracting trees.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The reference does not resolve to any tree.
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    /// A resolved id has no object in the store.
    #[error("tree object not found in store: {0}")]
    ObjectNotFound(AssetId),

    /// A stored tree object could not be parsed.
    #[error("malformed tree {id}: {reason}")]
    Malformed { id: AssetId, reason: String },

    /// An asset with the empty id was put into a tree.
    #[error("attempt to add empty asset into tree at {0}")]
    EmptyAsset(String),

    /// A path is not a valid relative tree path.
    #[error("invalid tree path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// An entry attribute has an unknown or unparsable value.
    #[error("invalid attribute {name}={value:?} at {path}")]
    InvalidAttribute {
        path: String,
        name: String,
        value: String,
    },

    /// Materialized bytes did not hash to the recorded id.
    #[error("corrupted data at {path}: expected {expected}, got {actual}")]
    CorruptedData {
        path: String,
        expected: AssetId,
        actual: AssetId,
    },

    /// Extraction target is missing or not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Zip archive could not be read.
    #[error("archive error: {0}")]
    Archive(String),

    /// Tree serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
