use arbor_types::AssetId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(AssetId),

    /// Bytes copied into the store did not hash to the asset's id.
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: AssetId, computed: AssetId },

    /// The asset carries an identity but no readable source.
    #[error("asset {0:?} is not readable")]
    NonReadableAsset(AssetId),

    /// Attempted to store or reference the empty sentinel id.
    #[error("cannot store the empty asset id")]
    EmptyAssetId,

    /// `create_reference` on a name that already resolves.
    #[error("reference already exists: {0}")]
    ReferenceAlreadyExists(String),

    /// A reference would point at an object the store does not hold.
    #[error("reference {name} would point at missing object {id}")]
    DanglingReference { name: String, id: AssetId },

    /// The reference name cannot be stored in the references table.
    #[error("invalid reference name {name:?}: {reason}")]
    InvalidReferenceName { name: String, reason: String },

    /// The references table contains an unparseable line.
    #[error("malformed references file at line {line}: {reason}")]
    MalformedReferences { line: usize, reason: String },

    /// Zip archive access failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// A lock guarding in-memory state was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
