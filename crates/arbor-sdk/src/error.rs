use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("reference already exists: {0}")]
    ReferenceAlreadyExists(String),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("there are non commited changes")]
    NonCommitedChanges,

    #[error("attempt to destroy current tree: {0}")]
    AttemptToDestroyCurrentTree(String),

    #[error("not a working copy (or any of the parent directories): {0}")]
    AttachToNonWorkingCopy(String),

    #[error("working copy already initialized at {0}")]
    InitExistingWorkingCopy(String),

    #[error("invalid working copy: {0}")]
    InvalidWorkingCopy(String),

    #[error("no such reference: {0}")]
    NoSuchReference(String),

    #[error("unsupported config key: {0}")]
    UnsupportedConfig(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidConfigValue { key: String, reason: String },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("working copy is locked by another process: {0}")]
    Locked(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] arbor_store::StoreError),

    #[error("tree error: {0}")]
    Tree(#[from] arbor_tree::TreeError),

    #[error("diff error: {0}")]
    Diff(#[from] arbor_diff::DiffError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
