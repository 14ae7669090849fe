//! High-level SDK for arbor.
//!
//! Binds a directory to an object storage and an active reference
//! ([`WorkingCopy`]) and implements the user-visible commands on top of it.
//!
//! ```no_run
//! use arbor_sdk::{commands::Commit, WorkingCopy};
//!
//! let mut wc = WorkingCopy::attach(std::path::Path::new("."))?;
//! let id = Commit::new(&mut wc, "first").run()?;
//! println!("{id}");
//! # Ok::<(), arbor_sdk::SdkError>(())
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod lock;
pub mod working_copy;

pub use config::Config;
pub use error::{SdkError, SdkResult};
pub use working_copy::{WorkingCopy, WorkingCopyState, METADATA_DIR};

pub use arbor_diff::{BlobDiff, ChangeState, IndexesDiff};
pub use arbor_store::{AssetId, ObjectsStorage};
pub use arbor_tree::{ExtractPolicy, TreeIndex};
