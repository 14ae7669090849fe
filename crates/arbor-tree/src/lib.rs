//! Tree snapshots for arbor.
//!
//! A [`TreeIndex`] maps relative paths to content-addressed assets and is
//! itself content-addressed: its canonical serialization is stored like any
//! other object and its id is the tree's identity.
//!
//! # Key Types
//!
//! - [`TreeIndex`] -- path-sorted snapshot with tree and entry attributes
//! - [`Indexer`] -- builds a snapshot from a source ([`FsIndexer`], [`ZipIndexer`])
//! - [`AssetsExtractor`] -- materializes a snapshot into a directory
//! - [`TreeHistory`] -- walks parent links back to the initial tree

pub mod attributes;
pub mod error;
pub mod extractor;
pub mod history;
pub mod indexer;
pub mod tree_index;

pub use attributes::{AssetKind, EntryAttributes};
pub use error::{TreeError, TreeResult};
pub use extractor::{AssetsExtractor, ExtractPolicy};
pub use history::TreeHistory;
pub use indexer::{FsIndexer, Indexer, ZipIndexer};
pub use tree_index::{TreeEntry, TreeIndex};
