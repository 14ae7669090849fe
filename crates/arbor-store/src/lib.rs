//! Content-addressed object storage for arbor.
//!
//! This crate implements the object store behind every working copy: an
//! append-only table of immutable byte objects keyed by [`AssetId`], plus a
//! small mutable table binding reference names to ids.
//!
//! # Assets
//!
//! An [`Asset`] is a handle to content that lives somewhere else: inside a
//! store, in memory, in a file, in an unread stream, or inside a zip
//! archive. Assets are cheap to clone and read lazily.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectsStorage`] trait:
//!
//! - [`LocalDirectoryStorage`] -- `objects/<id>` files plus a `references`
//!   property file
//! - [`InMemoryObjectsStorage`] -- map-based store for tests and staging
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; `put` of a known id is a no-op.
//! 2. Write-then-link: children, then the tree object, then the reference.
//! 3. A reference may only point at an id already present in the store.
//! 4. Misses on `get`/`resolve` return sentinels, not errors.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod asset;
pub mod error;
pub mod local;
pub mod memory;
pub mod names;
pub mod properties;
pub mod traits;

pub use arbor_types::AssetId;
pub use asset::{Asset, AssetRecord, AssetSource};
pub use error::{StoreError, StoreResult};
pub use local::LocalDirectoryStorage;
pub use memory::InMemoryObjectsStorage;
pub use names::validate_reference_name;
pub use properties::Properties;
pub use traits::ObjectsStorage;
