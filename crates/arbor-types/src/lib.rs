//! Foundation types for arbor.
//!
//! Every stored object, tree entry, and reference target in arbor is named
//! by an [`AssetId`]: the lowercase hex SHA-256 digest of its bytes.
//!
//! # Key Types
//!
//! - [`AssetId`] -- Content-hash identifier with an empty sentinel
//! - [`DigestReader`] -- `Read` adapter that digests bytes as they stream past

pub mod digest;
pub mod error;
pub mod id;

pub use digest::{DigestReader, DigestWriter};
pub use error::TypeError;
pub use id::{AssetId, DIGEST_HEX_LEN};
