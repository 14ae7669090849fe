use std::fmt;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::digest::DigestReader;
use crate::error::TypeError;

/// Length of a rendered digest: 32 bytes as lowercase hex.
pub const DIGEST_HEX_LEN: usize = 64;

/// Content-addressed identifier for any asset.
///
/// An `AssetId` is the SHA-256 digest of an asset's bytes rendered as a
/// 64-character lowercase hex string. Identical content always produces the
/// same `AssetId`, so stored objects deduplicate naturally. Ordering is
/// lexicographic on the hex string, which is the order used for canonical
/// serialization.
///
/// The empty string is reserved as a sentinel for "no asset" (an unbound
/// reference, a missing parent, a storage miss).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Compute an id by consuming `reader` to its end exactly once.
    pub fn create_for<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut digesting = DigestReader::new(reader);
        io::copy(&mut digesting, &mut io::sink())?;
        Ok(digesting.finish())
    }

    /// Compute an id for an in-memory byte slice.
    pub fn for_bytes(data: &[u8]) -> Self {
        Self::from_digest(&Sha256::digest(data))
    }

    /// Wrap an already-known digest or sentinel string without validation.
    ///
    /// Used when reading ids back from storage. Use [`AssetId::parse`] for
    /// untrusted input.
    pub fn create(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse and validate a hex digest.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() * 2 != DIGEST_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: DIGEST_HEX_LEN / 2,
                actual: bytes.len(),
            });
        }
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(TypeError::NotLowercase(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// The empty sentinel. Represents "no asset".
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns `true` if this is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The hex representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for a well-formed 64-character lowercase hex digest.
    /// The sentinel and ids wrapped from arbitrary text are not digests.
    pub fn is_digest(&self) -> bool {
        self.0.len() == DIGEST_HEX_LEN
            && self.0.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Short hex representation (first 8 characters).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }

    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "AssetId(<empty>)")
        } else {
            write!(f, "AssetId({})", self.short())
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
