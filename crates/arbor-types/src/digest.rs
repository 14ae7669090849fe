//! Streaming SHA-256 adapters.
//!
//! Content is hashed while it is being copied so every byte is read exactly
//! once: storage uses [`DigestReader`] to verify what it writes, extraction
//! uses [`DigestWriter`] to verify what it materializes.

use std::io::{self, Read, Write};

use sha2::{Digest, Sha256};

use crate::id::AssetId;

/// `Read` adapter that digests every byte passing through it.
pub struct DigestReader<R> {
    inner: R,
    hasher: Sha256,
    consumed: u64,
}

impl<R: Read> DigestReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            consumed: 0,
        }
    }

    /// Number of bytes read so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// The id of everything read so far.
    pub fn finish(self) -> AssetId {
        AssetId::from_digest(&self.hasher.finalize())
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.consumed += n as u64;
        Ok(n)
    }
}

/// `Write` adapter that digests every byte written through it.
pub struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Flush and return the inner writer with the id of everything written.
    pub fn finish(mut self) -> io::Result<(W, AssetId)> {
        self.inner.flush()?;
        Ok((self.inner, AssetId::from_digest(&self.hasher.finalize())))
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
