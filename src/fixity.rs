/*!
 * Streaming digest computation shared by bag assembly and transfer
 */

use crate::error::{Error, Result};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Digest algorithms supported for manifests and archive checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    /// The lowercase name used in manifest file names (`manifest-sha256.txt`)
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Sha256
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            other => Err(Error::config(format!(
                "unsupported digest algorithm: {}",
                other
            ))),
        }
    }
}

/// Streaming hasher that calculates a digest incrementally
pub struct StreamingDigest {
    state: DigestState,
}

enum DigestState {
    Md5(Md5),
    Sha256(Sha256),
}

impl StreamingDigest {
    /// Create a new streaming digest for the given algorithm
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        let state = match algorithm {
            DigestAlgorithm::Md5 => DigestState::Md5(Md5::new()),
            DigestAlgorithm::Sha256 => DigestState::Sha256(Sha256::new()),
        };
        Self { state }
    }

    /// Update the digest with new data
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            DigestState::Md5(h) => h.update(data),
            DigestState::Sha256(h) => h.update(data),
        }
    }

    /// Finalize and return the raw digest bytes
    pub fn finalize(self) -> Vec<u8> {
        match self.state {
            DigestState::Md5(h) => h.finalize().to_vec(),
            DigestState::Sha256(h) => h.finalize().to_vec(),
        }
    }

    /// Finalize and return the lowercase hex digest
    pub fn finalize_hex(self) -> String {
        hex::encode(self.finalize())
    }
}

/// A writer that tees every byte through a digest accumulator on its way
/// to the underlying writer. Used to checksum a streamed archive without
/// a second full read pass.
pub struct HashingWriter<W: Write> {
    inner: W,
    digest: StreamingDigest,
    bytes_written: u64,
}

impl<W: Write> HashingWriter<W> {
    /// Wrap a writer, digesting everything written through it
    pub fn new(inner: W, algorithm: DigestAlgorithm) -> Self {
        Self {
            inner,
            digest: StreamingDigest::new(algorithm),
            bytes_written: 0,
        }
    }

    /// Flush and unwrap, returning the inner writer, the raw digest bytes
    /// and the byte count that passed through
    pub fn finish(mut self) -> io::Result<(W, Vec<u8>, u64)> {
        self.inner.flush()?;
        Ok((self.inner, self.digest.finalize(), self.bytes_written))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Calculate the hex digest of a file by streaming it through a 64 KiB buffer
pub fn hash_file(path: &Path, algorithm: DigestAlgorithm) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut digest = StreamingDigest::new(algorithm);
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        digest.update(&buffer[..n]);
    }

    Ok(digest.finalize_hex())
}
