//! Terminal record of an assembled (and possibly archived) bag

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::{Path, PathBuf};

/// Produced once at the end of assembly or packaging; read-only afterward.
///
/// `file` is either the bag directory or, after archiving, the tar file.
/// The payload manifest text is retained verbatim so audit logs never need
/// to re-read the filesystem.
#[derive(Debug, Clone)]
pub struct BagSummary {
    file: PathBuf,
    checksum: Option<Vec<u8>>,
    manifest_text: String,
    payload_bytes: u64,
}

impl BagSummary {
    pub fn new(
        file: PathBuf,
        checksum: Option<Vec<u8>>,
        manifest_text: String,
        payload_bytes: u64,
    ) -> Self {
        Self {
            file,
            checksum,
            manifest_text,
            payload_bytes,
        }
    }

    /// The bag directory, or the tar file once archived
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The archive digest, absent for an unarchived bag directory
    pub fn checksum(&self) -> Option<&[u8]> {
        self.checksum.as_deref()
    }

    /// The archive digest as lowercase hex
    pub fn hex_checksum(&self) -> Option<String> {
        self.checksum.as_ref().map(hex::encode)
    }

    /// The archive digest base64-encoded (the Content-MD5 wire form)
    pub fn base64_checksum(&self) -> Option<String> {
        self.checksum.as_ref().map(|c| BASE64.encode(c))
    }

    /// The payload manifest text exactly as written into the bag
    pub fn manifest_text(&self) -> &str {
        &self.manifest_text
    }

    /// Cumulative size of all payload files
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }
}
