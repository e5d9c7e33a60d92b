//! Payload files awaiting placement into a bag's `data/` tree

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A payload file supplied by the caller, paired with its destination
/// path relative to the bag's `data/` directory.
///
/// The source file remains owned by the caller until the assembler's
/// cleanup hook signals that it is no longer needed.
#[derive(Debug, Clone)]
pub struct PendingPayloadFile {
    source: PathBuf,
    path_within_payload: String,
}

impl PendingPayloadFile {
    /// Payload file placed directly under `data/` using its own file name
    pub fn new<P: Into<PathBuf>>(source: P) -> Self {
        let source = source.into();
        let path_within_payload = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source,
            path_within_payload,
        }
    }

    /// Payload file placed at an explicit path relative to `data/`
    pub fn with_path<P: Into<PathBuf>, S: Into<String>>(source: P, path: S) -> Self {
        Self {
            source: source.into(),
            path_within_payload: path.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn path_within_payload(&self) -> &str {
        &self.path_within_payload
    }

    /// Place this file under `data_dir`, preferring a same-filesystem hard
    /// link and falling back transparently to a byte copy when linking
    /// fails (typically across a filesystem boundary). Returns the number
    /// of payload bytes placed.
    pub(crate) fn place_into(&self, data_dir: &Path) -> Result<u64> {
        let size = fs::metadata(&self.source)?.len();
        let destination = data_dir.join(&self.path_within_payload);

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        if let Err(link_err) = fs::hard_link(&self.source, &destination) {
            debug!(
                source = %self.source.display(),
                error = %link_err,
                "hard link failed, copying payload file instead"
            );
            fs::copy(&self.source, &destination)?;
        }

        Ok(size)
    }
}
