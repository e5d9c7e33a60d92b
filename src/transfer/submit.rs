//! Bag submission: overwrite policy, single-shot vs. multipart upload,
//! and guaranteed multipart cleanup on failure.

use crate::bag::BagSummary;
use crate::error::Result;
use crate::transfer::store::ObjectStore;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{error, info, warn};

/// Default single-shot/multipart threshold and part size: 5 GiB
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Terminal record of one transfer attempt; never mutated after return
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transferred: bool,
    pub local_digest: Option<String>,
    pub remote_digest: Option<String>,
    pub bytes: u64,
    pub existing_object_deleted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub message: Option<String>,
}

impl TransferOutcome {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Uploads archived bags to an object store, choosing single-shot or
/// multipart by size threshold and honoring the overwrite policy.
pub struct BagSubmitter<S: ObjectStore> {
    store: S,
    chunk_size: u64,
}

impl<S: ObjectStore> BagSubmitter<S> {
    pub fn new(store: S) -> Self {
        Self::with_chunk_size(store, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(store: S, chunk_size: u64) -> Self {
        Self { store, chunk_size }
    }

    /// Transfer the bag behind `summary`, keyed by its file's base name.
    ///
    /// Transfer is best-effort per bag: every failure is recorded into the
    /// outcome rather than raised, so callers iterating many bags are never
    /// aborted by one bad transfer.
    pub fn transfer(&self, summary: &BagSummary, overwrite: bool) -> TransferOutcome {
        let started_at = Utc::now();
        let local_digest = summary.hex_checksum();

        let key = match summary.file().file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                return Self::failed(
                    started_at,
                    local_digest,
                    0,
                    false,
                    "bag file has no name".to_string(),
                )
            }
        };
        let bytes = match std::fs::metadata(summary.file()) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return Self::failed(
                    started_at,
                    local_digest,
                    0,
                    false,
                    format!("cannot stat bag file: {}", e),
                )
            }
        };

        // Tracked outside the fallible path: a delete that happened must
        // be reported even when the upload after it fails
        let mut existing_object_deleted = false;

        match self.try_transfer(
            &key,
            summary.file(),
            bytes,
            local_digest.as_deref(),
            overwrite,
            started_at,
            &mut existing_object_deleted,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(key, error = %e, "bag transfer failed");
                Self::failed(
                    started_at,
                    local_digest,
                    bytes,
                    existing_object_deleted,
                    e.to_string(),
                )
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_transfer(
        &self,
        key: &str,
        file: &Path,
        bytes: u64,
        local_digest: Option<&str>,
        overwrite: bool,
        started_at: DateTime<Utc>,
        existing_object_deleted: &mut bool,
    ) -> Result<TransferOutcome> {
        if let Some(existing) = self.store.find_object(key)? {
            if !overwrite {
                info!(key, "bag already exists in the store, not overwriting");
                return Ok(TransferOutcome {
                    transferred: false,
                    local_digest: local_digest.map(str::to_string),
                    remote_digest: None,
                    bytes,
                    existing_object_deleted: false,
                    started_at,
                    finished_at: Utc::now(),
                    message: Some("bag exists, did not overwrite".to_string()),
                });
            }
            self.store.delete_object(key)?;
            *existing_object_deleted = true;
            info!(
                key,
                existing_bytes = existing.size,
                created = ?existing.last_modified,
                "deleted existing object before transfer"
            );
        }

        let (remote_digest, message) = if bytes > self.chunk_size {
            self.put_large(key, file, bytes)?;
            (
                None,
                Some("multipart upload, remote digest unavailable".to_string()),
            )
        } else {
            self.put_small(key, file, local_digest)?
        };

        let finished_at = Utc::now();
        info!(
            key,
            bytes,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "bag transferred"
        );

        Ok(TransferOutcome {
            transferred: true,
            local_digest: local_digest.map(str::to_string),
            remote_digest,
            bytes,
            existing_object_deleted: *existing_object_deleted,
            started_at,
            finished_at,
            message,
        })
    }

    fn put_small(
        &self,
        key: &str,
        file: &Path,
        local_digest: Option<&str>,
    ) -> Result<(Option<String>, Option<String>)> {
        let remote_digest = self.store.put_object(key, file)?;

        // Mismatch is advisory for downstream auditing, never a failure
        let message = match local_digest {
            Some(local) if !local.eq_ignore_ascii_case(&remote_digest) => {
                warn!(key, local, remote = %remote_digest, "CHECKSUM MISMATCH");
                Some(format!(
                    "checksum mismatch: local {} vs remote {}",
                    local, remote_digest
                ))
            }
            _ => None,
        };
        Ok((Some(remote_digest), message))
    }

    fn put_large(&self, key: &str, file: &Path, bytes: u64) -> Result<()> {
        let upload_id = self.store.initiate_multipart(key)?;

        // The session must never be left open: any part or completion
        // failure aborts it before the error surfaces.
        if let Err(e) = self.upload_parts(key, &upload_id, file, bytes) {
            if let Err(abort_err) = self.store.abort_multipart(key, &upload_id) {
                warn!(key, upload_id, error = %abort_err, "failed to abort multipart upload");
            }
            return Err(e);
        }
        Ok(())
    }

    fn upload_parts(&self, key: &str, upload_id: &str, file: &Path, bytes: u64) -> Result<()> {
        let mut parts = Vec::new();
        let mut part_number = 1i32;
        let mut offset = 0u64;

        // Parts are handed to the store as file windows, never as
        // materialized buffers, so memory stays bounded regardless of
        // part size
        while offset < bytes {
            let part_size = self.chunk_size.min(bytes - offset);
            let last_part = offset + part_size >= bytes;
            let tag = self.store.upload_part(
                key,
                upload_id,
                part_number,
                file,
                offset,
                part_size,
                last_part,
            )?;
            parts.push(tag);
            part_number += 1;
            offset += part_size;
        }

        self.store.complete_multipart(key, upload_id, &parts)?;
        Ok(())
    }

    fn failed(
        started_at: DateTime<Utc>,
        local_digest: Option<String>,
        bytes: u64,
        existing_object_deleted: bool,
        message: String,
    ) -> TransferOutcome {
        TransferOutcome {
            transferred: false,
            local_digest,
            remote_digest: None,
            bytes,
            existing_object_deleted,
            started_at,
            finished_at: Utc::now(),
            message: Some(message),
        }
    }
}
