//! The object-store collaborator contract consumed by bag submission.
//!
//! Only the operations submission actually needs: find/delete by key,
//! single-shot put, and the multipart session protocol.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

/// A remote object as reported by a key listing
#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Identifier acknowledging one successfully uploaded part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTag {
    pub part_number: i32,
    pub etag: String,
}

impl PartTag {
    pub fn new<S: Into<String>>(part_number: i32, etag: S) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

/// Remote object store operations needed to submit a bag.
///
/// Implementations map storage/network failures to
/// [`Error::TransferFailed`](crate::error::Error::TransferFailed).
pub trait ObjectStore {
    /// Find the object with exactly this key, if present
    fn find_object(&self, key: &str) -> Result<Option<RemoteObject>>;

    /// Delete the object with this key
    fn delete_object(&self, key: &str) -> Result<()>;

    /// Upload a whole file in one call; returns the store's content digest
    fn put_object(&self, key: &str, file: &Path) -> Result<String>;

    /// Open a multipart upload session, returning its id
    fn initiate_multipart(&self, key: &str) -> Result<String>;

    /// Upload one part from the `length`-byte window of `file` starting
    /// at `offset`. The window is identified by range so implementations
    /// can stream it; a part is never required to fit in memory. Part
    /// numbers start at 1 and ascend by offset; `last_part` is set on
    /// the final window.
    #[allow(clippy::too_many_arguments)]
    fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        file: &Path,
        offset: u64,
        length: u64,
        last_part: bool,
    ) -> Result<PartTag>;

    /// Commit the session with the collected part identifiers
    fn complete_multipart(&self, key: &str, upload_id: &str, parts: &[PartTag]) -> Result<()>;

    /// Abandon the session, releasing any stored parts
    fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<()>;
}
