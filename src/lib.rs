/*!
 * Bagger - BagIt bag assembly and resilient S3 submission
 *
 * Builds archival packages meeting the AP Trust BagIt profile and
 * transfers them to an object store:
 * - payload placement by hard link with transparent copy fallback
 * - SHA-256/MD5 payload and tag manifests
 * - streamed tar serialization with a teed archive digest
 * - single-shot or multipart upload with guaranteed abort on failure
 * - overwrite policy against pre-existing remote objects
 */

pub mod archive;
pub mod bag;
pub mod config;
pub mod drain;
pub mod error;
pub mod fixity;
pub mod logging;
pub mod metadata;
pub mod transfer;

// Re-export commonly used types
pub use archive::ArchivePackager;
pub use bag::{
    AccessLevel, AptrustInfo, BagAssembler, BagInfo, BagSummary, Manifest, PendingPayloadFile,
};
pub use config::BaggerConfig;
pub use error::{Error, Result};
pub use fixity::DigestAlgorithm;
pub use transfer::{BagSubmitter, ObjectStore, TransferOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
