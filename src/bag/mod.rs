/*!
 * Bag assembly: payload placement, fixity manifests and descriptive
 * tag files, laid out to the AP Trust BagIt submission profile.
 */

pub mod assemble;
pub mod info;
pub mod manifest;
pub mod payload;
pub mod summary;

pub use assemble::BagAssembler;
pub use info::{AccessLevel, AptrustInfo, BagInfo};
pub use manifest::{FixityMismatch, Manifest, ManifestEntry};
pub use payload::PendingPayloadFile;
pub use summary::BagSummary;
