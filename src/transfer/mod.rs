/*!
 * Resilient transfer of archived bags to a remote object store.
 */

pub mod s3;
pub mod store;
pub mod submit;

pub use s3::{S3Store, S3StoreConfig};
pub use store::{ObjectStore, PartTag, RemoteObject};
pub use submit::{BagSubmitter, TransferOutcome, DEFAULT_CHUNK_SIZE};
