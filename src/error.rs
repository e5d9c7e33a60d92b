/*!
 * Error types for Bagger
 */

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bagging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling, archiving or transferring a bag
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The destination exists but is not a usable directory
    #[error("invalid destination {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: String },

    /// Required descriptive fields are missing or malformed
    #[error("invalid bag metadata: {message}")]
    InvalidMetadata { message: String },

    /// Two payload files mapped to the same path within the bag
    #[error("duplicate payload path within bag: {path}")]
    DuplicatePayloadPath { path: String },

    /// The archiving subprocess failed; carries its captured output
    #[error("archiving failed (exit status {status:?}): {output}")]
    PackagingFailed { status: Option<i32>, output: String },

    /// Network or storage failure during upload
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// Local and remote digests disagree
    #[error("checksum mismatch: expected {expected}, found {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an invalid destination error
    pub fn invalid_destination<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Error::InvalidDestination {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid metadata error
    pub fn invalid_metadata<S: Into<String>>(message: S) -> Self {
        Error::InvalidMetadata {
            message: message.into(),
        }
    }

    /// Create a transfer error
    pub fn transfer<S: Into<String>>(message: S) -> Self {
        Error::TransferFailed(message.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Check whether this error affects a single bag's transfer rather
    /// than the whole batch
    pub fn is_transfer_error(&self) -> bool {
        matches!(self, Error::TransferFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_metadata_display() {
        let err = Error::invalid_metadata("missing title");
        assert_eq!(err.to_string(), "invalid bag metadata: missing title");
    }

    #[test]
    fn test_invalid_destination_display() {
        let err = Error::invalid_destination("/tmp/out", "not a directory");
        assert!(err.to_string().contains("/tmp/out"));
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_packaging_failed_carries_output() {
        let err = Error::PackagingFailed {
            status: Some(2),
            output: "tar: unknown option".to_string(),
        };
        assert!(err.to_string().contains("tar: unknown option"));
    }

    #[test]
    fn test_transfer_error_classification() {
        assert!(Error::transfer("socket closed").is_transfer_error());
        assert!(!Error::invalid_metadata("x").is_transfer_error());
    }
}
