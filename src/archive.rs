/*!
 * Serialization of an assembled bag directory into a single tar archive.
 *
 * The archiver is the external `tar` process writing to stdout; the parent
 * tees that stream through a digest accumulator into the destination file,
 * so the archive checksum costs no second read of a potentially
 * multi-gigabyte file. stderr is drained concurrently with the wait for
 * exit, and the exit code is the authoritative success signal.
 */

use crate::bag::BagSummary;
use crate::drain::PipeDrainer;
use crate::error::{Error, Result};
use crate::fixity::{DigestAlgorithm, HashingWriter};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{info, warn};

/// Serializes a bag directory into `<bag-name>.tar` next to it
#[derive(Debug, Clone)]
pub struct ArchivePackager {
    algorithm: DigestAlgorithm,
}

impl ArchivePackager {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Archive a bag directory, returning the tar path and its digest.
    ///
    /// On success the now-redundant bag directory is removed.
    pub fn archive(&self, bag_dir: &Path) -> Result<(PathBuf, Vec<u8>)> {
        let bag_name = bag_dir
            .file_name()
            .ok_or_else(|| Error::invalid_destination(bag_dir, "bag directory has no name"))?
            .to_owned();
        let parent = bag_dir
            .parent()
            .ok_or_else(|| Error::invalid_destination(bag_dir, "bag directory has no parent"))?;
        let tar_path = parent.join(format!("{}.tar", bag_name.to_string_lossy()));

        let mut child = Command::new("tar")
            .arg("-cf")
            .arg("-")
            .arg(&bag_name)
            .current_dir(parent)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| Error::PackagingFailed {
            status: None,
            output: "tar stdout was not captured".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| Error::PackagingFailed {
            status: None,
            output: "tar stderr was not captured".to_string(),
        })?;

        // Two drain tasks plus this thread waiting for exit; all three
        // must complete before the outcome is judged.
        let writer = HashingWriter::new(BufWriter::new(File::create(&tar_path)?), self.algorithm);
        let stdout_drain = PipeDrainer::spawn(stdout, writer);
        let stderr_drain = PipeDrainer::capture(stderr);

        let status = child.wait();
        let drained = stdout_drain
            .join()
            .and_then(|(writer, _)| writer.finish())
            .map(|(_, digest, bytes)| (digest, bytes));
        let captured = stderr_drain.join();

        let (digest, archive_bytes) = Self::conclude(&tar_path, status, drained, captured)?;

        fs::remove_dir_all(bag_dir)?;
        info!(
            archive = %tar_path.display(),
            archive_bytes,
            algorithm = %self.algorithm,
            "bag archived"
        );

        Ok((tar_path, digest))
    }

    /// Judge the joined results of the wait and both drains. Any failure,
    /// not just a non-zero tar exit, removes the partial archive so a
    /// half-written tar never survives on disk.
    fn conclude(
        tar_path: &Path,
        status: io::Result<ExitStatus>,
        drained: io::Result<(Vec<u8>, u64)>,
        captured: io::Result<(Vec<u8>, u64)>,
    ) -> Result<(Vec<u8>, u64)> {
        let outcome = (|| {
            let status = status?;
            let (digest, archive_bytes) = drained?;
            let (diagnostics, _) = captured?;

            if !status.success() {
                return Err(Error::PackagingFailed {
                    status: status.code(),
                    output: String::from_utf8_lossy(&diagnostics).into_owned(),
                });
            }
            Ok((digest, archive_bytes))
        })();

        if outcome.is_err() {
            if let Err(rm_err) = fs::remove_file(tar_path) {
                warn!(path = %tar_path.display(), error = %rm_err, "failed to remove partial archive");
            }
        }
        outcome
    }

    /// Archive the bag behind `summary`, producing a new summary whose file
    /// is the tar and whose checksum is the archive digest
    pub fn package(&self, summary: BagSummary) -> Result<BagSummary> {
        let (tar_path, digest) = self.archive(summary.file())?;
        Ok(BagSummary::new(
            tar_path,
            Some(digest),
            summary.manifest_text().to_string(),
            summary.payload_bytes(),
        ))
    }
}

impl Default for ArchivePackager {
    fn default() -> Self {
        // The archive digest feeds the store's Content-MD5 comparison
        Self::new(DigestAlgorithm::Md5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixity::hash_file;
    use std::fs;
    use tempfile::tempdir;

    fn make_bag_dir(root: &Path, name: &str) -> PathBuf {
        let bag = root.join(name);
        fs::create_dir_all(bag.join("data")).unwrap();
        fs::write(bag.join("bagit.txt"), "BagIt-Version: 0.97\n").unwrap();
        fs::write(bag.join("data/file.bin"), vec![5u8; 2048]).unwrap();
        bag
    }

    #[test]
    fn test_archive_digest_matches_fresh_read() {
        let dir = tempdir().unwrap();
        let bag = make_bag_dir(dir.path(), "test.arch-1");

        let (tar_path, digest) = ArchivePackager::default().archive(&bag).unwrap();

        assert!(tar_path.is_file());
        assert_eq!(tar_path.file_name().unwrap(), "test.arch-1.tar");

        let reread = hash_file(&tar_path, DigestAlgorithm::Md5).unwrap();
        assert_eq!(hex::encode(digest), reread);
    }

    #[test]
    fn test_bag_directory_removed_after_archive() {
        let dir = tempdir().unwrap();
        let bag = make_bag_dir(dir.path(), "test.arch-2");

        ArchivePackager::default().archive(&bag).unwrap();
        assert!(!bag.exists());
    }

    #[test]
    fn test_missing_bag_dir_is_packaging_failure() {
        let dir = tempdir().unwrap();
        let err = ArchivePackager::default()
            .archive(&dir.path().join("no-such-bag"))
            .unwrap_err();
        // tar exits non-zero and its stderr is carried in the error
        match err {
            Error::PackagingFailed { status, output } => {
                assert_ne!(status, Some(0));
                assert!(!output.is_empty());
            }
            other => panic!("expected PackagingFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_removes_partial_archive() {
        use std::os::unix::process::ExitStatusExt;

        let dir = tempdir().unwrap();
        let tar_path = dir.path().join("test.partial-1.tar");
        fs::write(&tar_path, b"half-written tar bytes").unwrap();

        // tar exited cleanly but the stream never made it to disk
        let err = ArchivePackager::conclude(
            &tar_path,
            Ok(ExitStatus::from_raw(0)),
            Err(io::Error::other("no space left on device")),
            Ok((Vec::new(), 0)),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(!tar_path.exists());
    }

    #[test]
    fn test_package_upgrades_summary() {
        let dir = tempdir().unwrap();
        let bag = make_bag_dir(dir.path(), "test.arch-3");
        let summary = BagSummary::new(bag, None, "manifest text".to_string(), 2048);

        let packaged = ArchivePackager::default().package(summary).unwrap();
        assert!(packaged.file().to_string_lossy().ends_with("test.arch-3.tar"));
        assert!(packaged.checksum().is_some());
        assert_eq!(packaged.manifest_text(), "manifest text");
        assert_eq!(packaged.payload_bytes(), 2048);
    }
}
