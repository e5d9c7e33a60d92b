//! Bag assembly: payload placement, manifests and tag files

use crate::bag::info::{AptrustInfo, BagInfo};
use crate::bag::manifest::Manifest;
use crate::bag::payload::PendingPayloadFile;
use crate::bag::summary::BagSummary;
use crate::error::{Error, Result};
use crate::fixity::{hash_file, DigestAlgorithm};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Version-declaration file content written to every bag
const BAGIT_DECLARATION: &str = "BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n";

/// Builds an on-disk bag: `data/` payload, payload manifest, descriptive
/// tag files and a tag manifest covering the tag files' own digests.
#[derive(Debug, Clone, Default)]
pub struct BagAssembler {
    algorithm: DigestAlgorithm,
}

impl BagAssembler {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Assemble a bag named `bag_name` under `destination_dir`.
    ///
    /// `free_payload_file` is invoked once per payload file as soon as the
    /// file has been placed and is no longer needed by the assembler, so
    /// callers can delete per-item temporary files without waiting for the
    /// whole bag to finish.
    ///
    /// Any I/O failure propagates unretried; the caller decides whether to
    /// retry the whole bag.
    pub fn assemble<F>(
        &self,
        destination_dir: &Path,
        bag_name: &str,
        payload: Vec<PendingPayloadFile>,
        bag_info: &BagInfo,
        aptrust_info: &AptrustInfo,
        mut free_payload_file: F,
    ) -> Result<BagSummary>
    where
        F: FnMut(PendingPayloadFile) -> Result<()>,
    {
        if !destination_dir.exists() {
            fs::create_dir_all(destination_dir)?;
        } else if !destination_dir.is_dir() {
            return Err(Error::invalid_destination(
                destination_dir,
                "not a directory",
            ));
        }

        let mut seen_paths: HashSet<String> = HashSet::new();
        for file in &payload {
            if !seen_paths.insert(file.path_within_payload().to_string()) {
                return Err(Error::DuplicatePayloadPath {
                    path: file.path_within_payload().to_string(),
                });
            }
        }

        let bag_root = destination_dir.join(bag_name);
        let data_dir = bag_root.join("data");
        fs::create_dir_all(&data_dir)?;

        fs::write(bag_root.join("bagit.txt"), BAGIT_DECLARATION)?;

        // Bring in the payload, releasing each source as soon as it lands
        let mut payload_bytes = 0u64;
        for file in payload {
            payload_bytes += file.place_into(&data_dir)?;
            free_payload_file(file)?;
        }
        debug!(bag = bag_name, payload_bytes, "payload placed");

        let manifest = Manifest::for_payload_tree(&bag_root, self.algorithm)?;
        let manifest_text = manifest.to_text();
        fs::write(bag_root.join(manifest.file_name()), &manifest_text)?;

        fs::write(bag_root.join("bag-info.txt"), bag_info.render())?;
        fs::write(bag_root.join("aptrust-info.txt"), aptrust_info.render())?;

        // Tag manifest covers the tag files, not the payload
        let mut tag_manifest = Manifest::new(self.algorithm);
        for tag_file in ["bag-info.txt", "aptrust-info.txt"] {
            let digest = hash_file(&bag_root.join(tag_file), self.algorithm)?;
            tag_manifest.push(tag_file, digest);
        }
        fs::write(
            bag_root.join(tag_manifest.tag_file_name()),
            tag_manifest.to_text(),
        )?;

        info!(
            bag = bag_name,
            payload_bytes,
            entries = manifest.entries().len(),
            "bag assembled"
        );

        Ok(BagSummary::new(bag_root, None, manifest_text, payload_bytes))
    }
}
