//! Fixity manifests: rendering, parsing and independent verification

use crate::error::{Error, Result};
use crate::fixity::{hash_file, DigestAlgorithm};
use std::path::Path;
use walkdir::WalkDir;

/// One `(relative path, digest)` assertion within a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub relative_path: String,
    pub digest_hex: String,
}

/// A detected disagreement between a manifest entry and the file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixityMismatch {
    pub relative_path: String,
    pub expected: String,
    pub actual: String,
}

/// A payload or tag manifest. Entries keep insertion order; the rendered
/// form is one `"<hex-digest>  <relative-path>"` line per entry.
#[derive(Debug, Clone)]
pub struct Manifest {
    algorithm: DigestAlgorithm,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            entries: Vec::new(),
        }
    }

    /// Build the payload manifest by walking `<bag_root>/data` and digesting
    /// every file. Entry paths are recorded relative to the bag root
    /// (`data/...`) with forward slashes.
    pub fn for_payload_tree(bag_root: &Path, algorithm: DigestAlgorithm) -> Result<Self> {
        let data_dir = bag_root.join("data");
        let mut manifest = Manifest::new(algorithm);

        for entry in WalkDir::new(&data_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::invalid_destination(&data_dir, format!("payload walk failed: {}", e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let digest = hash_file(entry.path(), algorithm)?;
            let relative = relative_to(entry.path(), bag_root)?;
            manifest.push(relative, digest);
        }

        Ok(manifest)
    }

    pub fn push<P: Into<String>, D: Into<String>>(&mut self, relative_path: P, digest_hex: D) {
        self.entries.push(ManifestEntry {
            relative_path: relative_path.into(),
            digest_hex: digest_hex.into(),
        });
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render to the manifest text format, newline-terminated, UTF-8
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.digest_hex);
            out.push_str("  ");
            out.push_str(&entry.relative_path);
            out.push('\n');
        }
        out
    }

    /// File name for a payload manifest of this algorithm
    pub fn file_name(&self) -> String {
        format!("manifest-{}.txt", self.algorithm)
    }

    /// File name for a tag manifest of this algorithm
    pub fn tag_file_name(&self) -> String {
        format!("tagmanifest-{}.txt", self.algorithm)
    }

    /// Parse manifest text back into entries
    pub fn parse(algorithm: DigestAlgorithm, text: &str) -> Result<Self> {
        let mut manifest = Manifest::new(algorithm);
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (digest, path) = line.split_once("  ").ok_or_else(|| {
                Error::invalid_metadata(format!("malformed manifest line: {:?}", line))
            })?;
            manifest.push(path, digest);
        }
        Ok(manifest)
    }

    /// Independently re-read every listed file and report entries whose
    /// recomputed digest disagrees with the recorded one.
    pub fn verify(&self, bag_root: &Path) -> Result<Vec<FixityMismatch>> {
        let mut mismatches = Vec::new();
        for entry in &self.entries {
            let actual = hash_file(&bag_root.join(&entry.relative_path), self.algorithm)?;
            if !actual.eq_ignore_ascii_case(&entry.digest_hex) {
                mismatches.push(FixityMismatch {
                    relative_path: entry.relative_path.clone(),
                    expected: entry.digest_hex.clone(),
                    actual,
                });
            }
        }
        Ok(mismatches)
    }
}

/// Render a path relative to the bag root with forward slashes
fn relative_to(path: &Path, bag_root: &Path) -> Result<String> {
    let relative = path.strip_prefix(bag_root).map_err(|_| {
        Error::invalid_destination(path, "payload file escaped the bag root")
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_payload(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join("data").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_payload_tree_manifest() {
        let dir = tempdir().unwrap();
        write_payload(dir.path(), "a.txt", b"alpha");
        write_payload(dir.path(), "sub/b.txt", b"beta");

        let manifest =
            Manifest::for_payload_tree(dir.path(), DigestAlgorithm::Sha256).unwrap();

        assert_eq!(manifest.entries().len(), 2);
        let paths: Vec<&str> = manifest
            .entries()
            .iter()
            .map(|e| e.relative_path.as_str())
            .collect();
        assert!(paths.contains(&"data/a.txt"));
        assert!(paths.contains(&"data/sub/b.txt"));
    }

    #[test]
    fn test_recomputing_digests_reproduces_manifest() {
        let dir = tempdir().unwrap();
        write_payload(dir.path(), "one.bin", &[7u8; 500]);
        write_payload(dir.path(), "two.bin", &[9u8; 800]);

        let manifest =
            Manifest::for_payload_tree(dir.path(), DigestAlgorithm::Sha256).unwrap();

        for entry in manifest.entries() {
            let recomputed =
                hash_file(&dir.path().join(&entry.relative_path), DigestAlgorithm::Sha256)
                    .unwrap();
            assert_eq!(recomputed, entry.digest_hex);
        }
    }

    #[test]
    fn test_text_round_trip() {
        let mut manifest = Manifest::new(DigestAlgorithm::Sha256);
        manifest.push("data/a.txt", "aa11");
        manifest.push("data/b c.txt", "bb22");

        let text = manifest.to_text();
        assert_eq!(text, "aa11  data/a.txt\nbb22  data/b c.txt\n");

        let parsed = Manifest::parse(DigestAlgorithm::Sha256, &text).unwrap();
        assert_eq!(parsed.entries(), manifest.entries());
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        assert!(Manifest::parse(DigestAlgorithm::Sha256, "no-separator\n").is_err());
    }

    #[test]
    fn test_file_names() {
        let manifest = Manifest::new(DigestAlgorithm::Sha256);
        assert_eq!(manifest.file_name(), "manifest-sha256.txt");
        assert_eq!(manifest.tag_file_name(), "tagmanifest-sha256.txt");

        let md5 = Manifest::new(DigestAlgorithm::Md5);
        assert_eq!(md5.file_name(), "manifest-md5.txt");
    }

    #[test]
    fn test_verify_detects_single_corrupted_file() {
        let dir = tempdir().unwrap();
        write_payload(dir.path(), "a.bin", b"original a");
        write_payload(dir.path(), "b.bin", b"original b");
        write_payload(dir.path(), "c.bin", b"original c");

        let manifest =
            Manifest::for_payload_tree(dir.path(), DigestAlgorithm::Sha256).unwrap();
        assert!(manifest.verify(dir.path()).unwrap().is_empty());

        // Flip one byte of one placed file
        let target = dir.path().join("data/b.bin");
        let mut content = fs::read(&target).unwrap();
        content[0] ^= 0x01;
        fs::write(&target, content).unwrap();

        let mismatches = manifest.verify(dir.path()).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].relative_path, "data/b.bin");
        assert_ne!(mismatches[0].expected, mismatches[0].actual);
    }
}
