//! End-to-end assembly and archiving behavior

use bagger::{
    AccessLevel, AptrustInfo, ArchivePackager, BagAssembler, BagInfo, DigestAlgorithm, Manifest,
    PendingPayloadFile,
};
use bagger::fixity::hash_file;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_source(dir: &Path, name: &str, len: usize, fill: u8) -> PendingPayloadFile {
    let path = dir.join(name);
    fs::write(&path, vec![fill; len]).unwrap();
    PendingPayloadFile::new(path)
}

/// The canonical scenario: two payload files of 500 and 800 bytes, title
/// "Title", access "Consortia".
#[test]
fn example_scenario_assembles_and_archives() {
    let scratch = tempdir().unwrap();
    let staging = tempdir().unwrap();

    let payload = vec![
        write_source(scratch.path(), "first.bin", 500, 0xAB),
        write_source(scratch.path(), "second.bin", 800, 0xCD),
    ];
    let bag_info = BagInfo::new().source_organization("Test Organization");
    let aptrust_info = AptrustInfo::new("Title", AccessLevel::Consortia).unwrap();

    let summary = BagAssembler::default()
        .assemble(
            staging.path(),
            "test.example-1",
            payload,
            &bag_info,
            &aptrust_info,
            |_| Ok(()),
        )
        .unwrap();

    assert_eq!(summary.payload_bytes(), 1300);
    let manifest = Manifest::parse(DigestAlgorithm::Sha256, summary.manifest_text()).unwrap();
    assert_eq!(manifest.entries().len(), 2);

    let bag_dir = summary.file().to_path_buf();
    let packaged = ArchivePackager::default().package(summary).unwrap();

    // One archive file whose recorded digest matches a byte-for-byte re-read
    assert!(packaged.file().is_file());
    assert_eq!(
        packaged.file().file_name().unwrap(),
        "test.example-1.tar"
    );
    let reread = hash_file(packaged.file(), DigestAlgorithm::Md5).unwrap();
    assert_eq!(packaged.hex_checksum().unwrap(), reread);

    // The redundant bag directory is gone, the manifest text survives
    assert!(!bag_dir.exists());
    assert_eq!(packaged.payload_bytes(), 1300);
    assert_eq!(
        Manifest::parse(DigestAlgorithm::Sha256, packaged.manifest_text())
            .unwrap()
            .entries()
            .len(),
        2
    );
}

/// Round-trip fixity law: every manifest digest is reproduced by an
/// independent recomputation of the placed file.
#[test]
fn manifest_digests_reproduce_independently() {
    let scratch = tempdir().unwrap();
    let staging = tempdir().unwrap();

    let payload = vec![
        write_source(scratch.path(), "a.bin", 64, 1),
        write_source(scratch.path(), "b.bin", 4096, 2),
        write_source(scratch.path(), "c.bin", 1, 3),
    ];

    let summary = BagAssembler::new(DigestAlgorithm::Sha256)
        .assemble(
            staging.path(),
            "test.fixity-1",
            payload,
            &BagInfo::new(),
            &AptrustInfo::new("Fixity", AccessLevel::Institution).unwrap(),
            |_| Ok(()),
        )
        .unwrap();

    let manifest = Manifest::parse(DigestAlgorithm::Sha256, summary.manifest_text()).unwrap();
    assert_eq!(manifest.entries().len(), 3);
    for entry in manifest.entries() {
        let recomputed =
            hash_file(&summary.file().join(&entry.relative_path), DigestAlgorithm::Sha256)
                .unwrap();
        assert_eq!(recomputed, entry.digest_hex, "for {}", entry.relative_path);
    }
}

/// Corrupting one byte of one placed payload file is detected as exactly
/// one mismatched manifest entry.
#[test]
fn single_byte_corruption_detected_once() {
    let scratch = tempdir().unwrap();
    let staging = tempdir().unwrap();

    let payload = vec![
        write_source(scratch.path(), "keep.bin", 256, 9),
        write_source(scratch.path(), "corrupt.bin", 256, 8),
    ];

    let summary = BagAssembler::default()
        .assemble(
            staging.path(),
            "test.corrupt-1",
            payload,
            &BagInfo::new(),
            &AptrustInfo::new("Corruption", AccessLevel::Consortia).unwrap(),
            |_| Ok(()),
        )
        .unwrap();

    let target = summary.file().join("data/corrupt.bin");
    let mut bytes = fs::read(&target).unwrap();
    bytes[100] ^= 0x40;
    fs::write(&target, bytes).unwrap();

    let manifest = Manifest::parse(DigestAlgorithm::Sha256, summary.manifest_text()).unwrap();
    let mismatches = manifest.verify(summary.file()).unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].relative_path, "data/corrupt.bin");
}

/// Placement produces bytes identical to the source regardless of whether
/// linking or copying happened, and the cleanup hook may delete sources
/// as soon as it fires.
#[test]
fn placed_files_identical_and_sources_freed_early() {
    let scratch = tempdir().unwrap();
    let staging = tempdir().unwrap();

    let source_path = scratch.path().join("original.bin");
    let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    fs::write(&source_path, &content).unwrap();

    let summary = BagAssembler::default()
        .assemble(
            staging.path(),
            "test.place-1",
            vec![PendingPayloadFile::new(&source_path)],
            &BagInfo::new(),
            &AptrustInfo::new("Placement", AccessLevel::Consortia).unwrap(),
            |freed| {
                // Temporary per-item files can go before the bag is finished
                fs::remove_file(freed.source())?;
                Ok(())
            },
        )
        .unwrap();

    assert!(!source_path.exists());
    assert_eq!(
        fs::read(summary.file().join("data/original.bin")).unwrap(),
        content
    );
}
