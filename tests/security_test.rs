use release_unpack::{Driver, Error};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use zip::write::FileOptions;

// ============================================================================
// Helper Functions
// ============================================================================

/// A tar header whose name is stored byte-for-byte, bypassing the
/// builder's own path checks.
fn raw_header(name: &str, size: u64, entry_type: tar::EntryType) -> tar::Header {
    let mut header = tar::Header::new_old();
    let bytes = name.as_bytes();
    header.as_old_mut().name[..bytes.len()].copy_from_slice(bytes);
    header.set_size(size);
    header.set_mode(0o644);
    header.set_entry_type(entry_type);
    header.set_cksum();
    header
}

fn create_raw_tar(dir: &Path, files: &[(&str, &[u8])]) -> PathBuf {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let header = raw_header(name, content.len() as u64, tar::EntryType::Regular);
        builder.append(&header, *content).unwrap();
    }
    let path = dir.join("hostile.tar");
    fs::write(&path, builder.into_inner().unwrap()).unwrap();
    path
}

fn create_zip(dir: &Path, files: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join("hostile.zip");
    let file = fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options: FileOptions<()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
    path
}

// ============================================================================
// Entry name normalization
// ============================================================================

#[test]
fn test_tar_parent_traversal_stays_inside() {
    let root = tempdir().unwrap();
    let src = tempdir().unwrap();
    let dest = root.path().join("out");
    fs::create_dir(&dest).unwrap();
    let archive = create_raw_tar(src.path(), &[("  ..\\..\\evil.txt  ", b"evil")]);

    let written = Driver::new(&dest).unwrap().extract_file(&archive).unwrap();

    assert_eq!(written, vec![dest.join("evil.txt")]);
    assert_eq!(fs::read_to_string(dest.join("evil.txt")).unwrap(), "evil");
    assert!(!root.path().join("evil.txt").exists());
}

#[test]
fn test_tar_absolute_path_is_rooted_at_destination() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_raw_tar(src.path(), &[("/etc/passwd", b"root:x:0:0")]);

    let written = Driver::new(dest.path())
        .unwrap()
        .extract_file(&archive)
        .unwrap();

    assert_eq!(written, vec![dest.path().join("etc/passwd")]);
}

#[test]
fn test_tar_drive_label_is_dropped() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_raw_tar(src.path(), &[("C:\\Windows\\evil.dll", b"MZ")]);

    let written = Driver::new(dest.path())
        .unwrap()
        .extract_file(&archive)
        .unwrap();

    assert_eq!(written, vec![dest.path().join("Windows/evil.dll")]);
}

#[test]
fn test_tar_hidden_dot_segments_are_dropped() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_raw_tar(
        src.path(),
        &[("a/.../b.txt", b"b"), ("c/ /d.txt", b"d"), ("../../../", b"")],
    );

    let written = Driver::new(dest.path())
        .unwrap()
        .extract_file(&archive)
        .unwrap();

    assert_eq!(
        written,
        vec![dest.path().join("a/b.txt"), dest.path().join("c/d.txt")]
    );
}

#[test]
fn test_zip_slip_is_neutralized() {
    let root = tempdir().unwrap();
    let src = tempdir().unwrap();
    let dest = root.path().join("out");
    fs::create_dir(&dest).unwrap();
    let archive = create_zip(
        src.path(),
        &[("safe.txt", b"safe content"), ("../../evil.txt", b"evil content")],
    );

    let written = Driver::new(&dest).unwrap().extract_file(&archive).unwrap();

    assert_eq!(written, vec![dest.join("safe.txt"), dest.join("evil.txt")]);
    assert!(!root.path().join("evil.txt").exists());
}

// ============================================================================
// Symlinks
// ============================================================================

#[cfg(unix)]
#[test]
fn test_write_through_planted_symlink_is_blocked() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let outside = tempdir().unwrap();

    let mut builder = tar::Builder::new(Vec::new());
    let mut link = tar::Header::new_gnu();
    link.set_path("escape").unwrap();
    link.set_entry_type(tar::EntryType::Symlink);
    link.set_link_name(outside.path()).unwrap();
    link.set_size(0);
    link.set_cksum();
    builder.append(&link, std::io::empty()).unwrap();

    let mut file = tar::Header::new_gnu();
    file.set_path("escape/pwned.txt").unwrap();
    file.set_size(5);
    file.set_mode(0o644);
    file.set_cksum();
    builder.append(&file, &b"pwned"[..]).unwrap();

    let archive = src.path().join("planted.tar");
    fs::write(&archive, builder.into_inner().unwrap()).unwrap();

    let result = Driver::new(dest.path()).unwrap().extract_file(&archive);

    match result {
        Err(Error::EntryFailed {
            entry,
            written,
            source,
        }) => {
            assert_eq!(entry, "escape/pwned.txt");
            assert_eq!(written, vec![dest.path().join("escape")]);
            assert!(matches!(*source, Error::PathEscape { .. }));
        }
        other => panic!("expected EntryFailed, got {:?}", other),
    }
    assert!(!outside.path().join("pwned.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_overwrite_replaces_symlink_instead_of_following_it() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let victim = outside.path().join("victim.txt");
    fs::write(&victim, "original").unwrap();
    std::os::unix::fs::symlink(&victim, dest.path().join("a.txt")).unwrap();

    let archive = create_raw_tar(src.path(), &[("a.txt", b"replaced")]);

    Driver::new(dest.path())
        .unwrap()
        .overwrite(true)
        .extract_file(&archive)
        .unwrap();

    assert_eq!(fs::read_to_string(&victim).unwrap(), "original");
    let meta = fs::symlink_metadata(dest.path().join("a.txt")).unwrap();
    assert!(meta.file_type().is_file());
    assert_eq!(
        fs::read_to_string(dest.path().join("a.txt")).unwrap(),
        "replaced"
    );
}

#[cfg(unix)]
#[test]
fn test_existing_symlink_without_overwrite_is_left_alone() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let victim = outside.path().join("victim.txt");
    fs::write(&victim, "original").unwrap();
    std::os::unix::fs::symlink(&victim, dest.path().join("a.txt")).unwrap();

    let archive = create_raw_tar(src.path(), &[("a.txt", b"replaced")]);

    let result = Driver::new(dest.path()).unwrap().extract_file(&archive);

    assert!(matches!(result, Err(Error::EntryFailed { .. })));
    assert_eq!(fs::read_to_string(&victim).unwrap(), "original");
}
