//! Tests for ZIP archive extraction.

use release_unpack::{Driver, Error, FilterSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use zip::write::FileOptions;

fn create_zip(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options: FileOptions<()> = FileOptions::default();

    for (entry, content) in files {
        if entry.ends_with('/') {
            zip.add_directory(*entry, options).unwrap();
        } else {
            zip.start_file(*entry, options).unwrap();
            zip.write_all(content).unwrap();
        }
    }

    zip.finish().unwrap();
    path
}

#[test]
fn test_zip_round_trip() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_zip(
        src.path(),
        "bundle.zip",
        &[
            ("README.md", b"# tool"),
            ("bin/", b""),
            ("bin/tool", b"\x7fELF"),
        ],
    );

    let written = Driver::new(dest.path())
        .unwrap()
        .extract_file(&archive)
        .unwrap();

    assert_eq!(
        written,
        vec![
            dest.path().join("README.md"),
            dest.path().join("bin"),
            dest.path().join("bin/tool"),
        ]
    );
    assert_eq!(fs::read(dest.path().join("bin/tool")).unwrap(), b"\x7fELF");
    assert!(dest.path().join("bin").is_dir());
}

#[test]
fn test_zip_nested_file_without_directory_entry() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_zip(src.path(), "nested.zip", &[("a/b/c.txt", b"deep")]);

    let written = Driver::new(dest.path())
        .unwrap()
        .extract_file(&archive)
        .unwrap();

    assert_eq!(written, vec![dest.path().join("a/b/c.txt")]);
    assert_eq!(fs::read_to_string(dest.path().join("a/b/c.txt")).unwrap(), "deep");
}

#[test]
fn test_zip_filter() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_zip(
        src.path(),
        "bundle.zip",
        &[
            ("LICENSE", b"MIT"),
            ("bin/tool", b"binary"),
            ("docs/tool.1", b"man"),
        ],
    );

    let written = Driver::new(dest.path())
        .unwrap()
        .filters(FilterSet::compile(&["^bin/"]).unwrap())
        .extract_file(&archive)
        .unwrap();

    assert_eq!(written, vec![dest.path().join("bin/tool")]);
    assert!(!dest.path().join("LICENSE").exists());
    assert!(!dest.path().join("docs").exists());
}

#[test]
fn test_zip_overwrite() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    fs::write(dest.path().join("tool"), "old").unwrap();
    let archive = create_zip(src.path(), "tool.zip", &[("tool", b"new")]);

    let result = Driver::new(dest.path()).unwrap().extract_file(&archive);
    match result {
        Err(Error::EntryFailed { entry, source, .. }) => {
            assert_eq!(entry, "tool");
            assert!(matches!(*source, Error::AlreadyExists { .. }));
        }
        other => panic!("expected EntryFailed, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(dest.path().join("tool")).unwrap(), "old");

    Driver::new(dest.path())
        .unwrap()
        .overwrite(true)
        .extract_file(&archive)
        .unwrap();
    assert_eq!(fs::read_to_string(dest.path().join("tool")).unwrap(), "new");
}

#[cfg(unix)]
#[test]
fn test_zip_symlink_is_skipped() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let path = src.path().join("links.zip");
    let file = fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options: FileOptions<()> = FileOptions::default();
    zip.start_file("target.txt", options).unwrap();
    zip.write_all(b"data").unwrap();
    zip.add_symlink("link", "target.txt", options).unwrap();
    zip.finish().unwrap();

    let written = Driver::new(dest.path()).unwrap().extract_file(&path).unwrap();

    assert_eq!(written, vec![dest.path().join("target.txt")]);
    assert!(fs::symlink_metadata(dest.path().join("link")).is_err());
}

#[cfg(unix)]
#[test]
fn test_zip_unix_mode_applied() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let path = src.path().join("exec.zip");
    let file = fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options: FileOptions<()> = FileOptions::default().unix_permissions(0o755);
    zip.start_file("run.sh", options).unwrap();
    zip.write_all(b"#!/bin/sh\n").unwrap();
    zip.finish().unwrap();

    Driver::new(dest.path()).unwrap().extract_file(&path).unwrap();

    let mode = fs::metadata(dest.path().join("run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn test_zip_only_directories_counts_as_extracted() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_zip(src.path(), "dirs.zip", &[("empty/", b"")]);

    let written = Driver::new(dest.path())
        .unwrap()
        .extract_file(&archive)
        .unwrap();

    assert_eq!(written, vec![dest.path().join("empty")]);
}

#[test]
fn test_corrupt_zip_fails_before_writing() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = src.path().join("broken.zip");
    fs::write(&archive, b"this is not a zip file at all").unwrap();

    let result = Driver::new(dest.path()).unwrap().extract_file(&archive);

    assert!(matches!(result, Err(Error::Zip(_))));
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[test]
fn test_zip_suffix_is_case_insensitive() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let archive = create_zip(src.path(), "BUNDLE.ZIP", &[("a.txt", b"a")]);

    let written = Driver::new(dest.path())
        .unwrap()
        .extract_file(&archive)
        .unwrap();

    assert_eq!(written, vec![dest.path().join("a.txt")]);
}
