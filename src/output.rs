//! Output writer: every file, directory and link the crate creates goes
//! through here so overwrite handling and logging stay uniform.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::archive::Archive;
use crate::error::{format_bytes, Error};

/// Default mode for files whose entry carries none.
pub const DEFAULT_FILE_MODE: u32 = 0o644;
/// Default mode for directories whose entry carries none.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Kind of link recorded in a tar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Symbolic,
    Hard,
}

/// Creates output artifacts under a fixed overwrite policy.
///
/// With `overwrite` disabled, file creation is exclusive: an occupied path
/// fails with [`Error::AlreadyExists`] and is left untouched. With it
/// enabled, files are truncated and links replaced; an existing symlink at
/// the output path is removed first so the write never follows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputWriter {
    overwrite: bool,
}

impl OutputWriter {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Open `path` for writing with permission bits `mode`.
    pub fn create_file(&self, path: &Path, mode: u32) -> Result<fs::File, Error> {
        let mode = mode & 0o777;
        let mut options = fs::OpenOptions::new();
        options.write(true);
        if self.overwrite {
            remove_symlink(path)?;
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        match options.open(path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                error!("output file \"{}\" already exists", path.display());
                Err(Error::AlreadyExists {
                    entry: path.display().to_string(),
                })
            }
            Err(e) => {
                error!(
                    "opening output file \"{}\" (overwrite: {}) failed: {}",
                    path.display(),
                    self.overwrite,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Create `path` and fill it from `source`. Returns the bytes written.
    ///
    /// Missing parent directories are created.
    pub fn write_file<R: Read + ?Sized>(
        &self,
        path: &Path,
        mode: u32,
        source: &mut R,
    ) -> Result<u64, Error> {
        create_parent(path)?;
        let mut outfile = self.create_file(path, mode)?;

        let written = io::copy(source, &mut outfile).map_err(|e| {
            error!("writing to output file \"{}\" failed: {}", path.display(), e);
            e
        })?;

        // An overwritten file keeps its old mode unless we set it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))?;
        }

        info!(
            "created file:\"{}\"; mode:{:#o}; bytes:{} ({})",
            path.display(),
            mode & 0o777,
            written,
            format_bytes(written)
        );
        Ok(written)
    }

    /// Create the directory `path` (and any missing parents).
    ///
    /// An existing directory is reused as is and not an error; returns
    /// whether a new directory was made.
    pub fn create_directory(&self, path: &Path, mode: u32) -> Result<bool, Error> {
        let mode = mode & 0o777;
        if path.is_dir() {
            debug!("reusing existing directory:\"{}\"", path.display());
            return Ok(false);
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }

        builder.create(path).map_err(|e| {
            error!("creating directory \"{}\" failed: {}", path.display(), e);
            Error::from(e)
        })?;
        info!("created directory:\"{}\"; mode:{:#o}", path.display(), mode);
        Ok(true)
    }

    /// Create a link at `path` pointing to `target`.
    ///
    /// Symbolic targets are stored verbatim; hard-link targets must name an
    /// existing file.
    pub fn create_link(&self, path: &Path, target: &Path, kind: LinkKind) -> Result<(), Error> {
        create_parent(path)?;
        if fs::symlink_metadata(path).is_ok() {
            if !self.overwrite {
                error!("output link \"{}\" already exists", path.display());
                return Err(Error::AlreadyExists {
                    entry: path.display().to_string(),
                });
            }
            fs::remove_file(path)?;
        }

        let linked = match kind {
            LinkKind::Symbolic => symlink(target, path),
            LinkKind::Hard => fs::hard_link(target, path),
        };
        linked.map_err(|e| {
            error!(
                "creating {:?} link \"{}\" -> \"{}\" failed: {}",
                kind,
                path.display(),
                target.display(),
                e
            );
            Error::from(e)
        })?;

        info!(
            "created {} link:\"{}\" -> \"{}\"",
            match kind {
                LinkKind::Symbolic => "symbolic",
                LinkKind::Hard => "hard",
            },
            path.display(),
            target.display()
        );
        Ok(())
    }

    /// Copy the archive's whole decompressed stream into `output`.
    ///
    /// The file takes the archive's own permission bits. Calling this without
    /// an attached stream is a planner bug and reported as
    /// [`Error::NoDecompressedStream`].
    pub fn write_singleton(&self, archive: &mut Archive, output: &Path) -> Result<PathBuf, Error> {
        let mode = archive.permissions();
        let path = archive.path().display().to_string();
        let stream = archive
            .stream()
            .ok_or(Error::NoDecompressedStream { path })?;

        self.write_file(output, mode, stream)?;
        Ok(output.to_path_buf())
    }
}

fn create_parent(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

fn remove_symlink(path: &Path) -> Result<(), Error> {
    if let Ok(m) = fs::symlink_metadata(path) {
        if m.file_type().is_symlink() {
            fs::remove_file(path)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, path: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, path)
}

#[cfg(windows)]
fn symlink(target: &Path, path: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, path)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _path: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
