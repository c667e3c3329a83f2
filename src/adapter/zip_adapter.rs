//! ZIP archive adapter.

use std::io::{Read, Seek};
use std::path::PathBuf;

use log::warn;

use super::{permission_bits, ExtractContext, Extraction, S_IFIFO, S_IFLNK, S_IFMT};
use crate::error::Error;
use crate::output::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};

/// Adapter for ZIP archives. Needs random access to the central directory.
pub(crate) struct ZipAdapter<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipAdapter<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        Ok(Self {
            archive: zip::ZipArchive::new(reader)?,
        })
    }

    pub fn extract(mut self, ctx: &ExtractContext<'_>) -> Result<Vec<PathBuf>, Error> {
        let mut progress = Extraction::default();

        for index in 0..self.archive.len() {
            let mut entry = match self.archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => return Err(progress.abort(format!("#{}", index), e.into())),
            };

            let raw = entry.name().to_string();
            let Some(name) = ctx.select(&raw) else {
                continue;
            };

            let is_dir = entry.is_dir();
            let mode = entry.unix_mode();
            match extract_entry(&mut entry, is_dir, mode, &name, ctx) {
                Ok(Some(path)) => progress.record(path),
                Ok(None) => {}
                Err(e) => return Err(progress.abort(name, e)),
            }
        }

        Ok(progress.finish())
    }
}

/// Write one entry. `Ok(None)` means it was skipped.
fn extract_entry<F: Read>(
    entry: &mut F,
    is_dir: bool,
    mode: Option<u32>,
    name: &str,
    ctx: &ExtractContext<'_>,
) -> Result<Option<PathBuf>, Error> {
    if is_dir {
        let path = ctx.dir_path(name)?;
        ctx.writer
            .create_directory(&path, permission_bits(mode, DEFAULT_DIR_MODE))?;
        return Ok(Some(path));
    }

    match mode.map(|m| m & S_IFMT) {
        Some(S_IFLNK) => {
            warn!("skipping symbolic link '{}': not extracted from zip archives", name);
            Ok(None)
        }
        Some(S_IFIFO) => {
            warn!("skipping fifo '{}': unsupported entry type", name);
            Ok(None)
        }
        _ => {
            let path = ctx.leaf_path(name)?;
            ctx.writer
                .write_file(&path, permission_bits(mode, DEFAULT_FILE_MODE), entry)?;
            Ok(Some(path))
        }
    }
}
