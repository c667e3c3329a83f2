//! 7z archive adapter.

use std::io::{self, Read, Seek};
use std::path::PathBuf;

use log::{debug, warn};
use sevenz_rust::{Password, SevenZArchiveEntry, SevenZReader};

use super::{permission_bits, ExtractContext, Extraction, S_IFIFO, S_IFLNK, S_IFMT};
use crate::error::Error;
use crate::output::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};

/// Set in the attribute word when its high 16 bits hold a Unix mode.
const UNIX_EXTENSION: u32 = 0x8000;

/// Adapter for 7z archives.
///
/// Uses the `sevenz-rust` crate. Entries are streamed out of each solid
/// block in order; only regular files and directories are written.
pub(crate) struct SevenZAdapter<R: Read + Seek> {
    archive: SevenZReader<R>,
}

impl<R: Read + Seek> SevenZAdapter<R> {
    pub fn new(reader: R, len: u64) -> Result<Self, Error> {
        Ok(Self {
            archive: SevenZReader::new(reader, len, Password::empty())?,
        })
    }

    pub fn extract(mut self, ctx: &ExtractContext<'_>) -> Result<Vec<PathBuf>, Error> {
        let mut progress = Extraction::default();
        let mut failure: Option<(String, Error)> = None;
        let mut index = 0usize;

        let walked = self.archive.for_each_entries(|entry, reader| {
            index += 1;
            let Some(name) = select(entry, ctx) else {
                io::copy(reader, &mut io::sink())?;
                return Ok(true);
            };

            match extract_entry(entry, reader, &name, ctx) {
                Ok(Some(path)) => {
                    progress.record(path);
                    Ok(true)
                }
                Ok(None) => {
                    io::copy(reader, &mut io::sink())?;
                    Ok(true)
                }
                Err(e) => {
                    failure = Some((name, e));
                    Ok(false)
                }
            }
        });

        if let Some((name, e)) = failure {
            return Err(progress.abort(name, e));
        }
        if let Err(e) = walked {
            return Err(progress.abort(format!("#{}", index.saturating_sub(1)), e.into()));
        }
        Ok(progress.finish())
    }
}

fn select(entry: &SevenZArchiveEntry, ctx: &ExtractContext<'_>) -> Option<String> {
    if entry.is_anti_item {
        debug!("skipping 7z anti-item {:?}", entry.name());
        return None;
    }
    ctx.select(entry.name())
}

/// Write one entry. `Ok(None)` means it was skipped.
fn extract_entry(
    entry: &SevenZArchiveEntry,
    reader: &mut dyn Read,
    name: &str,
    ctx: &ExtractContext<'_>,
) -> Result<Option<PathBuf>, Error> {
    let mode = unix_mode(entry);

    if entry.is_directory() {
        let path = ctx.dir_path(name)?;
        ctx.writer
            .create_directory(&path, permission_bits(mode, DEFAULT_DIR_MODE))?;
        return Ok(Some(path));
    }

    match mode.map(|m| m & S_IFMT) {
        Some(S_IFLNK) => {
            warn!("skipping symbolic link '{}': not extracted from 7z archives", name);
            Ok(None)
        }
        Some(S_IFIFO) => {
            warn!("skipping fifo '{}': unsupported entry type", name);
            Ok(None)
        }
        _ => {
            let path = ctx.leaf_path(name)?;
            ctx.writer
                .write_file(&path, permission_bits(mode, DEFAULT_FILE_MODE), reader)?;
            Ok(Some(path))
        }
    }
}

fn unix_mode(entry: &SevenZArchiveEntry) -> Option<u32> {
    if entry.has_windows_attributes && entry.windows_attributes & UNIX_EXTENSION != 0 {
        Some(entry.windows_attributes >> 16)
    } else {
        None
    }
}
