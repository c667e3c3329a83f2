//! TAR archive adapter.

use std::io::{self, Read};
use std::path::PathBuf;

use log::{debug, warn};

use super::{permission_bits, ExtractContext, Extraction};
use crate::error::Error;
use crate::output::{LinkKind, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};

/// Adapter for TAR streams.
///
/// TAR is sequential, so the adapter works over any reader: the raw file for
/// `.tar`, or an attached decompression stream for `.tar.gz` and friends.
pub(crate) struct TarAdapter<R: Read> {
    archive: tar::Archive<R>,
}

impl<R: Read> TarAdapter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            archive: tar::Archive::new(reader),
        }
    }

    /// Extract every selected entry, in archive order.
    pub fn extract(mut self, ctx: &ExtractContext<'_>) -> Result<Vec<PathBuf>, Error> {
        let mut progress = Extraction::default();
        let entries = self.archive.entries()?;

        for (index, entry_result) in entries.enumerate() {
            let mut entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => return Err(progress.abort(format!("#{}", index), e.into())),
            };

            let entry_type = entry.header().entry_type();
            if is_metadata(entry_type) {
                debug!("skipping tar metadata entry ({})", entry_type_name(entry_type));
                continue;
            }

            let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let Some(name) = ctx.select(&raw) else {
                continue;
            };

            match extract_entry(&mut entry, &name, entry_type, ctx) {
                Ok(Some(path)) => progress.record(path),
                Ok(None) => {}
                Err(e) => return Err(progress.abort(name, e)),
            }
        }

        Ok(progress.finish())
    }
}

/// Write one entry. `Ok(None)` means it was skipped.
fn extract_entry<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    name: &str,
    entry_type: tar::EntryType,
    ctx: &ExtractContext<'_>,
) -> Result<Option<PathBuf>, Error> {
    let mode = entry.header().mode().ok();

    match entry_type {
        tar::EntryType::Regular | tar::EntryType::Continuous => {
            let path = ctx.leaf_path(name)?;
            ctx.writer
                .write_file(&path, permission_bits(mode, DEFAULT_FILE_MODE), entry)?;
            Ok(Some(path))
        }
        tar::EntryType::Directory => {
            let path = ctx.dir_path(name)?;
            ctx.writer
                .create_directory(&path, permission_bits(mode, DEFAULT_DIR_MODE))?;
            Ok(Some(path))
        }
        tar::EntryType::Symlink | tar::EntryType::Link => {
            let target = entry
                .link_name_bytes()
                .map(|bytes| PathBuf::from(String::from_utf8_lossy(&bytes).into_owned()))
                .ok_or_else(|| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("link entry '{}' has no target", name),
                    ))
                })?;
            let path = ctx.leaf_path(name)?;

            // Link targets are used as stored. Hard-link targets name another
            // member of this archive, so they live under the destination too.
            if entry_type == tar::EntryType::Link {
                let target = ctx.destination.join(target);
                ctx.writer.create_link(&path, &target, LinkKind::Hard)?;
            } else {
                ctx.writer.create_link(&path, &target, LinkKind::Symbolic)?;
            }
            Ok(Some(path))
        }
        tar::EntryType::Fifo | tar::EntryType::Char | tar::EntryType::Block => {
            warn!(
                "skipping {} '{}': unsupported entry type",
                entry_type_name(entry_type),
                name
            );
            Ok(None)
        }
        other => Err(Error::UnsupportedEntryType {
            entry: name.to_string(),
            entry_type: entry_type_name(other),
        }),
    }
}

/// Headers that describe other entries or the archive itself.
fn is_metadata(entry_type: tar::EntryType) -> bool {
    matches!(
        entry_type,
        tar::EntryType::XGlobalHeader
            | tar::EntryType::XHeader
            | tar::EntryType::GNULongName
            | tar::EntryType::GNULongLink
    )
}

/// Convert TAR entry type to a human-readable name.
fn entry_type_name(entry_type: tar::EntryType) -> String {
    match entry_type {
        tar::EntryType::Regular => "regular file".into(),
        tar::EntryType::Link => "hard link".into(),
        tar::EntryType::Symlink => "symbolic link".into(),
        tar::EntryType::Char => "character device".into(),
        tar::EntryType::Block => "block device".into(),
        tar::EntryType::Directory => "directory".into(),
        tar::EntryType::Fifo => "fifo (named pipe)".into(),
        tar::EntryType::Continuous => "continuous file".into(),
        tar::EntryType::GNULongName => "GNU long name".into(),
        tar::EntryType::GNULongLink => "GNU long link".into(),
        tar::EntryType::GNUSparse => "GNU sparse file".into(),
        tar::EntryType::XGlobalHeader => "pax global header".into(),
        tar::EntryType::XHeader => "pax extended header".into(),
        _ => format!("unknown (0x{:02x})", entry_type.as_byte()),
    }
}
