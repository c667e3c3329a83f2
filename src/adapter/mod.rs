//! Container format adapters.
//!
//! Each adapter walks the entries of one container format and hands every
//! selected entry to the [`OutputWriter`]. They share the policy implemented
//! here: normalize the name, apply the filter set, and on the first failing
//! entry stop, reporting what was already written.

mod sevenz_adapter;
mod tar_adapter;
mod zip_adapter;

pub(crate) use sevenz_adapter::SevenZAdapter;
pub(crate) use tar_adapter::TarAdapter;
pub(crate) use zip_adapter::ZipAdapter;

use std::path::{Path, PathBuf};

use log::{debug, error};
use path_jail::Jail;

use crate::error::Error;
use crate::filter::FilterSet;
use crate::output::OutputWriter;
use crate::sanitize::normalize_entry_path;

/// `S_IFMT` and friends, for formats that store Unix mode words.
pub(crate) const S_IFMT: u32 = 0o170000;
pub(crate) const S_IFIFO: u32 = 0o010000;
pub(crate) const S_IFLNK: u32 = 0o120000;

/// Everything an adapter needs to place entries on disk.
pub(crate) struct ExtractContext<'a> {
    pub destination: &'a Path,
    pub jail: &'a Jail,
    pub filters: &'a FilterSet,
    pub writer: OutputWriter,
}

impl ExtractContext<'_> {
    /// Normalize a raw entry name and apply the filter set.
    ///
    /// Returns `None` for entries that should be skipped.
    pub fn select(&self, raw: &str) -> Option<String> {
        let name = normalize_entry_path(raw);
        if name.is_empty() {
            debug!("skipping entry {:?}: nothing left after normalization", raw);
            return None;
        }
        if !self.filters.selects(&name) {
            debug!("skipping {} (no filter matched)", name);
            return None;
        }
        Some(name)
    }

    /// Output path for a file or link entry.
    ///
    /// Only the parent is resolved through the jail: the leaf itself may be
    /// an existing symlink that the writer replaces or refuses to touch.
    pub fn leaf_path(&self, name: &str) -> Result<PathBuf, Error> {
        if let Some(parent) = Path::new(name).parent() {
            if !parent.as_os_str().is_empty() {
                self.check_jail(name, parent)?;
            }
        }
        Ok(self.destination.join(name))
    }

    /// Output path for a directory entry.
    pub fn dir_path(&self, name: &str) -> Result<PathBuf, Error> {
        self.check_jail(name, Path::new(name))?;
        Ok(self.destination.join(name))
    }

    fn check_jail(&self, name: &str, path: &Path) -> Result<(), Error> {
        self.jail
            .join(path)
            .map(|_| ())
            .map_err(|e| Error::PathEscape {
                entry: name.to_string(),
                detail: e.to_string(),
            })
    }
}

/// Paths written so far by one container extraction.
#[derive(Debug, Default)]
pub(crate) struct Extraction {
    written: Vec<PathBuf>,
}

impl Extraction {
    pub fn record(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    /// Stop at `entry`; everything recorded so far stays on disk.
    pub fn abort(self, entry: impl Into<String>, source: Error) -> Error {
        let entry = entry.into();
        error!(
            "extracting '{}' failed: {}; skipping any remaining files in archive",
            entry, source
        );
        Error::EntryFailed {
            entry,
            written: self.written,
            source: Box::new(source),
        }
    }

    pub fn finish(self) -> Vec<PathBuf> {
        self.written
    }
}

/// Permission bits from a Unix mode word, or `default` when none are set.
pub(crate) fn permission_bits(mode: Option<u32>, default: u32) -> u32 {
    match mode.map(|m| m & 0o777) {
        Some(bits) if bits != 0 => bits,
        _ => default,
    }
}
