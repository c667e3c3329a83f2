//! Unpack downloaded release assets.
//!
//! Given an archive path, [`extract_file`] picks an operation chain from the
//! file name (e.g. `.tar.gz` is gunzip then untar, a bare `.gz` is gunzip
//! then write one file), runs it, and returns every path it wrote. Entry
//! names are normalized so nothing lands outside the destination, and an
//! optional regex allow-list selects which entries are kept.

mod adapter;
mod archive;
mod codec;
mod driver;
mod error;
mod filter;
mod output;
mod planner;
mod sanitize;

pub use archive::Archive;
pub use codec::Codec;
pub use driver::Driver;
pub use error::Error;
pub use filter::FilterSet;
pub use output::{LinkKind, OutputWriter};
pub use planner::{Container, Operation, Plan, Planner, Strategy};
pub use sanitize::normalize_entry_path;

use std::path::{Path, PathBuf};

/// Extract `path` into the current directory.
///
/// A bare compressed file is written next to the archive with its extension
/// stripped (`dl/tool.gz` becomes `dl/tool`).
///
/// `filter_patterns` are regular expressions; when any are given, only
/// entries whose normalized path matches at least one are written. With
/// `overwrite` false, the first entry that would replace an existing file
/// stops the extraction.
pub fn extract_file<P, S>(
    path: P,
    filter_patterns: &[S],
    overwrite: bool,
) -> Result<Vec<PathBuf>, Error>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let filters = FilterSet::compile(filter_patterns)?;
    Driver::new(".")?
        .filters(filters)
        .overwrite(overwrite)
        .extract_file(path)
}
