use std::fmt;
use std::path::PathBuf;

use crate::codec::Codec;

/// Errors that can occur while planning or running an extraction.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in minor versions without breaking existing code. Always include a
/// catch-all `_ =>` arm when matching.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A `--keep` pattern is not a valid regular expression.
    InvalidFilter {
        pattern: String,
        source: regex::Error,
    },

    /// No filename strategy matches the archive path.
    UnknownFormat { path: String },

    /// A planner strategy has a malformed operation chain.
    InvalidChain { reason: String },

    /// The archive could not be opened or inspected.
    Open {
        path: String,
        source: std::io::Error,
    },

    /// A decompression step could not be attached (bad header, etc.).
    Decompress {
        codec: Codec,
        path: String,
        source: std::io::Error,
    },

    /// The singleton writer ran without an attached decompression stream.
    NoDecompressedStream { path: String },

    /// Destination directory does not exist.
    DestinationNotFound { path: String },

    /// Output path exists and overwriting is disabled.
    AlreadyExists { entry: String },

    /// Entry type that cannot be extracted safely (sparse files, unknown types).
    UnsupportedEntryType { entry: String, entry_type: String },

    /// Output path escapes the destination directory.
    PathEscape { entry: String, detail: String },

    /// A container produced no output at all.
    NothingExtracted { path: String },

    /// Extraction stopped at `entry`; `written` lists what remains on disk.
    EntryFailed {
        entry: String,
        written: Vec<PathBuf>,
        source: Box<Error>,
    },

    /// Zip format error.
    Zip(zip::result::ZipError),

    /// 7z format error.
    SevenZ { detail: String },

    /// IO error (includes TAR format errors since tar crate uses io::Error).
    Io(std::io::Error),

    /// Path jail error.
    Jail(path_jail::JailError),
}

/// Format bytes in human-readable IEC form (e.g., "1.5 MiB").
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}iB", bytes as f64 / div as f64, prefix)
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilter { pattern, source } => {
                write!(f, "failed to compile filter \"{}\": {}", pattern, source)
            }
            Self::UnknownFormat { path } => {
                write!(f, "don't know how to extract file \"{}\"", path)
            }
            Self::InvalidChain { reason } => write!(f, "invalid operation chain: {}", reason),
            Self::Open { path, source } => {
                write!(f, "failed to open archive \"{}\": {}", path, source)
            }
            Self::Decompress {
                codec,
                path,
                source,
            } => {
                write!(f, "decompressing ({}) \"{}\" failed: {}", codec, path, source)
            }
            Self::NoDecompressedStream { path } => {
                write!(
                    f,
                    "no decompressed data available for \"{}\" (no stream attached)",
                    path
                )
            }
            Self::DestinationNotFound { path } => {
                write!(f, "destination directory '{}' does not exist", path)
            }
            Self::AlreadyExists { entry } => {
                write!(f, "file '{}' already exists", entry)
            }
            Self::UnsupportedEntryType { entry, entry_type } => {
                write!(f, "entry '{}' has unsupported type '{}'", entry, entry_type)
            }
            Self::PathEscape { entry, detail } => {
                write!(f, "path '{}' escapes destination: {}", entry, detail)
            }
            Self::NothingExtracted { path } => {
                write!(
                    f,
                    "no files were extracted from \"{}\" (empty archive or no filter matched)",
                    path
                )
            }
            Self::EntryFailed {
                entry,
                written,
                source,
            } => {
                write!(
                    f,
                    "extraction stopped at '{}' after writing {} paths: {}",
                    entry,
                    written.len(),
                    source
                )
            }
            Self::Zip(e) => write!(f, "zip format error: {}", e),
            Self::SevenZ { detail } => write!(f, "7z format error: {}", detail),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Jail(e) => write!(f, "path validation error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidFilter { source, .. } => Some(source),
            Self::Open { source, .. } => Some(source),
            Self::Decompress { source, .. } => Some(source),
            Self::EntryFailed { source, .. } => Some(source.as_ref()),
            Self::Zip(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Jail(e) => Some(e),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Zip(e)
    }
}
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
impl From<path_jail::JailError> for Error {
    fn from(e: path_jail::JailError) -> Self {
        Self::Jail(e)
    }
}
impl From<sevenz_rust::Error> for Error {
    fn from(e: sevenz_rust::Error) -> Self {
        Self::SevenZ {
            detail: e.to_string(),
        }
    }
}
