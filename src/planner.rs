//! Filename-driven extraction plans.
//!
//! A [`Planner`] is an ordered table of [`Strategy`] values. Each strategy
//! pairs a set of case-insensitive filename suffixes with an operation
//! chain: zero or more decompressions followed by exactly one terminal
//! operation. The first strategy whose suffix matches wins.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::codec::Codec;
use crate::error::Error;

/// Structured archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Tar,
    Zip,
    SevenZ,
}

impl Container {
    pub fn name(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::Zip => "zip",
            Self::SevenZ => "7z",
        }
    }
}

/// One step of an operation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Wrap the current byte source in a decompressor. Never terminal.
    Decompress(Codec),
    /// Extract entries from a container. Terminal.
    Extract(Container),
    /// Write the whole decompressed stream to one file. Terminal.
    WriteSingleton,
}

impl Operation {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Decompress(_))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decompress(codec) => f.write_str(codec.name()),
            Self::Extract(container) => f.write_str(container.name()),
            Self::WriteSingleton => f.write_str("file"),
        }
    }
}

/// Filename suffixes and the chain that handles them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    suffixes: Vec<&'static str>,
    operations: Vec<Operation>,
}

impl Strategy {
    /// Build a strategy, checking the chain shape.
    ///
    /// Suffixes include the leading dot and are matched case-insensitively.
    pub fn new(suffixes: &[&'static str], operations: &[Operation]) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidChain { reason };

        if suffixes.is_empty() {
            return Err(invalid("strategy has no suffixes".into()));
        }
        let Some((last, steps)) = operations.split_last() else {
            return Err(invalid(format!("empty chain for {:?}", suffixes)));
        };
        if !last.is_terminal() {
            return Err(invalid(format!(
                "chain for {:?} does not end in a terminal step",
                suffixes
            )));
        }
        if let Some(step) = steps.iter().find(|op| op.is_terminal()) {
            return Err(invalid(format!(
                "chain for {:?} has terminal step '{}' before its end",
                suffixes, step
            )));
        }

        Ok(Self {
            suffixes: suffixes.to_vec(),
            operations: operations.to_vec(),
        })
    }

    pub fn suffixes(&self) -> &[&'static str] {
        &self.suffixes
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The matching suffix's byte length, if `file_name` ends with one and
    /// has something in front of it.
    fn match_len(&self, file_name: &str) -> Option<usize> {
        let lower = file_name.to_ascii_lowercase();
        self.suffixes
            .iter()
            .find(|suffix| {
                lower.len() > suffix.len() && lower.ends_with(&suffix.to_ascii_lowercase())
            })
            .map(|suffix| suffix.len())
    }
}

/// The chain chosen for one archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub operations: Vec<Operation>,
    /// The archive path with the matched suffix removed.
    pub path_no_ext: PathBuf,
}

/// Ordered strategy table. First match wins.
#[derive(Debug, Clone)]
pub struct Planner {
    strategies: Vec<Strategy>,
}

impl Planner {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Choose the chain for `path`, or `None` if no suffix matches.
    pub fn plan(&self, path: &Path) -> Option<Plan> {
        let file_name = path.file_name()?.to_str()?;

        self.strategies.iter().find_map(|strategy| {
            let suffix_len = strategy.match_len(file_name)?;
            let stem = &file_name[..file_name.len() - suffix_len];
            Some(Plan {
                operations: strategy.operations.clone(),
                path_no_ext: path.with_file_name(stem),
            })
        })
    }
}

impl Default for Planner {
    /// The built-in table: `.7z`, `.tar`, `.zip`, the compressed tarballs,
    /// then bare `.bz2`, `.gz` and `.xz` singletons.
    fn default() -> Self {
        use Codec::{Bzip2, Gzip, Xz};
        use Container::{SevenZ, Tar, Zip};
        use Operation::{Decompress, Extract, WriteSingleton};

        let table: [(&[&'static str], &[Operation]); 9] = [
            (&[".7z"], &[Extract(SevenZ)]),
            (&[".tar"], &[Extract(Tar)]),
            (&[".zip"], &[Extract(Zip)]),
            (&[".tbz2", ".tar.bz2"], &[Decompress(Bzip2), Extract(Tar)]),
            (&[".tgz", ".tar.gz"], &[Decompress(Gzip), Extract(Tar)]),
            (&[".txz", ".tar.xz"], &[Decompress(Xz), Extract(Tar)]),
            (&[".bz2"], &[Decompress(Bzip2), WriteSingleton]),
            (&[".gz"], &[Decompress(Gzip), WriteSingleton]),
            (&[".xz"], &[Decompress(Xz), WriteSingleton]),
        ];

        // Every row passes the chain checks in `Strategy::new`.
        let strategies = table
            .iter()
            .map(|(suffixes, operations)| Strategy {
                suffixes: suffixes.to_vec(),
                operations: operations.to_vec(),
            })
            .collect();
        Self { strategies }
    }
}
