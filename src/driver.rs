//! Extraction driver.
//!
//! The driver owns the configuration for one or more extractions (where to
//! write, what to keep, whether to overwrite) and runs the planner's
//! operation chain against an opened [`Archive`].

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use path_jail::Jail;

use crate::adapter::{ExtractContext, SevenZAdapter, TarAdapter, ZipAdapter};
use crate::archive::Archive;
use crate::error::Error;
use crate::filter::FilterSet;
use crate::output::OutputWriter;
use crate::planner::{Container, Operation, Planner};

/// Runs extractions into a fixed destination directory.
///
/// # Example
///
/// ```no_run
/// use release_unpack::{Driver, FilterSet};
///
/// let written = Driver::new_or_create("/tmp/out")?
///     .filters(FilterSet::compile(&[r"(^|/)bin/"])?)
///     .overwrite(true)
///     .extract_file("tool-1.2.0-linux-amd64.tar.gz")?;
/// # Ok::<(), release_unpack::Error>(())
/// ```
pub struct Driver {
    destination: PathBuf,
    jail: Jail,
    filters: FilterSet,
    overwrite: bool,
    planner: Planner,
    singleton_into_destination: bool,
}

impl Driver {
    /// Create a driver for the given destination.
    ///
    /// Returns [`Error::DestinationNotFound`] if the destination doesn't exist.
    pub fn new<P: AsRef<Path>>(destination: P) -> Result<Self, Error> {
        Self::new_impl(destination.as_ref(), false)
    }

    /// Create a driver, creating the destination if it doesn't exist.
    pub fn new_or_create<P: AsRef<Path>>(destination: P) -> Result<Self, Error> {
        Self::new_impl(destination.as_ref(), true)
    }

    fn new_impl(destination: &Path, create: bool) -> Result<Self, Error> {
        if !destination.exists() {
            if create {
                fs::create_dir_all(destination)?;
            } else {
                return Err(Error::DestinationNotFound {
                    path: destination.to_string_lossy().to_string(),
                });
            }
        }

        Ok(Self {
            destination: destination.to_path_buf(),
            jail: Jail::new(destination)?,
            filters: FilterSet::default(),
            overwrite: false,
            planner: Planner::default(),
            singleton_into_destination: false,
        })
    }

    /// Only extract entries matching at least one of these patterns.
    pub fn filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Replace existing files instead of failing on them.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Use a custom strategy table.
    pub fn planner(mut self, planner: Planner) -> Self {
        self.planner = planner;
        self
    }

    /// Write a bare compressed file (`.gz`, `.bz2`, `.xz`) into the
    /// destination instead of next to the archive.
    ///
    /// Off by default: `dl/tool.gz` decompresses to `dl/tool`. When on, it
    /// decompresses to `<destination>/tool`.
    pub fn singleton_into_destination(mut self, enabled: bool) -> Self {
        self.singleton_into_destination = enabled;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Extract the archive at `path`, choosing the format from its name.
    ///
    /// Returns every path written (files, directories and links). A
    /// container that yields nothing is reported as
    /// [`Error::NothingExtracted`]. See
    /// [`Driver::singleton_into_destination`] for where a bare compressed
    /// file goes.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PathBuf>, Error> {
        let path = path.as_ref();
        let mut archive = Archive::open(path)?;

        let plan = self.planner.plan(path).ok_or_else(|| Error::UnknownFormat {
            path: path.display().to_string(),
        })?;
        archive.set_path_no_ext(plan.path_no_ext);

        let result = self.run(&mut archive, &plan.operations);
        archive.close();
        result
    }

    /// Run an operation chain. Decompressions stack; the first terminal
    /// operation ends the chain.
    fn run(&self, archive: &mut Archive, operations: &[Operation]) -> Result<Vec<PathBuf>, Error> {
        for op in operations {
            match *op {
                Operation::Decompress(codec) => {
                    info!("decompressing ({}) {}", codec, archive.path().display());
                    archive.decompress(codec)?;
                }
                Operation::Extract(container) => {
                    info!("extracting ({}) {}", container.name(), archive.path().display());
                    return self.extract_container(archive, container);
                }
                Operation::WriteSingleton => {
                    debug!("writing decompressed contents of {}", archive.path().display());
                    return self.write_singleton(archive);
                }
            }
        }

        Err(Error::InvalidChain {
            reason: format!("chain for {} has no terminal step", archive.path().display()),
        })
    }

    fn extract_container(
        &self,
        archive: &mut Archive,
        container: Container,
    ) -> Result<Vec<PathBuf>, Error> {
        let ctx = ExtractContext {
            destination: &self.destination,
            jail: &self.jail,
            filters: &self.filters,
            writer: OutputWriter::new(self.overwrite),
        };
        let archive_path = archive.path().display().to_string();

        let written = match container {
            Container::Tar => {
                let source = if archive.has_stream() { "stream" } else { "file" };
                debug!("reading tar entries from {}", source);
                TarAdapter::new(archive.reader()?).extract(&ctx)?
            }
            Container::Zip => ZipAdapter::new(archive.random_access()?)?.extract(&ctx)?,
            Container::SevenZ => {
                let source = archive.random_access()?;
                let len = source.len();
                SevenZAdapter::new(source, len)?.extract(&ctx)?
            }
        };

        if written.is_empty() {
            return Err(Error::NothingExtracted { path: archive_path });
        }
        info!("extracted {} paths from {}", written.len(), archive_path);
        Ok(written)
    }

    fn write_singleton(&self, archive: &mut Archive) -> Result<Vec<PathBuf>, Error> {
        let missing = || Error::UnknownFormat {
            path: archive.path().display().to_string(),
        };
        let path_no_ext = archive.path_no_ext().ok_or_else(missing)?;
        let output = if self.singleton_into_destination {
            let file_name = path_no_ext.file_name().ok_or_else(missing)?;
            self.destination.join(file_name)
        } else {
            path_no_ext.to_path_buf()
        };

        let written = OutputWriter::new(self.overwrite).write_singleton(archive, &output)?;
        Ok(vec![written])
    }
}
