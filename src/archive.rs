//! Open archive handle.

use std::fs::{File, Metadata};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::debug;

use crate::codec::Codec;
use crate::error::Error;

/// One archive file under extraction.
///
/// Holds the raw file, its metadata and at most one active decompression
/// stream. Each [`Archive::decompress`] wraps whatever is currently readable
/// (the stream if present, else the raw file) and replaces the stream; the
/// raw file is never reopened. Dropping the handle releases the stream first,
/// then the file.
pub struct Archive {
    path: PathBuf,
    path_no_ext: Option<PathBuf>,
    stream: Option<Box<dyn Read>>,
    file: Option<File>,
    metadata: Metadata,
}

impl Archive {
    /// Open the archive at `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let open_err = |source| Error::Open {
            path: path.display().to_string(),
            source,
        };

        let file = File::open(path).map_err(open_err)?;
        let metadata = file.metadata().map_err(open_err)?;
        if !metadata.is_file() {
            return Err(open_err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        debug!("opened archive \"{}\" ({} bytes)", path.display(), metadata.len());
        Ok(Self {
            path: path.to_path_buf(),
            path_no_ext: None,
            stream: None,
            file: Some(file),
            metadata,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The archive path with the recognized extension(s) removed.
    ///
    /// Set by the planner from the first matching strategy.
    pub fn path_no_ext(&self) -> Option<&Path> {
        self.path_no_ext.as_deref()
    }

    pub(crate) fn set_path_no_ext(&mut self, path: PathBuf) {
        self.path_no_ext = Some(path);
    }

    /// Size of the raw archive file in bytes.
    pub fn size(&self) -> u64 {
        self.metadata.len()
    }

    /// Permission bits of the raw archive file.
    pub fn permissions(&self) -> u32 {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            self.metadata.permissions().mode() & 0o777
        }
        #[cfg(not(unix))]
        {
            if self.metadata.permissions().readonly() {
                0o444
            } else {
                0o644
            }
        }
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Attach a decompressing reader for `codec` on top of the current source.
    ///
    /// Gzip and xz headers are checked here. On failure the archive is left
    /// as it was: an active stream is kept with its header bytes replayed,
    /// and the raw file is seeked back to where it stood.
    pub fn decompress(&mut self, codec: Codec) -> Result<(), Error> {
        let decompress_err = |source| Error::Decompress {
            codec,
            path: self.path.display().to_string(),
            source,
        };

        // `Some(offset)` when reading the raw file: the clone shares its cursor.
        let (mut source, file_offset): (Box<dyn Read>, Option<u64>) = match self.stream.take() {
            Some(stream) => (stream, None),
            None => {
                let mut file = self.raw_file()?.try_clone().map_err(decompress_err)?;
                let offset = file.stream_position().map_err(decompress_err)?;
                (Box::new(file), Some(offset))
            }
        };

        let mut header = Vec::with_capacity(codec.magic().len());
        let peeked = source
            .by_ref()
            .take(codec.magic().len() as u64)
            .read_to_end(&mut header);
        let checked = peeked.and_then(|_| codec.check_header(&header));

        let source: Box<dyn Read> = Box::new(Cursor::new(header).chain(source));
        if let Err(e) = checked {
            match file_offset {
                None => self.stream = Some(source),
                Some(offset) => {
                    drop(source);
                    let mut file = self.raw_file()?;
                    file.seek(SeekFrom::Start(offset)).map_err(decompress_err)?;
                }
            }
            return Err(decompress_err(e));
        }

        self.stream = Some(codec.wrap(source));
        debug!("attached {} stream to \"{}\"", codec, self.path.display());
        Ok(())
    }

    /// The byte source container extractors should read: the active stream
    /// if one is attached, otherwise the raw file.
    pub(crate) fn reader(&mut self) -> Result<&mut (dyn Read + 'static), Error> {
        match (&mut self.stream, &mut self.file) {
            (Some(stream), _) => Ok(&mut **stream),
            (None, Some(file)) => Ok(file),
            (None, None) => Err(closed()),
        }
    }

    /// The active decompression stream, if any.
    pub(crate) fn stream(&mut self) -> Option<&mut (dyn Read + 'static)> {
        self.stream.as_deref_mut()
    }

    /// A seekable view for formats that need random access (zip, 7z).
    ///
    /// Reads the raw file directly; if a stream is attached its remaining
    /// output is buffered in memory instead.
    pub(crate) fn random_access(&mut self) -> Result<RandomAccess<'_>, Error> {
        if let Some(stream) = self.stream.as_mut() {
            debug!(
                "buffering decompressed stream of \"{}\" for random access",
                self.path.display()
            );
            let mut data = Vec::new();
            stream.read_to_end(&mut data)?;
            return Ok(RandomAccess::Memory(Cursor::new(data)));
        }

        let len = self.metadata.len();
        let file = self.file.as_mut().ok_or_else(closed)?;
        file.seek(SeekFrom::Start(0))?;
        Ok(RandomAccess::File { file, len })
    }

    fn raw_file(&self) -> Result<&File, Error> {
        self.file.as_ref().ok_or_else(closed)
    }

    /// Release the stream, then the raw file.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            debug!("released decompression stream for \"{}\"", self.path.display());
        }
        if self.file.take().is_some() {
            debug!("closed \"{}\"", self.path.display());
        }
    }
}

fn closed() -> Error {
    Error::Io(io::Error::other("archive handle is closed"))
}

/// Seekable source handed to random-access container readers.
pub(crate) enum RandomAccess<'a> {
    File { file: &'a mut File, len: u64 },
    Memory(Cursor<Vec<u8>>),
}

impl RandomAccess<'_> {
    pub(crate) fn len(&self) -> u64 {
        match self {
            Self::File { len, .. } => *len,
            Self::Memory(cursor) => cursor.get_ref().len() as u64,
        }
    }
}

impl Read for RandomAccess<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File { file, .. } => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for RandomAccess<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::File { file, .. } => file.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}
